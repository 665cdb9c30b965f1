//! Protocol negotiation through a running node over in-memory connections.

use mesh_telemetry::{CONNECTIONS_OPENED, NEGOTIATION_FAILURES, SCOPE_PROTOCOL};
use mn_01_protocol_muxer::codec::write_message;
use mn_01_protocol_muxer::{dialer, handler_fn, matchers, BoxConnection, ProtocolHandler};
use node_runtime::adapters::{LocalConnectionManager, LocalSwitch, MemoryTransport};
use node_runtime::{Modules, Node, NodeOptions};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::timeout;

type Routed = Arc<Mutex<Vec<String>>>;

/// Records which handler ran, then echoes four bytes.
fn echo_as(label: &'static str, routed: Routed) -> Arc<dyn ProtocolHandler> {
    handler_fn(move |protocol: String, mut conn: BoxConnection| {
        let routed = routed.clone();
        async move {
            routed.lock().push(format!("{label}:{protocol}"));
            let mut buf = [0u8; 4];
            if conn.read_exact(&mut buf).await.is_ok() {
                let _ = conn.write_all(&buf).await;
            }
        }
    })
}

async fn running_node(routed: &Routed) -> (Node, Arc<LocalSwitch>) {
    let switch = Arc::new(LocalSwitch::new());
    let options = NodeOptions {
        modules: Some(Modules::new().with_transport(Arc::new(MemoryTransport))),
        ..NodeOptions::default()
    };
    let node = Node::create(
        options,
        switch.clone(),
        Arc::new(LocalConnectionManager::new(25)),
    )
    .unwrap();
    node.handle("/a/1.0.0", echo_as("a", routed.clone()), None);
    node.handle("/b/1.0.0", echo_as("b", routed.clone()), None);
    node.start().await.unwrap();
    (node, switch)
}

#[tokio::test]
async fn test_request_routed_to_matching_handler() {
    let routed: Routed = Arc::default();
    let (_node, switch) = running_node(&routed).await;

    let (mut conn, task) = switch.dial_local().unwrap();
    let selected = dialer::select(&mut conn, &["/b/1.0.0"]).await.unwrap();
    assert_eq!(selected, "/b/1.0.0");

    conn.write_all(b"ping").await.unwrap();
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"ping");

    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(*routed.lock(), vec!["b:/b/1.0.0"]);
    assert!(
        CONNECTIONS_OPENED
            .with_label_values(&[SCOPE_PROTOCOL, "/b/1.0.0"])
            .get()
            >= 1.0
    );
}

#[tokio::test]
async fn test_unknown_protocol_rejected_then_retry() {
    let routed: Routed = Arc::default();
    let (_node, switch) = running_node(&routed).await;

    let (mut conn, task) = switch.dial_local().unwrap();
    dialer::handshake(&mut conn).await.unwrap();
    assert!(!dialer::try_protocol(&mut conn, "/c/1.0.0").await.unwrap());
    assert!(dialer::try_protocol(&mut conn, "/a/1.0.0").await.unwrap());

    conn.write_all(b"pong").await.unwrap();
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).await.unwrap();
    assert_eq!(&buf, b"pong");

    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(*routed.lock(), vec!["a:/a/1.0.0"]);
}

#[tokio::test]
async fn test_list_protocols() {
    let routed: Routed = Arc::default();
    let (_node, switch) = running_node(&routed).await;

    let (mut conn, _task) = switch.dial_local().unwrap();
    dialer::handshake(&mut conn).await.unwrap();
    let listed = dialer::list_protocols(&mut conn).await.unwrap();
    assert_eq!(listed, vec!["/a/1.0.0", "/b/1.0.0"]);
}

#[tokio::test]
async fn test_handler_added_while_running() {
    let routed: Routed = Arc::default();
    let (node, switch) = running_node(&routed).await;
    node.handle("/kad/1.2.3", echo_as("kad", routed.clone()), Some(matchers::semver()));

    let (mut conn, task) = switch.dial_local().unwrap();
    let selected = dialer::select(&mut conn, &["/kad/1.2.0"]).await.unwrap();
    assert_eq!(selected, "/kad/1.2.0");
    conn.write_all(b"find").await.unwrap();
    let mut buf = [0u8; 4];
    conn.read_exact(&mut buf).await.unwrap();

    timeout(Duration::from_secs(5), task).await.unwrap().unwrap();
    assert_eq!(*routed.lock(), vec!["kad:/kad/1.2.3"]);
}

#[tokio::test]
async fn test_failed_negotiation_reported_and_isolated() {
    let routed: Routed = Arc::default();
    let (_node, switch) = running_node(&routed).await;
    let before = NEGOTIATION_FAILURES
        .with_label_values(&["memory", "header"])
        .get();

    let (mut bad, bad_task) = switch.dial_local().unwrap();
    write_message(&mut bad, "/not-multistream/0.0.1").await.unwrap();
    timeout(Duration::from_secs(5), bad_task)
        .await
        .unwrap()
        .unwrap();

    let after = NEGOTIATION_FAILURES
        .with_label_values(&["memory", "header"])
        .get();
    assert!(after >= before + 1.0);

    let (mut good, _task) = switch.dial_local().unwrap();
    let selected = dialer::select(&mut good, &["/a/1.0.0"]).await.unwrap();
    assert_eq!(selected, "/a/1.0.0");
    assert!(routed.lock().iter().all(|r| r.starts_with("a:")));
}
