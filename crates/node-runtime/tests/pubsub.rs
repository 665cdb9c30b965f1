//! The pubsub façade as exposed by a node.

mod common;

use bytes::Bytes;
use common::Harness;
use mn_02_pubsub::{Payload, PubSubError, PubSubMessage, PubSubPeer};
use parking_lot::Mutex;
use shared_types::PeerInfo;
use std::sync::Arc;

#[tokio::test]
async fn test_operations_rejected_before_start() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    let pubsub = node.pubsub().unwrap();

    let err = pubsub.ls().await.unwrap_err();
    assert_eq!(err, PubSubError::NotStarted);
    assert_eq!(err.code(), "ERR_PUBSUB_NOT_STARTED");
    assert!(pubsub.subscribe_fn("news", |_| {}).await.is_err());
    assert!(pubsub.publish("news", Bytes::from_static(b"x")).await.is_err());
    assert!(pubsub.peers(None).await.is_err());
    assert!(harness.pubsub_factory.engine().unwrap().calls().is_empty());
}

#[tokio::test]
async fn test_one_network_subscription_per_topic() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    node.start().await.unwrap();
    let pubsub = node.pubsub().unwrap();
    let engine = harness.pubsub_factory.engine().unwrap();

    let mut ids = Vec::new();
    for _ in 0..3 {
        ids.push(pubsub.subscribe_fn("news", |_| {}).await.unwrap());
    }
    assert_eq!(engine.count("subscribe", "news"), 1);
    assert_eq!(pubsub.ls().await.unwrap(), vec!["news"]);

    for id in ids {
        pubsub.unsubscribe("news", Some(id)).await.unwrap();
    }
    assert_eq!(engine.count("unsubscribe", "news"), 1);
    assert!(pubsub.ls().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_publish_accepts_only_bytes() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    node.start().await.unwrap();
    let pubsub = node.pubsub().unwrap();
    let engine = harness.pubsub_factory.engine().unwrap();

    for topic in ["news", "", "sports"] {
        let err = pubsub.publish(topic, "text").await.unwrap_err();
        assert_eq!(err.code(), "ERR_DATA_IS_NOT_A_BUFFER");
        let err = pubsub
            .publish(topic, Payload::Json(serde_json::json!({"a": 1})))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "ERR_DATA_IS_NOT_A_BUFFER");
    }
    assert!(engine.published().is_empty());

    pubsub
        .publish("news", Bytes::from_static(b"hello"))
        .await
        .unwrap();
    assert_eq!(
        engine.published(),
        vec![("news".to_string(), Bytes::from_static(b"hello"))]
    );
}

#[tokio::test]
async fn test_peers_filtered_by_topic() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    node.start().await.unwrap();
    let engine = harness.pubsub_factory.engine().unwrap();

    let reader = PeerInfo::random();
    let other = PeerInfo::random();
    engine.add_peer(PubSubPeer::new(reader.clone(), ["news", "sports"]));
    engine.add_peer(PubSubPeer::new(other.clone(), ["weather"]));

    let pubsub = node.pubsub().unwrap();
    assert_eq!(
        pubsub.peers(Some("news")).await.unwrap(),
        vec![reader.id.to_base58()]
    );
    assert_eq!(pubsub.peers(None).await.unwrap().len(), 2);
    assert!(pubsub.peers(Some("music")).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_operations_rejected_after_stop() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    node.start().await.unwrap();
    node.stop().await.unwrap();

    let err = node
        .pubsub()
        .unwrap()
        .publish("news", Bytes::from_static(b"late"))
        .await
        .unwrap_err();
    assert_eq!(err, PubSubError::NotStarted);
}

#[tokio::test]
async fn test_engine_messages_reach_subscribers() {
    let harness = Harness::new();
    let node = harness.node(false, true);
    node.start().await.unwrap();
    let engine = harness.pubsub_factory.engine().unwrap();
    let pubsub = node.pubsub().unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    let id = pubsub
        .subscribe_fn("news", move |msg| sink.lock().push(msg.data.clone()))
        .await
        .unwrap();

    let sender = PeerInfo::random();
    let message = |body: &'static [u8]| PubSubMessage {
        from: sender.id.clone(),
        topic_ids: vec!["news".to_string()],
        data: Bytes::from_static(body),
        seqno: vec![0, 1],
    };
    assert!(engine.emit(message(b"first")));

    pubsub.unsubscribe("news", Some(id)).await.unwrap();
    assert!(engine.emit(message(b"second")));

    assert_eq!(*received.lock(), vec![Bytes::from_static(b"first")]);
}
