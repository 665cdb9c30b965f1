//! The pubsub façade.

use crate::domain::{HandlerId, Payload, PubSubError, PubSubMessage, TopicHandler, TopicRegistry};
use crate::ports::{MessageSink, NodeStatus, PubSubEngine};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace, warn};

/// Handler count per topic above which a leak warning is logged.
pub const DEFAULT_MAX_HANDLERS: usize = 10;

/// Start-gated, ref-counted API over a [`PubSubEngine`].
///
/// The engine holds one network subscription per topic no matter how many
/// local handlers share it. The first handler on a topic triggers the
/// engine subscribe and the removal of the last one triggers the engine
/// unsubscribe. Subscription changes are serialized and the registry is
/// only edited once the engine call succeeded, so a topic has handlers
/// exactly when it has a network subscription.
///
/// Every operation completes asynchronously: the returned future yields to
/// the runtime at least once before resolving, on success and on error.
pub struct PubSub {
    engine: Arc<dyn PubSubEngine>,
    node: Arc<dyn NodeStatus>,
    registry: Mutex<TopicRegistry>,
    changes: tokio::sync::Mutex<()>,
    max_handlers: AtomicUsize,
}

impl PubSub {
    pub fn new(engine: Arc<dyn PubSubEngine>, node: Arc<dyn NodeStatus>) -> Self {
        Self {
            engine,
            node,
            registry: Mutex::new(TopicRegistry::new()),
            changes: tokio::sync::Mutex::new(()),
            max_handlers: AtomicUsize::new(DEFAULT_MAX_HANDLERS),
        }
    }

    /// Build the façade and route the engine's incoming messages to its
    /// handlers.
    pub fn attach(engine: Arc<dyn PubSubEngine>, node: Arc<dyn NodeStatus>) -> Arc<Self> {
        let pubsub = Arc::new(Self::new(Arc::clone(&engine), node));
        engine.set_message_sink(pubsub.message_sink());
        pubsub
    }

    /// Sink delivering to this façade for as long as it is alive.
    pub fn message_sink(self: &Arc<Self>) -> MessageSink {
        let pubsub: Weak<Self> = Arc::downgrade(self);
        Arc::new(move |message: PubSubMessage| {
            if let Some(pubsub) = pubsub.upgrade() {
                pubsub.deliver(&message);
            }
        })
    }

    /// The engine behind this façade.
    pub fn engine(&self) -> &Arc<dyn PubSubEngine> {
        &self.engine
    }

    /// Register `handler` for `topic`.
    pub async fn subscribe(
        &self,
        topic: &str,
        handler: TopicHandler,
    ) -> Result<HandlerId, PubSubError> {
        settle(self.subscribe_now(topic, handler).await).await
    }

    /// [`subscribe`](Self::subscribe) with a plain closure.
    pub async fn subscribe_fn<F>(&self, topic: &str, handler: F) -> Result<HandlerId, PubSubError>
    where
        F: Fn(&PubSubMessage) + Send + Sync + 'static,
    {
        self.subscribe(topic, Arc::new(handler)).await
    }

    /// Remove `handler` from `topic`, or every handler when `None`.
    ///
    /// Removing an unknown handler is not an error. If the engine refuses
    /// to withdraw the topic, the handlers stay registered.
    pub async fn unsubscribe(
        &self,
        topic: &str,
        handler: Option<HandlerId>,
    ) -> Result<(), PubSubError> {
        settle(self.unsubscribe_now(topic, handler).await).await
    }

    /// Publish `data` on `topic`. Only byte buffers are accepted.
    pub async fn publish(&self, topic: &str, data: impl Into<Payload>) -> Result<(), PubSubError> {
        let result = match self.ensure_started() {
            Ok(()) => match data.into() {
                Payload::Bytes(bytes) => self
                    .engine
                    .publish(topic, bytes)
                    .await
                    .map_err(PubSubError::from),
                other => Err(PubSubError::InvalidData(other.kind())),
            },
            Err(e) => Err(e),
        };
        settle(result).await
    }

    /// Topics the engine is subscribed to, in no particular order.
    pub async fn ls(&self) -> Result<Vec<String>, PubSubError> {
        let result = self.ensure_started().map(|()| self.engine.subscriptions());
        settle(result).await
    }

    /// Base58 ids of known peers, limited to subscribers of `topic` if
    /// given.
    pub async fn peers(&self, topic: Option<&str>) -> Result<Vec<String>, PubSubError> {
        let result = self.ensure_started().map(|()| {
            self.engine
                .peers()
                .into_iter()
                .filter(|peer| topic.map_or(true, |t| peer.topics.contains(t)))
                .map(|peer| peer.info.id.to_base58())
                .collect()
        });
        settle(result).await
    }

    /// Hand an incoming message to the local handlers of each of its
    /// topics. Returns how many handlers ran.
    pub fn deliver(&self, message: &PubSubMessage) -> usize {
        let handlers: Vec<TopicHandler> = {
            let registry = self.registry.lock();
            message
                .topic_ids
                .iter()
                .flat_map(|topic| registry.handlers(topic))
                .collect()
        };

        trace!(topics = ?message.topic_ids, handlers = handlers.len(), "Delivering message");
        for handler in &handlers {
            handler(message);
        }
        handlers.len()
    }

    /// Number of local handlers on `topic`.
    pub fn handler_count(&self, topic: &str) -> usize {
        self.registry.lock().handler_count(topic)
    }

    /// Set the handler count per topic above which a warning is logged.
    /// Zero disables the warning.
    pub fn set_max_handlers(&self, max: usize) {
        self.max_handlers.store(max, Ordering::Relaxed);
    }

    pub fn max_handlers(&self) -> usize {
        self.max_handlers.load(Ordering::Relaxed)
    }

    fn ensure_started(&self) -> Result<(), PubSubError> {
        if !self.node.is_started() && !self.engine.is_started() {
            return Err(PubSubError::NotStarted);
        }
        Ok(())
    }

    async fn subscribe_now(
        &self,
        topic: &str,
        handler: TopicHandler,
    ) -> Result<HandlerId, PubSubError> {
        self.ensure_started()?;

        let _changes = self.changes.lock().await;
        let subscribed = self.registry.lock().has_handlers(topic);
        if !subscribed {
            self.engine.subscribe(topic).await?;
            debug!(topic, "Subscribed to topic");
        }

        let mut registry = self.registry.lock();
        let id = registry.add(topic, handler);
        let count = registry.handler_count(topic);
        let max = self.max_handlers();
        if max > 0 && count > max {
            warn!(topic, handlers = count, max, "Handler count exceeds maximum, possible leak");
        }
        Ok(id)
    }

    async fn unsubscribe_now(
        &self,
        topic: &str,
        handler: Option<HandlerId>,
    ) -> Result<(), PubSubError> {
        self.ensure_started()?;

        let _changes = self.changes.lock().await;
        let last = self.registry.lock().would_empty(topic, handler);
        if last {
            self.engine.unsubscribe(topic).await?;
            debug!(topic, "Unsubscribed from topic");
        }

        let mut registry = self.registry.lock();
        match handler {
            Some(id) => {
                registry.remove(topic, id);
            }
            None => {
                registry.remove_all(topic);
            }
        }
        Ok(())
    }
}

/// Resolve to `value` only after yielding to the runtime once.
async fn settle<T>(value: T) -> T {
    tokio::task::yield_now().await;
    value
}
