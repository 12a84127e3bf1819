use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::core::catalog::model::CatalogItem;

/// Full, idempotent read of the remote catalog.
pub trait CatalogSource: Send + Sync + 'static {
    fn fetch_items(&self) -> impl Future<Output = anyhow::Result<Vec<CatalogItem>>> + Send;
}

impl<S: CatalogSource> CatalogSource for Arc<S> {
    fn fetch_items(&self) -> impl Future<Output = anyhow::Result<Vec<CatalogItem>>> + Send {
        (**self).fetch_items()
    }
}

/// "The catalog may have changed." The payload is carried for logging only
/// and is never interpreted.
#[derive(Debug, Clone, Default)]
pub struct ChangeNotice {
    pub payload: Option<serde_json::Value>,
}

/// Receiving end of a feed subscription. Dropping it unsubscribes.
pub type FeedSubscription = mpsc::UnboundedReceiver<ChangeNotice>;

/// A push feed of opaque change notifications.
pub trait ChangeFeed: Send + Sync + 'static {
    fn subscribe(&self) -> anyhow::Result<FeedSubscription>;
}

impl<F: ChangeFeed> ChangeFeed for Arc<F> {
    fn subscribe(&self) -> anyhow::Result<FeedSubscription> {
        (**self).subscribe()
    }
}

/// In-process feed: every [`ChannelFeed::notify`] reaches every live subscription.
#[derive(Debug, Clone, Default)]
pub struct ChannelFeed {
    subscribers: Arc<Mutex<Vec<mpsc::UnboundedSender<ChangeNotice>>>>,
}

impl ChannelFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a notice, pruning subscriptions whose receiver was dropped.
    /// Returns how many subscribers received it.
    pub fn notify(&self, notice: ChangeNotice) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(notice.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| !tx.is_closed());
        subscribers.len()
    }
}

impl ChangeFeed for ChannelFeed {
    fn subscribe(&self) -> anyhow::Result<FeedSubscription> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push(tx);
        Ok(rx)
    }
}
