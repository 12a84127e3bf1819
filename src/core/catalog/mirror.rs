use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::core::{
    catalog::{
        model::{CatalogItem, CatalogSnapshot},
        source::{CatalogSource, ChangeFeed},
    },
    error::CatalogError,
};

type Handler = Arc<dyn Fn(&Arc<CatalogSnapshot>) + Send + Sync>;
type HandlerRegistry = Arc<Mutex<BTreeMap<u64, Handler>>>;

struct MirrorInner<S> {
    source: S,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
    // Held across swap and dispatch so handlers see replacements in revision order.
    apply: Mutex<()>,
    handlers: HandlerRegistry,
    next_handle: AtomicU64,
    in_flight: AtomicUsize,
}

/// Last-known-good copy of the remote catalog.
///
/// Each successful [`CatalogMirror::load`] swaps in a whole new snapshot, so a
/// reader holding an `Arc<CatalogSnapshot>` never sees a partially applied
/// refresh. When fetches overlap, the snapshot that stays visible is the one
/// whose fetch completed last.
pub struct CatalogMirror<S> {
    inner: Arc<MirrorInner<S>>,
}

impl<S> Clone for CatalogMirror<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> std::fmt::Debug for CatalogMirror<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogMirror")
            .field("revision", &self.inner.snapshot.read().revision())
            .field("handlers", &self.inner.handlers.lock().len())
            .field("in_flight", &self.inner.in_flight.load(Ordering::Relaxed))
            .finish()
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

impl<S: CatalogSource> CatalogMirror<S> {
    pub fn new(source: S) -> Self {
        Self {
            inner: Arc::new(MirrorInner {
                source,
                snapshot: RwLock::new(Arc::new(CatalogSnapshot::empty())),
                apply: Mutex::new(()),
                handlers: Arc::new(Mutex::new(BTreeMap::new())),
                next_handle: AtomicU64::new(1),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// The current snapshot. It is not updated in place; call again after a
    /// replacement to see newer data.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.inner.snapshot.read().clone()
    }

    /// Whether any fetch is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.in_flight.load(Ordering::Acquire) > 0
    }

    /// Fetch the full catalog and replace the snapshot.
    ///
    /// On failure the previous snapshot is left untouched and no handler runs.
    /// There is no retry here.
    pub async fn load(&self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        let _in_flight = InFlight::enter(&self.inner.in_flight);

        let items = self
            .inner
            .source
            .fetch_items()
            .await
            .map_err(CatalogError::FetchFailed)?;

        Ok(self.apply(items))
    }

    fn apply(&self, items: Vec<CatalogItem>) -> Arc<CatalogSnapshot> {
        let _apply = self.inner.apply.lock();

        let snapshot = {
            let mut current = self.inner.snapshot.write();
            let next = Arc::new(CatalogSnapshot::new(
                items,
                current.revision() + 1,
                OffsetDateTime::now_utc(),
            ));
            *current = next.clone();
            next
        };
        info!(
            revision = snapshot.revision(),
            items = snapshot.len(),
            "catalog snapshot replaced"
        );

        self.dispatch(&snapshot);
        snapshot
    }

    fn dispatch(&self, snapshot: &Arc<CatalogSnapshot>) {
        // Each handler is looked up right before it runs, so one removed by an
        // earlier handler (or another thread) is skipped. The registry lock is
        // not held while a handler runs.
        let ids: Vec<u64> = self.inner.handlers.lock().keys().copied().collect();
        for id in ids {
            let handler = self.inner.handlers.lock().get(&id).cloned();
            if let Some(handler) = handler {
                handler(snapshot);
            }
        }
    }

    /// Re-load the catalog on every notice from `feed`, calling `handler`
    /// once per successful replacement.
    ///
    /// Each notice starts its own load task, so cancelling the subscription
    /// does not abort a load that is already running; its result is applied
    /// but no longer dispatched to `handler`.
    pub fn subscribe_to_changes<F, H>(
        &self,
        feed: &F,
        handler: H,
    ) -> anyhow::Result<SubscriptionHandle>
    where
        F: ChangeFeed + ?Sized,
        H: Fn(&Arc<CatalogSnapshot>) + Send + Sync + 'static,
    {
        let mut notices = feed.subscribe()?;
        let id = self.inner.next_handle.fetch_add(1, Ordering::Relaxed);
        self.inner.handlers.lock().insert(id, Arc::new(handler));

        let mirror = self.clone();
        let task = tokio::spawn(async move {
            while let Some(notice) = notices.recv().await {
                debug!(subscription = id, payload = ?notice.payload, "catalog change notice");
                let mirror = mirror.clone();
                tokio::spawn(async move {
                    if let Err(err) = mirror.load().await {
                        warn!(
                            subscription = id,
                            error = ?err,
                            "catalog refresh failed; keeping previous snapshot"
                        );
                    }
                });
            }
            debug!(subscription = id, "change feed closed");
        });

        Ok(SubscriptionHandle {
            id,
            handlers: self.inner.handlers.clone(),
            task: Some(task),
        })
    }

    /// Stop delivering notices for `handle`. Same as dropping it.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) {
        drop(handle);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.handlers.lock().len()
    }
}

/// Cancels its feed subscription when dropped.
#[must_use = "dropping the handle unsubscribes immediately"]
pub struct SubscriptionHandle {
    id: u64,
    handlers: HandlerRegistry,
    task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish()
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.handlers.lock().remove(&self.id);
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(subscription = self.id, "unsubscribed from catalog changes");
    }
}
