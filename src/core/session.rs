use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{
    cart::CartStore,
    catalog::{
        CatalogItem, CatalogMirror, CatalogSnapshot, CatalogSource, CategoryFilter, ChangeFeed,
        FilterState, SubscriptionHandle, ViewSummary, compute_visible,
    },
    db::KvStore,
    error::CatalogError,
};

/// The displayed menu at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuView {
    pub revision: u64,
    pub items: Vec<CatalogItem>,
    pub summary: ViewSummary,
}

/// One browsing session: the catalog mirror, the cart, and the filter state
/// the user is editing.
#[derive(Debug)]
pub struct Session<S, K> {
    mirror: CatalogMirror<S>,
    cart: CartStore<K>,
    filter: FilterState,
    last_fetch_error: Option<String>,
    subscription: Option<SubscriptionHandle>,
}

impl<S: CatalogSource, K: KvStore> Session<S, K> {
    /// Run the initial catalog load and the cart restore concurrently.
    ///
    /// A failed initial load still yields a session, with an empty catalog and
    /// the failure available from [`Session::last_fetch_error`]. A failing
    /// cart store read is returned as an error.
    pub async fn start(source: S, kv: K) -> anyhow::Result<Self> {
        let mirror = CatalogMirror::new(source);
        let (loaded, cart) = tokio::join!(mirror.load(), CartStore::restore(kv));
        let cart = cart?;

        let last_fetch_error = match loaded {
            Ok(snapshot) => {
                info!(items = snapshot.len(), cart = cart.total_count(), "session started");
                None
            }
            Err(err) => {
                warn!(error = ?err, "initial catalog load failed");
                Some(describe(&err))
            }
        };

        Ok(Self {
            mirror,
            cart,
            filter: FilterState::default(),
            last_fetch_error,
            subscription: None,
        })
    }

    /// Follow `feed`, calling `on_change` after every replacement it causes.
    /// Replaces any earlier subscription.
    pub fn watch<F, H>(&mut self, feed: &F, on_change: H) -> anyhow::Result<()>
    where
        F: ChangeFeed,
        H: Fn(&Arc<CatalogSnapshot>) + Send + Sync + 'static,
    {
        let handle = self.mirror.subscribe_to_changes(feed, on_change)?;
        if let Some(previous) = self.subscription.replace(handle) {
            self.mirror.unsubscribe(previous);
        }
        Ok(())
    }

    pub fn unwatch(&mut self) {
        if let Some(handle) = self.subscription.take() {
            self.mirror.unsubscribe(handle);
        }
    }

    pub fn is_watching(&self) -> bool {
        self.subscription.is_some()
    }

    /// Re-fetch explicitly, e.g. as a retry after a failure.
    pub async fn refresh(&mut self) -> Result<Arc<CatalogSnapshot>, CatalogError> {
        match self.mirror.load().await {
            Ok(snapshot) => {
                self.last_fetch_error = None;
                Ok(snapshot)
            }
            Err(err) => {
                warn!(error = ?err, "catalog refresh failed; keeping previous snapshot");
                self.last_fetch_error = Some(describe(&err));
                Err(err)
            }
        }
    }

    /// Why the most recent load failed, cleared by the next successful refresh.
    pub fn last_fetch_error(&self) -> Option<&str> {
        self.last_fetch_error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.mirror.is_loading()
    }

    pub fn mirror(&self) -> &CatalogMirror<S> {
        &self.mirror
    }

    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        self.mirror.snapshot()
    }

    pub fn menu(&self) -> MenuView {
        let snapshot = self.mirror.snapshot();
        let items: Vec<CatalogItem> = compute_visible(&snapshot, &self.filter)
            .into_iter()
            .cloned()
            .collect();
        let summary = ViewSummary::new(&snapshot, &self.filter, items.len());
        MenuView {
            revision: snapshot.revision(),
            items,
            summary,
        }
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn set_category(&mut self, category: CategoryFilter) {
        self.filter.category = category;
    }

    pub fn reset_category(&mut self) {
        self.filter.reset_category();
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.filter.search_text = text.into();
    }

    pub fn clear_search(&mut self) {
        self.filter.clear_search();
    }

    pub fn cart(&self) -> &CartStore<K> {
        &self.cart
    }

    pub async fn add_to_cart(&mut self, item_id: i64) -> anyhow::Result<u32> {
        self.cart.add(item_id).await
    }

    pub async fn remove_from_cart(&mut self, item_id: i64) -> anyhow::Result<u32> {
        self.cart.remove(item_id).await
    }

    pub fn cart_count(&self) -> u64 {
        self.cart.total_count()
    }
}

fn describe(err: &CatalogError) -> String {
    let CatalogError::FetchFailed(source) = err;
    format!("{source:#}")
}
