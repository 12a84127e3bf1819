use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use anyhow::Context;
use tokio::{fs as async_fs, sync::mpsc};
use tracing::{debug, warn};

use crate::core::catalog::{
    model::CatalogItem,
    source::{CatalogSource, ChangeFeed, ChangeNotice, FeedSubscription},
};

/// Catalog read from a JSON array of items on disk.
#[derive(Debug, Clone)]
pub struct JsonFileCatalog {
    path: PathBuf,
}

impl JsonFileCatalog {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CatalogSource for JsonFileCatalog {
    async fn fetch_items(&self) -> anyhow::Result<Vec<CatalogItem>> {
        let raw = async_fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read catalog {:?}", self.path))?;
        let items: Vec<CatalogItem> = serde_json::from_slice(&raw)
            .with_context(|| format!("Failed to parse catalog {:?}", self.path))?;
        Ok(items)
    }
}

/// Feed that polls a file's modification time and sends a notice whenever it
/// changes. Each subscription owns its poller, which stops once the
/// subscription is dropped.
#[derive(Debug, Clone)]
pub struct PollingFeed {
    path: PathBuf,
    interval: Duration,
}

impl PollingFeed {
    pub fn new<P: AsRef<Path>>(path: P, interval: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            interval,
        }
    }
}

async fn modified_at(path: &Path) -> Option<SystemTime> {
    async_fs::metadata(path).await.ok()?.modified().ok()
}

impl ChangeFeed for PollingFeed {
    fn subscribe(&self) -> anyhow::Result<FeedSubscription> {
        if self.interval.is_zero() {
            anyhow::bail!("Polling interval must be non-zero");
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let path = self.path.clone();
        let interval = self.interval;
        // Taken before returning, so a change right after subscribe is noticed.
        let mut last_seen = std::fs::metadata(&path)
            .ok()
            .and_then(|meta| meta.modified().ok());

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.is_closed() {
                    break;
                }
                let current = modified_at(&path).await;
                if current.is_none() && last_seen.is_some() {
                    warn!(path = ?path, "polled catalog file disappeared");
                }
                if current != last_seen {
                    last_seen = current;
                    debug!(path = ?path, "catalog file changed");
                    let notice = ChangeNotice {
                        payload: Some(serde_json::json!({ "path": path.display().to_string() })),
                    };
                    if tx.send(notice).is_err() {
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}
