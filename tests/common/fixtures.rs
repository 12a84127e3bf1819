use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use menucart::core::catalog::{CatalogItem, CatalogSource};
use menucart::core::db::{KvStore, SqliteKvStore};
use tokio::sync::oneshot;

/// Creates a SqliteKvStore in a temporary directory.
/// Returns both the store and the temp directory (which must be kept alive).
pub async fn create_test_store() -> (SqliteKvStore, tempfile::TempDir) {
    let dir = tempfile::TempDir::new().expect("Failed to create temp directory");
    let store = SqliteKvStore::open(dir.path().join("cart.db"))
        .await
        .expect("Failed to open test store");
    (store, dir)
}

pub fn item(id: i64, name: &str, category: &str, price: u64) -> CatalogItem {
    CatalogItem {
        id,
        name: name.to_string(),
        category: category.to_string(),
        price,
        image: None,
    }
}

/// A small menu covering every category.
pub fn sample_menu() -> Vec<CatalogItem> {
    vec![
        item(1, "Iced Tea", "Minuman", 5_000),
        item(2, "Fried Rice", "Makanan Utama", 25_000),
        item(3, "Es Jeruk", "Minuman", 7_000),
        item(4, "Ayam Bakar", "Makanan Utama", 32_000),
        item(5, "Pisang Goreng", "Dessert", 12_000),
    ]
}

/// Items tagged with a generation marker in their category, so a snapshot
/// mixing two fetches is detectable.
pub fn generation_menu(generation: usize, len: usize) -> Vec<CatalogItem> {
    (0..len)
        .map(|i| item(i as i64 + 1, &format!("Item {i}"), &format!("gen-{generation}"), 1_000))
        .collect()
}

enum Response {
    Ready(anyhow::Result<Vec<CatalogItem>>),
    Gated(oneshot::Receiver<Vec<CatalogItem>>),
}

#[derive(Default)]
struct Script {
    responses: VecDeque<Response>,
    calls: usize,
}

/// Catalog source that answers fetches from a queue of scripted responses.
/// Gated responses stay pending until the test releases them.
#[derive(Clone, Default)]
pub struct ScriptedSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_items(&self, items: Vec<CatalogItem>) {
        self.push(Response::Ready(Ok(items)));
    }

    pub fn push_failure(&self, message: &str) {
        self.push(Response::Ready(Err(anyhow::anyhow!(message.to_string()))));
    }

    pub fn push_gate(&self) -> oneshot::Sender<Vec<CatalogItem>> {
        let (tx, rx) = oneshot::channel();
        self.push(Response::Gated(rx));
        tx
    }

    pub fn calls(&self) -> usize {
        self.script.lock().unwrap().calls
    }

    fn push(&self, response: Response) {
        self.script.lock().unwrap().responses.push_back(response);
    }
}

impl CatalogSource for ScriptedSource {
    fn fetch_items(&self) -> impl Future<Output = anyhow::Result<Vec<CatalogItem>>> + Send {
        let next = {
            let mut script = self.script.lock().unwrap();
            script.calls += 1;
            script.responses.pop_front()
        };
        async move {
            match next {
                None => Err(anyhow::anyhow!("no scripted response left")),
                Some(Response::Ready(result)) => result,
                Some(Response::Gated(rx)) => rx
                    .await
                    .map_err(|_| anyhow::anyhow!("gate dropped without a response")),
            }
        }
    }
}

/// Store whose writes always fail; reads return whatever it was seeded with.
#[derive(Clone, Default)]
pub struct FailingWrites {
    pub seeded: Option<String>,
}

impl KvStore for FailingWrites {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.seeded.clone().map(String::into_bytes))
    }

    async fn set(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }

    async fn delete(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}

/// Yield to other tasks until `cond` holds, failing after a few seconds.
pub async fn wait_until(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}
