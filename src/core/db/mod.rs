mod kv;
mod memory;
mod state;

use std::{path::Path, sync::Arc};

use state::StoreState;

pub use kv::KvStore;
pub use memory::MemoryKvStore;

/// SQLite-backed [`KvStore`]. Cheap to clone; clones share one pool.
#[derive(Debug, Clone)]
pub struct SqliteKvStore {
    state: Arc<StoreState>,
}

impl SqliteKvStore {
    pub async fn open<P: AsRef<Path>>(db_file: P) -> anyhow::Result<Self> {
        Ok(Self {
            state: Arc::new(StoreState::open(db_file).await?),
        })
    }

    /// Checkpoint and close the underlying pool.
    /// Any store use after this fails.
    pub async fn close(&self) -> anyhow::Result<()> {
        self.state.close().await
    }
}

impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let mut conn = self.state.conn().await?;
        // BLOB so non-UTF-8 or blob values reach the caller instead of failing the decode.
        let value: Option<(Vec<u8>,)> =
            sqlx::query_as(r#"SELECT CAST(value AS BLOB) FROM kv_slot WHERE key = $1"#)
                .bind(key)
                .fetch_optional(&mut **conn)
                .await?;
        Ok(value.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query(
            r#"INSERT INTO kv_slot (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value"#,
        )
        .bind(key)
        .bind(value)
        .execute(&mut **conn)
        .await?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> anyhow::Result<()> {
        let mut conn = self.state.conn().await?;
        sqlx::query(r#"DELETE FROM kv_slot WHERE key = $1"#)
            .bind(key)
            .execute(&mut **conn)
            .await?;
        Ok(())
    }
}
