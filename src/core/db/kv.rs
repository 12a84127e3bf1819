/// A durable key-value slot store.
///
/// Every call completes (or fails) before its future resolves, so a value
/// written by `set` is visible to the next `get` in the same session.
///
/// `get` hands back raw bytes: a slot may hold anything, and deciding what
/// is valid belongs to the reader.
pub trait KvStore {
    fn get(&self, key: &str) -> impl Future<Output = anyhow::Result<Option<Vec<u8>>>> + Send;
    fn set(&self, key: &str, value: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
    fn delete(&self, key: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}
