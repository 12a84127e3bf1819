mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from menucart for tests
pub use menucart::core::cart::{CART_STORAGE_KEY, CartStore};
pub use menucart::core::catalog::{
    CatalogItem, CatalogMirror, CatalogSnapshot, CatalogSource, CategoryFilter, ChangeNotice,
    ChannelFeed,
};
pub use menucart::core::db::{KvStore, MemoryKvStore, SqliteKvStore};
pub use menucart::core::error::CatalogError;
pub use menucart::core::session::Session;
