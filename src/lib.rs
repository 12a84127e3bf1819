pub mod core;

pub use crate::core::cart::{CART_STORAGE_KEY, CartLine, CartLines, CartStore};
pub use crate::core::catalog::{
    CatalogItem, CatalogMirror, CatalogSnapshot, CatalogSource, CategoryFilter, ChangeFeed,
    ChangeNotice, ChannelFeed, FilterState, JsonFileCatalog, PollingFeed, SubscriptionHandle,
    compute_visible,
};
pub use crate::core::db::{KvStore, MemoryKvStore, SqliteKvStore};
pub use crate::core::error::{CartCodecError, CatalogError};
pub use crate::core::session::{MenuView, Session};
