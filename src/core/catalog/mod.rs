mod file;
mod mirror;
mod model;
mod source;
pub mod view;

pub use file::{JsonFileCatalog, PollingFeed};
pub use mirror::{CatalogMirror, SubscriptionHandle};
pub use model::{
    ALL_CATEGORIES_LABEL, CatalogItem, CatalogSnapshot, MENU_CATEGORIES, POPULAR_SEARCHES,
};
pub use source::{CatalogSource, ChangeFeed, ChangeNotice, ChannelFeed, FeedSubscription};
pub use view::{
    ActiveFilter, CategoryFilter, EmptyState, FilterState, ViewSummary, compute_visible,
};
