use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Label shown for the "all categories" wildcard.
pub const ALL_CATEGORIES_LABEL: &str = "Semua";

/// The fixed set of menu categories, in display order.
pub const MENU_CATEGORIES: [&str; 3] = ["Makanan Utama", "Minuman", "Dessert"];

/// Suggestions offered while no search is active.
pub const POPULAR_SEARCHES: [&str; 5] = ["Nasi", "Ayam", "Es", "Jus", "Bakar"];

/// A purchasable catalog item as the backend delivers it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    /// Smallest currency unit.
    pub price: u64,
    #[serde(default, alias = "image_url", skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// An immutable copy of the catalog, replaced wholesale on each refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogSnapshot {
    items: Vec<CatalogItem>,
    revision: u64,
    fetched_at: Option<OffsetDateTime>,
}

impl CatalogSnapshot {
    /// The snapshot held before any load has completed.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            revision: 0,
            fetched_at: None,
        }
    }

    pub(crate) fn new(items: Vec<CatalogItem>, revision: u64, fetched_at: OffsetDateTime) -> Self {
        Self {
            items,
            revision,
            fetched_at: Some(fetched_at),
        }
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    /// Zero until the first successful load, then increases by one per replacement.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn fetched_at(&self) -> Option<OffsetDateTime> {
        self.fetched_at
    }

    pub fn get(&self, id: i64) -> Option<&CatalogItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Default for CatalogSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}
