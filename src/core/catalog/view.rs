//! Pure derivation of the displayed item list from a snapshot and the
//! session's filter state.

use crate::core::catalog::model::{
    ALL_CATEGORIES_LABEL, CatalogItem, CatalogSnapshot, POPULAR_SEARCHES,
};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(String),
}

impl CategoryFilter {
    /// The wildcard label (any case) and `"all"` select every category;
    /// anything else is matched exactly against item categories.
    pub fn parse(label: &str) -> Self {
        if label.eq_ignore_ascii_case(ALL_CATEGORIES_LABEL) || label.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(label.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => ALL_CATEGORIES_LABEL,
            CategoryFilter::Only(category) => category,
        }
    }

    pub fn matches(&self, item: &CatalogItem) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(category) => item.category == *category,
        }
    }
}

/// Transient filter state owned by the session. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterState {
    pub category: CategoryFilter,
    pub search_text: String,
}

impl FilterState {
    pub fn is_search_active(&self) -> bool {
        !self.search_text.is_empty()
    }

    pub fn clear_search(&mut self) {
        self.search_text.clear();
    }

    pub fn reset_category(&mut self) {
        self.category = CategoryFilter::All;
    }
}

/// Items of `snapshot` visible under `filter`, in snapshot order.
///
/// A non-empty search text takes priority: it matches name or category,
/// case-insensitively, and the category filter is ignored while it is set.
pub fn compute_visible<'a>(
    snapshot: &'a CatalogSnapshot,
    filter: &FilterState,
) -> Vec<&'a CatalogItem> {
    if filter.is_search_active() {
        let needle = filter.search_text.to_lowercase();
        snapshot
            .items()
            .iter()
            .filter(|item| {
                item.name.to_lowercase().contains(&needle)
                    || item.category.to_lowercase().contains(&needle)
            })
            .collect()
    } else {
        snapshot
            .items()
            .iter()
            .filter(|item| filter.category.matches(item))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFilter {
    Search(String),
    Category(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoSearchMatch,
    EmptyCategory,
}

/// What a front end needs besides the visible items themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSummary {
    pub visible: usize,
    pub search_active: bool,
    pub active_filters: Vec<ActiveFilter>,
    pub empty_state: Option<EmptyState>,
    pub suggestions: Vec<&'static str>,
}

impl ViewSummary {
    pub fn new(snapshot: &CatalogSnapshot, filter: &FilterState, visible: usize) -> Self {
        let search_active = filter.is_search_active();

        let mut active_filters = Vec::new();
        if search_active {
            active_filters.push(ActiveFilter::Search(filter.search_text.clone()));
        } else if let CategoryFilter::Only(category) = &filter.category {
            // The category badge is hidden while searching.
            active_filters.push(ActiveFilter::Category(category.clone()));
        }

        let empty_state = match (visible, search_active) {
            (0, true) => Some(EmptyState::NoSearchMatch),
            (0, false) => Some(EmptyState::EmptyCategory),
            _ => None,
        };

        let suggestions = if !search_active && !snapshot.is_empty() {
            POPULAR_SEARCHES.to_vec()
        } else {
            Vec::new()
        };

        Self {
            visible,
            search_active,
            active_filters,
            empty_state,
            suggestions,
        }
    }
}
