use std::collections::BTreeMap;

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::core::{
    cart::codec::{self, CART_STORAGE_KEY},
    catalog::{CatalogItem, CatalogSnapshot},
    db::KvStore,
};

/// A cart entry joined with its current catalog item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub item: CatalogItem,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> u64 {
        self.item.price * u64::from(self.quantity)
    }
}

/// The cart seen through a particular snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CartLines {
    /// In snapshot order.
    pub lines: Vec<CartLine>,
    /// Ids the snapshot no longer carries. They stay in the cart.
    pub stale: Vec<(i64, u32)>,
}

impl CartLines {
    pub fn total_price(&self) -> u64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }
}

/// Quantity-by-item-id state, written through to a [`KvStore`] on every
/// mutation.
///
/// No entry ever holds a quantity of zero: removing the last unit deletes it.
#[derive(Debug)]
pub struct CartStore<K> {
    kv: K,
    entries: BTreeMap<i64, u32>,
}

impl<K: KvStore> CartStore<K> {
    /// Load the persisted cart. A missing slot is an empty cart; so is a
    /// corrupt one, which is logged and otherwise ignored. Only a failing
    /// store read is an error.
    pub async fn restore(kv: K) -> anyhow::Result<Self> {
        let raw = kv
            .get(CART_STORAGE_KEY)
            .await
            .context("Failed to read persisted cart")?;

        let entries = match raw {
            None => BTreeMap::new(),
            Some(raw) => match codec::decode(&raw) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(error = %err, "persisted cart is corrupt; starting with an empty cart");
                    BTreeMap::new()
                }
            },
        };
        info!(entries = entries.len(), "cart restored");
        Ok(Self { kv, entries })
    }

    /// Add one unit of `item_id`. Returns the new quantity.
    ///
    /// The whole cart is persisted before this returns. If that write fails
    /// the increment is undone and the error returned.
    pub async fn add(&mut self, item_id: i64) -> anyhow::Result<u32> {
        let previous = self.entries.get(&item_id).copied();
        let quantity = previous.unwrap_or(0).saturating_add(1);
        self.entries.insert(item_id, quantity);

        if let Err(err) = self.persist().await {
            self.set_entry(item_id, previous);
            return Err(err);
        }
        debug!(item_id, quantity, "cart add");
        Ok(quantity)
    }

    /// Remove one unit of `item_id`. Returns the remaining quantity, zero
    /// meaning the entry is gone. Removing an absent id does nothing and
    /// does not touch storage.
    pub async fn remove(&mut self, item_id: i64) -> anyhow::Result<u32> {
        let Some(previous) = self.entries.get(&item_id).copied() else {
            debug!(item_id, "cart remove of absent item ignored");
            return Ok(0);
        };
        let remaining = previous - 1;
        self.set_entry(item_id, Some(remaining).filter(|q| *q > 0));

        if let Err(err) = self.persist().await {
            self.set_entry(item_id, Some(previous));
            return Err(err);
        }
        debug!(item_id, remaining, "cart remove");
        Ok(remaining)
    }

    fn set_entry(&mut self, item_id: i64, quantity: Option<u32>) {
        match quantity {
            Some(quantity) => self.entries.insert(item_id, quantity),
            None => self.entries.remove(&item_id),
        };
    }

    async fn persist(&self) -> anyhow::Result<()> {
        self.kv
            .set(CART_STORAGE_KEY, &codec::encode(&self.entries))
            .await
            .context("Failed to persist cart")
    }

    /// Sum of all quantities.
    pub fn total_count(&self) -> u64 {
        self.entries.values().map(|q| u64::from(*q)).sum()
    }

    pub fn quantity(&self, item_id: i64) -> u32 {
        self.entries.get(&item_id).copied().unwrap_or(0)
    }

    pub fn entries(&self) -> &BTreeMap<i64, u32> {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lines(&self, snapshot: &CatalogSnapshot) -> CartLines {
        let lines = snapshot
            .items()
            .iter()
            .filter_map(|item| {
                self.entries.get(&item.id).map(|quantity| CartLine {
                    item: item.clone(),
                    quantity: *quantity,
                })
            })
            .collect();
        let stale = self
            .entries
            .iter()
            .filter(|(id, _)| snapshot.get(**id).is_none())
            .map(|(id, quantity)| (*id, *quantity))
            .collect();
        CartLines { lines, stale }
    }
}
