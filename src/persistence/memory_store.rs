use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use super::{Store, StoreError};
use crate::broker::ticket::{SoldSet, TicketNumber};

/// In-process store. Sold numbers live in a map guarded by a single
/// `RwLock`, so `enumerate` always sees a consistent set.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sold: RwLock<BTreeMap<TicketNumber, DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("memory store lock poisoned".to_string())
}

impl Store for MemoryStore {
    fn contains(&self, number: TicketNumber) -> Result<bool, StoreError> {
        Ok(self.sold.read().map_err(poisoned)?.contains_key(&number))
    }

    fn insert(&self, number: TicketNumber) -> Result<(), StoreError> {
        let mut sold = self.sold.write().map_err(poisoned)?;
        if sold.contains_key(&number) {
            return Err(StoreError::Duplicate(number));
        }
        sold.insert(number, Utc::now());
        Ok(())
    }

    fn delete(&self, number: TicketNumber) -> Result<bool, StoreError> {
        Ok(self.sold.write().map_err(poisoned)?.remove(&number).is_some())
    }

    fn enumerate(&self) -> Result<SoldSet, StoreError> {
        Ok(self.sold.read().map_err(poisoned)?.keys().copied().collect())
    }

    fn sold_at(&self, number: TicketNumber) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.sold.read().map_err(poisoned)?.get(&number).copied())
    }
}
