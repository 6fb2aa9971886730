//! The `persistence` module defines the storage contract behind the ticket
//! registry and ships two implementations of it.
//!
//! The registry is written against [`Store`] only. `MemoryStore` keeps the
//! sold set in process memory; `SledStore` keeps it in an embedded `sled`
//! database so sales survive a restart. Both enforce uniqueness of a ticket
//! number themselves: `insert` of a number that is already present fails
//! with [`StoreError::Duplicate`] atomically, which is what makes concurrent
//! sells race-free.

pub mod memory_store;
pub mod sled_store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::broker::ticket::{SoldSet, TicketNumber};
use crate::config::{StoreBackend, StoreSettings};

pub use memory_store::MemoryStore;
pub use sled_store::SledStore;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The number is already present; uniqueness constraint hit.
    #[error("ticket {0} already exists")]
    Duplicate(TicketNumber),

    #[error("store backend failure: {0}")]
    Backend(String),

    /// A stored record could not be decoded.
    #[error("corrupt store record: {0}")]
    Corrupt(String),
}

/// Key-existence set of sold ticket numbers.
///
/// Implementations must make `insert` and `delete` atomic per number.
pub trait Store: Send + Sync {
    fn contains(&self, number: TicketNumber) -> Result<bool, StoreError>;

    /// Add `number`, failing with `StoreError::Duplicate` if it is present.
    fn insert(&self, number: TicketNumber) -> Result<(), StoreError>;

    /// Remove `number`. Returns `false` if it was not present.
    fn delete(&self, number: TicketNumber) -> Result<bool, StoreError>;

    /// All numbers currently present.
    fn enumerate(&self) -> Result<SoldSet, StoreError>;

    /// When `number` was inserted, if it is present.
    fn sold_at(&self, number: TicketNumber) -> Result<Option<DateTime<Utc>>, StoreError>;

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Build the store selected by configuration.
pub fn open_store(settings: &StoreSettings) -> Result<Arc<dyn Store>, StoreError> {
    match settings.backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sled => Ok(Arc::new(SledStore::open(&settings.path)?)),
    }
}

#[cfg(test)]
mod tests;
