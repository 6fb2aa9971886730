//! Error types surfaced by the ticket registry.
//!
//! `InvalidNumber`, `AlreadySold` and `NotFound` are expected outcomes that
//! callers report back to buyers. `StorageUnavailable` is the only transient
//! failure; the registry never retries it internally.

use thiserror::Error;

use crate::broker::ticket::TicketNumber;
use crate::persistence::StoreError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid ticket number {0}: must be between 1 and 1000")]
    InvalidNumber(i64),

    #[error("ticket {0} is already sold")]
    AlreadySold(TicketNumber),

    #[error("ticket {0} is not sold")]
    NotFound(TicketNumber),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
}

impl RegistryError {
    /// Stable machine-readable code used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            RegistryError::InvalidNumber(_) => "invalid_number",
            RegistryError::AlreadySold(_) => "already_sold",
            RegistryError::NotFound(_) => "not_found",
            RegistryError::StorageUnavailable(_) => "storage_unavailable",
        }
    }
}

// A uniqueness violation is the authoritative "someone else won" signal, not
// a storage fault.
impl From<StoreError> for RegistryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(n) => RegistryError::AlreadySold(n),
            other => RegistryError::StorageUnavailable(other),
        }
    }
}
