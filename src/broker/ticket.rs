//! Ticket domain types
//!
//! A `TicketNumber` is the identity of one raffle entry. Construction is
//! fallible so that anything outside `1..=1000` is rejected before it can
//! reach a store. `SoldSet` is the snapshot type handed to subscribers.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::error::RegistryError;

/// Lowest sellable ticket number.
pub const MIN_TICKET: i64 = 1;
/// Highest sellable ticket number.
pub const MAX_TICKET: i64 = 1000;

/// A raffle ticket number, guaranteed to lie in `1..=1000`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u16")]
pub struct TicketNumber(u16);

impl TicketNumber {
    /// Validate `n` against the ticket domain.
    pub fn new(n: i64) -> Result<Self, RegistryError> {
        if (MIN_TICKET..=MAX_TICKET).contains(&n) {
            Ok(Self(n as u16))
        } else {
            Err(RegistryError::InvalidNumber(n))
        }
    }

    pub fn get(self) -> u16 {
        self.0
    }

    /// Zero-based slot, used to index per-number lock tables.
    pub(crate) fn index(self) -> usize {
        usize::from(self.0) - 1
    }

    /// Every valid ticket number in ascending order.
    pub fn all() -> impl Iterator<Item = TicketNumber> {
        (MIN_TICKET..=MAX_TICKET).map(|n| TicketNumber(n as u16))
    }
}

impl TryFrom<i64> for TicketNumber {
    type Error = RegistryError;

    fn try_from(n: i64) -> Result<Self, Self::Error> {
        Self::new(n)
    }
}

impl From<TicketNumber> for u16 {
    fn from(n: TicketNumber) -> Self {
        n.0
    }
}

impl fmt::Display for TicketNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of currently sold ticket numbers.
pub type SoldSet = BTreeSet<TicketNumber>;

/// Inclusive range of ticket numbers used for bulk seeding.
///
/// Bounds are signed and unchecked; they are clamped to the ticket domain
/// when iterated, and a range whose start exceeds its end is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedRange {
    pub start: i64,
    pub end: i64,
}

impl SeedRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    /// Ranges applied when a seed request names none.
    pub fn defaults() -> Vec<SeedRange> {
        vec![SeedRange::new(651, 700), SeedRange::new(701, 800)]
    }

    /// Ticket numbers covered by this range after clamping to `1..=1000`.
    pub fn numbers(&self) -> impl Iterator<Item = TicketNumber> {
        let start = self.start.max(MIN_TICKET);
        let end = self.end.min(MAX_TICKET);
        (start..=end).map(|n| TicketNumber(n as u16))
    }
}
