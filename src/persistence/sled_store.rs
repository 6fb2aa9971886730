//! Durable store backed by `sled`
//!
//! Sold tickets live in a dedicated `tickets` tree. Each key is the ticket
//! number as two big-endian bytes, so iteration yields numbers in ascending
//! order; each value is the sale time in milliseconds since the UNIX epoch,
//! also big-endian.
//!
//! Uniqueness is enforced with `compare_and_swap` against an absent value,
//! which sled applies atomically per key.

use std::path::Path;

use chrono::{DateTime, Utc};
use sled::{Db, IVec, Tree};

use super::{Store, StoreError};
use crate::broker::ticket::{SoldSet, TicketNumber};

const TICKETS_TREE: &str = "tickets";

#[derive(Clone)]
pub struct SledStore {
    db: Db,
    tickets: Tree,
}

impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl SledStore {
    /// Open or create a sled database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db = sled::open(path)?;
        let tickets = db.open_tree(TICKETS_TREE)?;
        Ok(Self { db, tickets })
    }

    fn key(number: TicketNumber) -> [u8; 2] {
        number.get().to_be_bytes()
    }

    fn decode_number(key: &IVec) -> Result<TicketNumber, StoreError> {
        let bytes: [u8; 2] = key
            .as_ref()
            .try_into()
            .map_err(|_| StoreError::Corrupt(format!("ticket key of {} bytes", key.len())))?;
        TicketNumber::new(i64::from(u16::from_be_bytes(bytes)))
            .map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn decode_sold_at(value: &IVec) -> Result<DateTime<Utc>, StoreError> {
        let bytes: [u8; 8] = value
            .as_ref()
            .try_into()
            .map_err(|_| StoreError::Corrupt(format!("sold_at of {} bytes", value.len())))?;
        let millis = i64::from_be_bytes(bytes);
        DateTime::from_timestamp_millis(millis)
            .ok_or_else(|| StoreError::Corrupt(format!("sold_at {millis} out of range")))
    }
}

impl Store for SledStore {
    fn contains(&self, number: TicketNumber) -> Result<bool, StoreError> {
        Ok(self.tickets.contains_key(Self::key(number))?)
    }

    fn insert(&self, number: TicketNumber) -> Result<(), StoreError> {
        let sold_at = Utc::now().timestamp_millis().to_be_bytes();
        match self
            .tickets
            .compare_and_swap(Self::key(number), None::<&[u8]>, Some(&sold_at[..]))?
        {
            Ok(()) => Ok(()),
            Err(_) => Err(StoreError::Duplicate(number)),
        }
    }

    fn delete(&self, number: TicketNumber) -> Result<bool, StoreError> {
        Ok(self.tickets.remove(Self::key(number))?.is_some())
    }

    fn enumerate(&self) -> Result<SoldSet, StoreError> {
        self.tickets
            .iter()
            .keys()
            .map(|key| Self::decode_number(&key?))
            .collect()
    }

    fn sold_at(&self, number: TicketNumber) -> Result<Option<DateTime<Utc>>, StoreError> {
        self.tickets
            .get(Self::key(number))?
            .map(|value| Self::decode_sold_at(&value))
            .transpose()
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for SledStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SledStore")
            .field("db", &"sled::Db")
            .field("tree", &TICKETS_TREE)
            .finish()
    }
}
