//! Ticket registry
//!
//! The `Registry` is the single source of truth for which ticket numbers are
//! sold. It validates every number, mediates all reads and writes to the
//! `Store`, and asks for a fresh snapshot to be published after each
//! successful mutation.
//!
//! Concurrency notes:
//! - mutations of one number are serialized by a per-number lock; numbers
//!   never contend with each other
//! - the store's atomic insert is the final arbiter of a sale: a duplicate
//!   reported by the store is what turns into `AlreadySold`
//! - per-number locks are never held across an `.await`
//! - a mutation only bumps a change counter and returns; a single publisher
//!   task reads the sold set and hands it to the `Broadcaster`, so sellers
//!   never wait on subscribers
//!
//! The publisher handles one snapshot at a time and reads the store only
//! when it gets to it. Subscribers therefore see snapshots in commit order,
//! and a burst of mutations collapses into a single up-to-date snapshot.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::broker::broadcaster::Broadcaster;
use crate::broker::ticket::{SeedRange, SoldSet, TicketNumber};
use crate::client::{Subscriber, SubscriberId};
use crate::persistence::{Store, StoreError};
use crate::utils::error::RegistryError;

pub struct Registry {
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
    locks: Box<[Mutex<()>]>,
    changes: watch::Sender<u64>,
    joins: mpsc::UnboundedSender<SubscriberId>,
}

impl Registry {
    /// Build a registry and spawn its publisher task.
    ///
    /// Must be called from within a Tokio runtime. The publisher stops once
    /// the registry is dropped.
    pub fn new(store: Arc<dyn Store>, broadcaster: Arc<Broadcaster>) -> Self {
        let (changes, changes_rx) = watch::channel(0);
        let (joins, joins_rx) = mpsc::unbounded_channel();

        let publisher = Publisher {
            store: store.clone(),
            broadcaster: broadcaster.clone(),
            changes: changes_rx,
            joins: joins_rx,
        };
        tokio::spawn(publisher.run());

        Self {
            store,
            broadcaster,
            locks: TicketNumber::all().map(|_| Mutex::new(())).collect(),
            changes,
            joins,
        }
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    // Guards `()`, so a poisoned lock carries no broken state.
    fn lock(&self, number: TicketNumber) -> MutexGuard<'_, ()> {
        self.locks[number.index()]
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Run a store mutation for `number` under that number's lock.
    fn mutate<T>(
        &self,
        number: TicketNumber,
        op: impl FnOnce(&dyn Store) -> Result<T, StoreError>,
    ) -> Result<T, RegistryError> {
        let _guard = self.lock(number);
        op(self.store.as_ref()).map_err(|err| {
            let err = RegistryError::from(err);
            if let RegistryError::StorageUnavailable(cause) = &err {
                error!(ticket = %number, error = %cause, "store mutation failed");
            }
            err
        })
    }

    /// Current sold set.
    pub fn list(&self) -> Result<SoldSet, RegistryError> {
        Ok(self.store.enumerate()?)
    }

    pub fn exists(&self, n: i64) -> Result<bool, RegistryError> {
        let number = TicketNumber::new(n)?;
        Ok(self.store.contains(number)?)
    }

    /// When `n` was sold, or `None` if it is not sold.
    pub fn sold_at(&self, n: i64) -> Result<Option<DateTime<Utc>>, RegistryError> {
        let number = TicketNumber::new(n)?;
        Ok(self.store.sold_at(number)?)
    }

    /// Sell ticket `n`. Exactly one of any number of racing callers wins;
    /// the rest get `AlreadySold`.
    pub async fn sell(&self, n: i64) -> Result<TicketNumber, RegistryError> {
        let number = TicketNumber::new(n)?;
        self.mutate(number, |store| store.insert(number))?;

        info!(ticket = %number, "ticket sold");
        self.changed();
        Ok(number)
    }

    /// Return ticket `n` to the pool.
    pub async fn cancel(&self, n: i64) -> Result<TicketNumber, RegistryError> {
        let number = TicketNumber::new(n)?;
        if !self.mutate(number, |store| store.delete(number))? {
            return Err(RegistryError::NotFound(number));
        }

        info!(ticket = %number, "ticket cancelled");
        self.changed();
        Ok(number)
    }

    /// Sell every unsold number in the union of `ranges` and return how many
    /// were created. Already sold numbers are skipped, so seeding twice with
    /// the same ranges creates nothing the second time.
    ///
    /// Subscribers get a single snapshot at the end rather than one per
    /// ticket. If the store fails midway, tickets created so far stay sold
    /// and are still broadcast before the error is returned.
    pub async fn seed_range(&self, ranges: &[SeedRange]) -> Result<usize, RegistryError> {
        let mut created = 0;
        let mut failure = None;

        'ranges: for range in ranges {
            for number in range.numbers() {
                match self.mutate(number, |store| store.insert(number)) {
                    Ok(()) => created += 1,
                    Err(RegistryError::AlreadySold(_)) => {}
                    Err(err) => {
                        failure = Some(err);
                        break 'ranges;
                    }
                }
            }
        }

        match failure {
            None => {
                info!(created, ranges = ranges.len(), "seeded tickets");
                self.changed();
                Ok(created)
            }
            Some(err) => {
                warn!(created, "seeding interrupted by store failure");
                if created > 0 {
                    self.changed();
                }
                Err(err)
            }
        }
    }

    /// Register a live subscriber and queue the current snapshot for it.
    ///
    /// The subscriber is registered before its snapshot is read, so it
    /// cannot miss a change committed in between.
    pub fn attach(&self, subscriber: Subscriber) {
        let id = subscriber.id.clone();
        self.broadcaster.subscribe(subscriber);

        if self.joins.send(id).is_err() {
            warn!("publisher stopped; initial snapshot not sent");
        }
    }

    pub fn detach(&self, id: &SubscriberId) {
        self.broadcaster.unsubscribe(id);
    }

    /// Flush pending store writes, e.g. before shutdown.
    pub fn flush(&self) -> Result<(), RegistryError> {
        Ok(self.store.flush()?)
    }

    fn changed(&self) {
        self.changes
            .send_modify(|generation| *generation = generation.wrapping_add(1));
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("store", &"dyn Store")
            .field("subscribers", &self.broadcaster.subscriber_count())
            .finish()
    }
}

/// Background task that owns all snapshot delivery for one registry.
struct Publisher {
    store: Arc<dyn Store>,
    broadcaster: Arc<Broadcaster>,
    changes: watch::Receiver<u64>,
    joins: mpsc::UnboundedReceiver<SubscriberId>,
}

impl Publisher {
    async fn run(mut self) {
        loop {
            tokio::select! {
                changed = self.changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    self.publish_current().await;
                }
                Some(id) = self.joins.recv() => self.greet(&id).await,
                else => break,
            }
        }
        debug!("publisher stopped");
    }

    async fn publish_current(&self) {
        match self.store.enumerate() {
            Ok(sold) => self.broadcaster.publish(&sold).await,
            Err(err) => {
                warn!(error = %err, "could not read sold set; skipping broadcast");
            }
        }
    }

    async fn greet(&self, id: &SubscriberId) {
        let sold = self.store.enumerate().unwrap_or_else(|err| {
            warn!(subscriber = %id, error = %err, "initial snapshot unavailable; sending empty set");
            SoldSet::new()
        });
        self.broadcaster.send_to(id, &sold).await;
    }
}
