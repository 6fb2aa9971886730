use super::{MemoryStore, SledStore, Store, StoreError, open_store};
use crate::broker::ticket::TicketNumber;
use crate::config::{StoreBackend, StoreSettings};

use tempfile::tempdir;

fn ticket(n: i64) -> TicketNumber {
    TicketNumber::new(n).unwrap()
}

fn exercise_contract(store: &dyn Store) {
    assert!(store.enumerate().unwrap().is_empty());
    assert!(!store.contains(ticket(7)).unwrap());

    store.insert(ticket(7)).unwrap();
    store.insert(ticket(1000)).unwrap();
    assert!(store.contains(ticket(7)).unwrap());
    assert_eq!(
        store.insert(ticket(7)),
        Err(StoreError::Duplicate(ticket(7)))
    );

    let sold: Vec<u16> = store.enumerate().unwrap().into_iter().map(u16::from).collect();
    assert_eq!(sold, vec![7, 1000]);

    assert!(store.sold_at(ticket(7)).unwrap().is_some());
    assert!(store.sold_at(ticket(8)).unwrap().is_none());

    assert!(store.delete(ticket(7)).unwrap());
    assert!(!store.delete(ticket(7)).unwrap());
    assert!(!store.contains(ticket(7)).unwrap());
    assert!(store.sold_at(ticket(7)).unwrap().is_none());
}

#[test]
fn test_memory_store_contract() {
    exercise_contract(&MemoryStore::new());
}

#[test]
fn test_sled_store_contract() {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    exercise_contract(&store);
}

#[test]
fn test_sled_store_survives_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = SledStore::open(dir.path()).unwrap();
        store.insert(ticket(651)).unwrap();
        store.insert(ticket(652)).unwrap();
        store.flush().unwrap();
    }

    let reopened = SledStore::open(dir.path()).unwrap();
    assert!(reopened.contains(ticket(651)).unwrap());
    assert_eq!(reopened.enumerate().unwrap().len(), 2);
    assert_eq!(
        reopened.insert(ticket(652)),
        Err(StoreError::Duplicate(ticket(652)))
    );
}

#[test]
fn test_sled_store_sold_at_is_recent() {
    let dir = tempdir().unwrap();
    let store = SledStore::open(dir.path()).unwrap();
    let before = chrono::Utc::now() - chrono::Duration::seconds(1);
    store.insert(ticket(3)).unwrap();
    let sold_at = store.sold_at(ticket(3)).unwrap().unwrap();
    assert!(sold_at >= before);
    assert!(sold_at <= chrono::Utc::now());
}

#[test]
fn test_concurrent_inserts_have_one_winner() {
    let dir = tempdir().unwrap();
    let store = std::sync::Arc::new(SledStore::open(dir.path()).unwrap());

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.insert(ticket(500)).is_ok())
        })
        .collect();
    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(store.enumerate().unwrap().len(), 1);
}

#[test]
fn test_open_store_selects_backend() {
    let dir = tempdir().unwrap();
    let memory = open_store(&StoreSettings {
        backend: StoreBackend::Memory,
        path: String::new(),
    })
    .unwrap();
    memory.insert(ticket(1)).unwrap();
    assert!(memory.contains(ticket(1)).unwrap());

    let sled = open_store(&StoreSettings {
        backend: StoreBackend::Sled,
        path: dir.path().join("db").to_string_lossy().into_owned(),
    })
    .unwrap();
    assert!(sled.enumerate().unwrap().is_empty());
}
