use super::error::RegistryError;
use super::logging;
use crate::broker::ticket::TicketNumber;
use crate::persistence::StoreError;

#[test]
fn logging_init_accepts_levels() {
    // Repeated init must not panic
    logging::init("info");
    logging::init("debug");
    logging::init("warn");
}

#[test]
fn parse_level_falls_back_to_info() {
    assert_eq!(logging::parse_level("WARNING"), tracing::Level::WARN);
    assert_eq!(logging::parse_level("trace"), tracing::Level::TRACE);
    assert_eq!(logging::parse_level("verbose"), tracing::Level::INFO);
}

#[test]
fn duplicate_store_error_maps_to_already_sold() {
    let n = TicketNumber::new(42).unwrap();
    let err: RegistryError = StoreError::Duplicate(n).into();
    assert_eq!(err, RegistryError::AlreadySold(n));
    assert_eq!(err.code(), "already_sold");
}

#[test]
fn backend_store_error_maps_to_storage_unavailable() {
    let err: RegistryError = StoreError::Backend("disk full".into()).into();
    assert!(matches!(err, RegistryError::StorageUnavailable(_)));
    assert_eq!(err.code(), "storage_unavailable");
    assert_eq!(err.to_string(), "storage unavailable: store backend failure: disk full");
}

#[test]
fn invalid_number_message_names_the_input() {
    let err = TicketNumber::new(-5).unwrap_err();
    assert_eq!(err, RegistryError::InvalidNumber(-5));
    assert_eq!(err.to_string(), "invalid ticket number -5: must be between 1 and 1000");
}
