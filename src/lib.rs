//! # rafflecast
//!
//! `rafflecast` sells numbered raffle tickets (1 to 1000) without ever
//! selling the same number twice, and keeps every connected viewer live
//! updated with the complete set of sold numbers.
//!
//! ## Core Modules
//!
//! - `broker`: the ticket `Registry` and the `Broadcaster` that fans out
//!   snapshots of the sold set to live subscribers.
//! - `client`: the weak, revocable registration of a live connection.
//! - `config`: loading and merging server configuration.
//! - `persistence`: the `Store` contract with in-memory and `sled` backed
//!   implementations.
//! - `transport`: the WebSocket server and its JSON protocol.
//! - `utils`: error types and logging setup.

pub mod broker;
pub mod client;
pub mod config;
pub mod persistence;
pub mod transport;
pub mod utils;
