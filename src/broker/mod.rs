//! The broker is the concurrent core of `rafflecast`: the ticket
//! [`Registry`] and the [`Broadcaster`] that keeps live viewers in sync.

pub mod broadcaster;
pub mod message;
pub mod registry;
pub mod ticket;

pub use broadcaster::Broadcaster;
pub use registry::Registry;
pub use ticket::{SeedRange, SoldSet, TicketNumber};
