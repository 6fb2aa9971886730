//! The `client` module defines how a live connection registers for ticket
//! updates.
//!
//! A [`Subscriber`] pairs a unique identifier with a weak handle to the
//! connection's outbound channel. The connection task owns the only strong
//! sender, so tearing the connection down revokes the registration even if
//! nobody calls `unsubscribe`.

pub mod subscriber;
pub use subscriber::{Subscriber, SubscriberId};
