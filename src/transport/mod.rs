//! The `transport` module exposes the registry over WebSockets.
//!
//! Each connection is at once a live feed of sold-set snapshots and a
//! command channel for selling, cancelling, listing, looking up and seeding
//! tickets. The protocol lives in [`message`]; the server and the request
//! dispatcher live in [`websocket`].

pub mod message;
pub mod websocket;

pub use message::{ClientMessage, Operation, ServerMessage};
pub use websocket::{dispatch, serve, start_websocket_server};
