//! JSON protocol spoken over each WebSocket connection.
//!
//! Messages are internally tagged on `"type"`. Ticket numbers in requests
//! are plain signed integers so that out-of-range values reach the registry
//! and are rejected there with `invalid_number`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::ticket::{SeedRange, SoldSet, TicketNumber};
use crate::utils::error::RegistryError;

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "sell")]
    Sell { number: i64 },
    #[serde(rename = "cancel")]
    Cancel { number: i64 },
    #[serde(rename = "list")]
    List,
    #[serde(rename = "exists")]
    Exists { number: i64 },
    #[serde(rename = "seed")]
    Seed {
        #[serde(default)]
        ranges: Option<Vec<SeedRange>>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Sell,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full sold set; same shape as the broadcast snapshot.
    #[serde(rename = "sold")]
    Sold { sold: Vec<TicketNumber> },
    #[serde(rename = "confirmed")]
    Confirmed { op: Operation, number: TicketNumber },
    #[serde(rename = "status")]
    Status {
        number: TicketNumber,
        sold: bool,
        sold_at: Option<DateTime<Utc>>,
    },
    #[serde(rename = "seeded")]
    Seeded { created: usize, sold_count: usize },
    #[serde(rename = "error")]
    Error { code: String, message: String },
}

impl ServerMessage {
    pub fn sold(sold: &SoldSet) -> Self {
        ServerMessage::Sold {
            sold: sold.iter().copied().collect(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn to_ws_message(&self) -> Result<WsMessage, serde_json::Error> {
        Ok(WsMessage::text(serde_json::to_string(self)?))
    }
}

impl From<&RegistryError> for ServerMessage {
    fn from(err: &RegistryError) -> Self {
        ServerMessage::error(err.code(), err.to_string())
    }
}
