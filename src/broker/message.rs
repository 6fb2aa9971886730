//! Snapshot wire form
//!
//! Every live update carries the complete sold set, never a delta:
//!
//! ```json
//! {"type":"sold","sold":[651,652,653]}
//! ```
//!
//! Numbers are emitted in ascending order, but receivers must not rely on
//! order.

use serde::{Deserialize, Serialize};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::ticket::{SoldSet, TicketNumber};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "sold")]
pub struct Snapshot {
    pub sold: Vec<TicketNumber>,
}

impl Snapshot {
    pub fn of(sold: &SoldSet) -> Self {
        Self {
            sold: sold.iter().copied().collect(),
        }
    }

    pub fn to_ws_message(&self) -> Result<WsMessage, serde_json::Error> {
        Ok(WsMessage::text(serde_json::to_string(self)?))
    }

    pub fn into_sold_set(self) -> SoldSet {
        self.sold.into_iter().collect()
    }
}
