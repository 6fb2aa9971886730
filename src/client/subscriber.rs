use tokio::sync::mpsc::{Sender, WeakSender};
use tungstenite::protocol::Message as WsMessage;
use uuid::Uuid;

/// Identifier of one live connection, e.g. `client-<uuid>`.
pub type SubscriberId = String;

/// A revocable registration of one live connection.
#[derive(Debug, Clone)]
pub struct Subscriber {
    /// Unique identifier for the connection.
    pub id: SubscriberId,

    sender: WeakSender<WsMessage>,
}

impl Subscriber {
    /// Register the receiving end of `sender` without keeping it alive.
    pub fn new(sender: &Sender<WsMessage>) -> Self {
        Self {
            id: format!("client-{}", Uuid::new_v4()),
            sender: sender.downgrade(),
        }
    }

    /// A strong sender, or `None` once the connection has dropped its own.
    pub fn sender(&self) -> Option<Sender<WsMessage>> {
        self.sender.upgrade()
    }
}
