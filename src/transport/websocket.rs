//! WebSocket transport
//!
//! This file implements the WebSocket server that fronts the ticket
//! registry. Responsibilities:
//! - Accept TCP/WebSocket connections
//! - Attach every connection to the registry as a live subscriber, which
//!   delivers the current sold set straight away
//! - Translate JSON requests into registry calls and reply on the same
//!   connection
//! - Keep idle connections open with periodic pings, and drop connections
//!   that stay silent past the idle timeout
//!
//! Outbound traffic for a connection (snapshots, replies, pings) goes through
//! one bounded channel drained by a dedicated send loop, so the registry
//! never writes to a socket itself.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::spawn;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at, timeout};
use tokio_tungstenite::accept_async;
use tracing::{debug, error, info, warn};
use tungstenite::protocol::Message as WsMessage;

use crate::broker::Registry;
use crate::broker::ticket::{SeedRange, TicketNumber};
use crate::client::Subscriber;
use crate::config::Settings;
use crate::transport::message::{ClientMessage, Operation, ServerMessage};
use crate::utils::error::RegistryError;

pub async fn start_websocket_server(
    addr: String,
    registry: Arc<Registry>,
    settings: Settings,
) -> std::io::Result<()> {
    let listener = TcpListener::bind(&addr).await?;
    info!("WebSocket server listening on ws://{addr}");
    serve(listener, registry, settings).await;
    Ok(())
}

/// Accept connections on `listener` until the task is dropped.
pub async fn serve(listener: TcpListener, registry: Arc<Registry>, settings: Settings) {
    let settings = Arc::new(settings);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!("Failed to accept connection: {e}");
                continue;
            }
        };

        let registry = registry.clone();
        let settings = settings.clone();
        tokio::spawn(handle_connection(stream, peer, registry, settings));
    }
}

async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    registry: Arc<Registry>,
    settings: Arc<Settings>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(%peer, "WebSocket handshake error: {e}");
            return;
        }
    };
    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let broadcast = &settings.broadcast;
    let delivery_timeout = Duration::from_millis(broadcast.delivery_timeout_ms);
    let keep_alive = Duration::from_secs(broadcast.keep_alive_secs.max(1));
    let idle_timeout = Duration::from_secs(broadcast.idle_timeout_secs.max(1));

    let (tx, mut rx) = mpsc::channel::<WsMessage>(broadcast.channel_capacity.max(1));
    let subscriber = Subscriber::new(&tx);
    let client_id = subscriber.id.clone();
    info!(client = %client_id, %peer, "connected");

    let cleanup_called = Arc::new(AtomicBool::new(false));

    let do_cleanup = {
        let registry = registry.clone();
        let client_id = client_id.clone();
        let cleanup_called = cleanup_called.clone();

        move || {
            if !cleanup_called.swap(true, Ordering::SeqCst) {
                registry.detach(&client_id);
                info!(client = %client_id, "disconnected");
            }
        }
    };

    let mut send_loop = {
        let client_id = client_id.clone();
        let do_cleanup = do_cleanup.clone();

        spawn(async move {
            let mut ticker = interval_at(Instant::now() + keep_alive, keep_alive);
            loop {
                let msg = tokio::select! {
                    next = rx.recv() => match next {
                        Some(msg) => msg,
                        None => break,
                    },
                    _ = ticker.tick() => WsMessage::Ping(Default::default()),
                };
                if let Err(e) = ws_sender.send(msg).await {
                    warn!(client = %client_id, "Failed to send message: {e}");
                    break;
                }
            }

            let _ = ws_sender.close().await;
            do_cleanup();
            debug!(client = %client_id, "send loop closed");
        })
    };

    registry.attach(subscriber);

    loop {
        let msg = match timeout(idle_timeout, ws_receiver.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(e))) => {
                debug!(client = %client_id, "read error: {e}");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                warn!(
                    client = %client_id,
                    idle_secs = idle_timeout.as_secs(),
                    "no traffic within idle timeout; closing"
                );
                break;
            }
        };

        match msg {
            WsMessage::Text(text) => {
                let reply = dispatch(&registry, settings.seed.enabled, text.as_str()).await;
                let reply = match reply.to_ws_message() {
                    Ok(reply) => reply,
                    Err(e) => {
                        error!("Failed to serialize reply: {e}");
                        continue;
                    }
                };
                match timeout(delivery_timeout, tx.send(reply)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(_)) => break,
                    Err(_) => warn!(client = %client_id, "reply dropped; send loop is backed up"),
                }
            }
            WsMessage::Close(_) => break,
            // pings are answered by tungstenite; pongs and binary frames only
            // count as liveness
            _ => {}
        }
    }

    do_cleanup();
    drop(tx);
    if timeout(delivery_timeout, &mut send_loop).await.is_err() {
        send_loop.abort();
    }
}

/// Execute one client request against the registry and build the reply.
///
/// Seeding is refused unless `seed_enabled` is set; a seed request without
/// ranges (or with an empty list) uses [`SeedRange::defaults`].
pub async fn dispatch(registry: &Registry, seed_enabled: bool, text: &str) -> ServerMessage {
    let request = match serde_json::from_str::<ClientMessage>(text) {
        Ok(request) => request,
        Err(err) => {
            warn!(
                "Invalid client message: {err} | {}",
                text.chars().take(100).collect::<String>()
            );
            return ServerMessage::error("bad_request", format!("invalid client message: {err}"));
        }
    };

    let result = match request {
        ClientMessage::Sell { number } => registry.sell(number).await.map(|number| {
            ServerMessage::Confirmed {
                op: Operation::Sell,
                number,
            }
        }),
        ClientMessage::Cancel { number } => registry.cancel(number).await.map(|number| {
            ServerMessage::Confirmed {
                op: Operation::Cancel,
                number,
            }
        }),
        ClientMessage::List => registry.list().map(|sold| ServerMessage::sold(&sold)),
        ClientMessage::Exists { number } => status(registry, number),
        ClientMessage::Seed { ranges } => {
            if !seed_enabled {
                return ServerMessage::error("seed_disabled", "seeding is disabled");
            }
            let ranges = ranges
                .filter(|ranges| !ranges.is_empty())
                .unwrap_or_else(SeedRange::defaults);
            seed(registry, &ranges).await
        }
    };

    result.unwrap_or_else(|err| ServerMessage::from(&err))
}

fn status(registry: &Registry, number: i64) -> Result<ServerMessage, RegistryError> {
    let ticket = TicketNumber::new(number)?;
    let sold_at = registry.sold_at(number)?;
    Ok(ServerMessage::Status {
        number: ticket,
        sold: sold_at.is_some(),
        sold_at,
    })
}

async fn seed(registry: &Registry, ranges: &[SeedRange]) -> Result<ServerMessage, RegistryError> {
    let created = registry.seed_range(ranges).await?;
    let sold_count = registry.list()?.len();
    Ok(ServerMessage::Seeded {
        created,
        sold_count,
    })
}
