//! CLI for rafflecast
//!
//! Subcommands:
//! - `server`: run the WebSocket server
//! - `watch`: connect to a server and print every sold-set snapshot

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use rafflecast::broker::{Broadcaster, Registry};
use rafflecast::config::load_config;
use rafflecast::persistence::open_store;
use rafflecast::transport::{ServerMessage, start_websocket_server};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "rafflecast")]
enum Command {
    /// Start the WebSocket server
    Server,
    /// Print live sold-set updates from a running server
    Watch {
        /// WebSocket server URL to connect to
        #[arg(long, default_value = "ws://127.0.0.1:8080")]
        url: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cmd = Command::parse();

    match cmd {
        Command::Server => {
            if let Err(e) = run_server().await {
                error!("Server failed: {}", e);
            }
        }
        Command::Watch { url } => {
            rafflecast::utils::logging::init("info");
            if let Err(e) = run_watch(&url).await {
                error!("Watch failed: {}", e);
            }
        }
    }
}

async fn run_server() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    rafflecast::utils::logging::init(&config.log.level);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let store = open_store(&config.store)?;
    let broadcaster = Arc::new(Broadcaster::new(Duration::from_millis(
        config.broadcast.delivery_timeout_ms,
    )));
    let registry = Arc::new(Registry::new(store, broadcaster));
    info!(
        backend = ?config.store.backend,
        seed_enabled = config.seed.enabled,
        "registry ready"
    );

    tokio::select! {
        res = start_websocket_server(addr, registry.clone(), config.clone()) => {
            if let Err(e) = res {
                error!("WebSocket server exited: {e}");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received. Exiting gracefully.");
        }
    }

    if let Err(e) = registry.flush() {
        warn!("Failed to flush store on shutdown: {e}");
    }

    Ok(())
}

async fn run_watch(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    use futures_util::StreamExt;
    use tokio_tungstenite::connect_async;
    use tokio_tungstenite::tungstenite::Message as WsMessage;

    let (mut ws_stream, _response) = connect_async(url).await?;
    info!("Watching {url}");

    while let Some(msg) = ws_stream.next().await {
        if let WsMessage::Text(text) = msg? {
            match serde_json::from_str::<ServerMessage>(text.as_str()) {
                Ok(ServerMessage::Sold { sold }) => {
                    let numbers: Vec<String> = sold.iter().map(|n| n.to_string()).collect();
                    println!("{} sold: {}", sold.len(), numbers.join(","));
                }
                Ok(other) => println!("{other:?}"),
                Err(e) => warn!("Unrecognized message: {e}"),
            }
        }
    }

    info!("Server closed the connection");
    Ok(())
}
