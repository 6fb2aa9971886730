use serde::Deserialize;

/// Top-level configuration settings for the application.
///
/// Includes settings for the server, the ticket store, live broadcasting,
/// seeding and logging.
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub store: StoreSettings,
    pub broadcast: BroadcastSettings,
    pub seed: SeedSettings,
    pub log: LogSettings,
}

/// Configuration settings for the server.
///
/// Defines the host and port the server will bind to.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Which `Store` implementation backs the registry.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sled,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Database directory, used by the sled backend only.
    pub path: String,
}

/// Live update delivery parameters.
///
/// `delivery_timeout_ms` bounds each push to a single subscriber;
/// `keep_alive_secs` is the ping interval and `idle_timeout_secs` the
/// silence after which a connection is considered dead.
#[derive(Debug, Deserialize, Clone)]
pub struct BroadcastSettings {
    pub delivery_timeout_ms: u64,
    pub keep_alive_secs: u64,
    pub idle_timeout_secs: u64,
    pub channel_capacity: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedSettings {
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogSettings {
    pub level: String,
}

/// Partial configuration settings loaded from files or environment.
///
/// Allows partial specification of settings. Missing values can be filled using defaults.
#[derive(Debug, Deserialize, Default)]
pub struct PartialSettings {
    pub server: Option<PartialServerSettings>,
    pub store: Option<PartialStoreSettings>,
    pub broadcast: Option<PartialBroadcastSettings>,
    pub seed: Option<PartialSeedSettings>,
    pub log: Option<PartialLogSettings>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialServerSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialStoreSettings {
    pub backend: Option<StoreBackend>,
    pub path: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialBroadcastSettings {
    pub delivery_timeout_ms: Option<u64>,
    pub keep_alive_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
    pub channel_capacity: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialSeedSettings {
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PartialLogSettings {
    pub level: Option<String>,
}

/// Provides default values for `Settings`.
///
/// Ensures the application has sensible defaults if no configuration is provided.
impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            store: StoreSettings {
                backend: StoreBackend::Memory,
                path: "raffle_db".to_string(),
            },
            broadcast: BroadcastSettings {
                delivery_timeout_ms: 2000,
                keep_alive_secs: 30,
                idle_timeout_secs: 90,
                channel_capacity: 64,
            },
            seed: SeedSettings { enabled: false },
            log: LogSettings {
                level: "info".to_string(),
            },
        }
    }
}

impl Settings {
    /// Fill every missing value of `partial` from `Settings::default()`.
    pub fn merge(partial: PartialSettings) -> Self {
        let default = Settings::default();
        let server = partial.server.unwrap_or_default();
        let store = partial.store.unwrap_or_default();
        let broadcast = partial.broadcast.unwrap_or_default();
        let seed = partial.seed.unwrap_or_default();
        let log = partial.log.unwrap_or_default();

        Settings {
            server: ServerSettings {
                host: server.host.unwrap_or(default.server.host),
                port: server.port.unwrap_or(default.server.port),
            },
            store: StoreSettings {
                backend: store.backend.unwrap_or(default.store.backend),
                path: store.path.unwrap_or(default.store.path),
            },
            broadcast: BroadcastSettings {
                delivery_timeout_ms: broadcast
                    .delivery_timeout_ms
                    .unwrap_or(default.broadcast.delivery_timeout_ms),
                keep_alive_secs: broadcast
                    .keep_alive_secs
                    .unwrap_or(default.broadcast.keep_alive_secs),
                idle_timeout_secs: broadcast
                    .idle_timeout_secs
                    .unwrap_or(default.broadcast.idle_timeout_secs),
                channel_capacity: broadcast
                    .channel_capacity
                    .unwrap_or(default.broadcast.channel_capacity),
            },
            seed: SeedSettings {
                enabled: seed.enabled.unwrap_or(default.seed.enabled),
            },
            log: LogSettings {
                level: log.level.unwrap_or(default.log.level),
            },
        }
    }
}
