mod settings;

use config::{Config, ConfigError, Environment, File};

use settings::PartialSettings;

pub use settings::{
    BroadcastSettings, LogSettings, SeedSettings, ServerSettings, Settings, StoreBackend,
    StoreSettings,
};

/// Prefix for environment overrides, e.g. `RAFFLE_SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "RAFFLE";

/// Loads the configuration from `config/default` and environment variables.
/// Merges the configuration with default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from("config/default")
}

/// Same as [`load_config`] with an explicit base file name (extension optional).
pub fn load_config_from(file: &str) -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;

    // Try to deserialize what is available
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merge(partial))
}

#[cfg(test)]
mod tests;
