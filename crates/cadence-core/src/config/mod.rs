use anyhow::Result;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub recurrence: RecurrenceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

/// Tunables for occurrence generation and the queries built on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RecurrenceConfig {
    /// Generation horizon, in calendar months past the anchor.
    pub horizon_months: u32,
    /// How far past the anchor exceptions are loaded when an event is time-shifted.
    pub exception_shift_window_years: u32,
    /// Upper bound applied to caller-supplied page sizes.
    pub max_page_size: u32,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            horizon_months: 12,
            exception_shift_window_years: 10,
            max_page_size: 200,
        }
    }
}

impl Settings {
    /// ## Summary
    /// Returns a configuration builder pre-populated with every default value.
    ///
    /// ## Errors
    /// Returns an error if a default cannot be registered.
    pub fn builder() -> Result<ConfigBuilder<DefaultState>> {
        let defaults = RecurrenceConfig::default();
        Ok(Config::builder()
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "info")?
            .set_default(
                "recurrence.horizon_months",
                i64::from(defaults.horizon_months),
            )?
            .set_default(
                "recurrence.exception_shift_window_years",
                i64::from(defaults.exception_shift_window_years),
            )?
            .set_default(
                "recurrence.max_page_size",
                i64::from(defaults.max_page_size),
            )?)
    }

    /// ## Summary
    /// Loads configuration from `config.toml` and environment variables into a `Settings`.
    /// Environment variables take precedence over file values. Variables are prefixed with
    /// `CADENCE_` and nest with `__`, e.g. `CADENCE_RECURRENCE__HORIZON_MONTHS=24`.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails.
    pub fn load() -> Result<Self> {
        Ok(Self::builder()?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env file
            .add_source(
                config::Environment::with_prefix("CADENCE")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?)
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    dotenvy::dotenv().ok();

    Settings::load()
}
