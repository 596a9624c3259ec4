//! Application configuration management.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// SQL database backing the entity store. Unset means in-memory.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    /// Ledger defaults.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Demo data seeding configuration.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL, e.g. `postgres://...` or `sqlite://cemtrade.db?mode=rwc`.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Ledger defaults used when the `settings` document has not been written yet.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Bags in one ton of cement, used by the GL/GV billing reconciliation.
    #[serde(default = "default_bags_per_ton")]
    pub bags_per_ton: Decimal,
}

fn default_bags_per_ton() -> Decimal {
    Decimal::from(20)
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            bags_per_ton: default_bags_per_ton(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "cemtrade=debug".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

/// Demo data seeding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Shop names to create stock items for.
    #[serde(default = "default_shops")]
    pub shops: Vec<String>,
    /// Date treated as "today" by the seeded data. Defaults to the local date.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

fn default_shops() -> Vec<String> {
    vec!["Main Shop".to_string(), "Godown".to_string()]
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            shops: default_shops(),
            reference_date: None,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CEMTRADE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
