//! Configuration and settings management
//!
//! Loads settings from environment variables and defines chain constants.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// Shared access code gating all bot functionality
    pub access_code: String,

    /// SQLite database URL
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Solana JSON-RPC endpoint used for balance lookups
    #[serde(default = "default_solana_rpc_url")]
    pub solana_rpc_url: String,
}

fn default_database_url() -> String {
    "sqlite://database.db".to_string()
}

fn default_solana_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or a required value is
    /// missing.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(File::with_name("config/default").required(false))
            // Add in the current environment file
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Add in a local configuration file
            // This file shouldn't be checked into git
            .add_source(File::with_name("config/local").required(false))
            // Add in settings from the environment (with a prefix of APP)
            .add_source(Environment::with_prefix("APP").separator("__"))
            // Also add settings from environment variables directly (without prefix)
            // ignore_empty treats empty env vars as unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        s.try_deserialize()
    }
}

/// Lamports per SOL, the chain's fixed denomination factor
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Decimal places used when displaying SOL amounts
pub const BALANCE_DISPLAY_DECIMALS: usize = 4;

/// Cooldown between "not authenticated" replies to the same user, in seconds
#[must_use]
pub fn get_denial_cooldown() -> u64 {
    env_u64("DENIAL_COOLDOWN_SECS", 300)
}

/// Maximum number of users tracked by the denial cache
#[must_use]
pub fn get_denial_cache_max_size() -> u64 {
    env_u64("DENIAL_CACHE_MAX_SIZE", 10_000)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
