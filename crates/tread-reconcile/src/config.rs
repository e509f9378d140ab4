//! # Engine Configuration
//!
//! Configuration management for the reconciliation engine and the
//! `rebuild-balances` binary.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TREAD_DB_PATH=/var/lib/tread/tread.db                              │
//! │     TREAD_REJECT_OVERPAYMENT=false                                     │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TREAD_CONFIG, or                                                  │
//! │     ~/.config/installments/tread.toml (Linux)                          │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Rs. 700 service charge, Rs. 610 minimum down payment               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/var/lib/tread/tread.db"
//! max_connections = 5
//!
//! [rules]
//! service_charge_cents = 70000
//! minimum_initial_payment_cents = 61000
//! daily_installment_cents = 5700
//! reject_overpayment = true
//!
//! [batch]
//! chunk_size = 500
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use tread_core::{
    Money, DEFAULT_DAILY_INSTALLMENT, DEFAULT_MINIMUM_INITIAL_PAYMENT, DEFAULT_SERVICE_CHARGE,
};

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration loading failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

// =============================================================================
// Database Settings
// =============================================================================

/// Where the sales ledger lives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; defaults to `<data dir>/tread.db`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Balance Rules
// =============================================================================

/// Business rules applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceRules {
    /// Added once to every new sale's total.
    #[serde(default = "default_service_charge")]
    pub service_charge_cents: i64,

    /// Smallest down payment accepted when a sale is created.
    #[serde(default = "default_minimum_initial_payment")]
    pub minimum_initial_payment_cents: i64,

    /// Expected daily installment, for "installments left" estimates.
    #[serde(default = "default_daily_installment")]
    pub daily_installment_cents: i64,

    /// Reject a payment larger than the live outstanding balance.
    #[serde(default = "default_true")]
    pub reject_overpayment: bool,
}

fn default_service_charge() -> i64 {
    DEFAULT_SERVICE_CHARGE.cents()
}

fn default_minimum_initial_payment() -> i64 {
    DEFAULT_MINIMUM_INITIAL_PAYMENT.cents()
}

fn default_daily_installment() -> i64 {
    DEFAULT_DAILY_INSTALLMENT.cents()
}

fn default_true() -> bool {
    true
}

impl Default for BalanceRules {
    fn default() -> Self {
        BalanceRules {
            service_charge_cents: default_service_charge(),
            minimum_initial_payment_cents: default_minimum_initial_payment(),
            daily_installment_cents: default_daily_installment(),
            reject_overpayment: default_true(),
        }
    }
}

impl BalanceRules {
    pub fn service_charge(&self) -> Money {
        Money::from_cents(self.service_charge_cents)
    }

    pub fn minimum_initial_payment(&self) -> Money {
        Money::from_cents(self.minimum_initial_payment_cents)
    }

    pub fn daily_installment(&self) -> Money {
        Money::from_cents(self.daily_installment_cents)
    }
}

// =============================================================================
// Batch Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSettings {
    /// Sale ids per batched payment query.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_chunk_size() -> usize {
    500
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings {
            chunk_size: default_chunk_size(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconcileConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub rules: BalanceRules,

    #[serde(default)]
    pub batch: BatchSettings,
}

impl ReconcileConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `$TREAD_CONFIG`, or the platform path)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let path = config_path
            .or_else(|| std::env::var_os("TREAD_CONFIG").map(PathBuf::from))
            .or_else(Self::default_config_path);

        let mut config = match path {
            Some(ref path) if path.exists() => Self::from_file(path)?,
            Some(ref path) => {
                debug!(?path, "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML config file without applying overrides.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        info!(?path, "Loading config from file");
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.batch.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "batch.chunk_size must be greater than 0".into(),
            ));
        }

        let money_rules = [
            ("rules.service_charge_cents", self.rules.service_charge_cents),
            (
                "rules.minimum_initial_payment_cents",
                self.rules.minimum_initial_payment_cents,
            ),
            ("rules.daily_installment_cents", self.rules.daily_installment_cents),
        ];
        for (name, value) in money_rules {
            if value < 0 {
                return Err(ConfigError::Invalid(format!("{name} must not be negative")));
            }
        }

        Ok(())
    }

    /// Applies `TREAD_*` overrides, reading variables through `lookup`.
    ///
    /// Unparseable values are logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("TREAD_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("TREAD_DB_MAX_CONNECTIONS") {
            match value.parse() {
                Ok(n) => self.database.max_connections = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TREAD_DB_MAX_CONNECTIONS"),
            }
        }

        if let Some(value) = lookup("TREAD_SERVICE_CHARGE_CENTS") {
            match value.parse() {
                Ok(cents) => self.rules.service_charge_cents = cents,
                Err(_) => warn!(value = %value, "Ignoring invalid TREAD_SERVICE_CHARGE_CENTS"),
            }
        }

        if let Some(value) = lookup("TREAD_MIN_INITIAL_PAYMENT_CENTS") {
            match value.parse() {
                Ok(cents) => self.rules.minimum_initial_payment_cents = cents,
                Err(_) => warn!(value = %value, "Ignoring invalid TREAD_MIN_INITIAL_PAYMENT_CENTS"),
            }
        }

        if let Some(value) = lookup("TREAD_REJECT_OVERPAYMENT") {
            match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.rules.reject_overpayment = true,
                "0" | "false" | "no" | "off" => self.rules.reject_overpayment = false,
                _ => warn!(value = %value, "Ignoring invalid TREAD_REJECT_OVERPAYMENT"),
            }
        }

        if let Some(value) = lookup("TREAD_BATCH_CHUNK_SIZE") {
            match value.parse() {
                Ok(n) => self.batch.chunk_size = n,
                Err(_) => warn!(value = %value, "Ignoring invalid TREAD_BATCH_CHUNK_SIZE"),
            }
        }
    }

    /// Database file to open: the configured path, else the platform data dir.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .or_else(|| {
                Self::project_dirs().map(|dirs| dirs.data_dir().join("tread.db"))
            })
            .unwrap_or_else(|| PathBuf::from("tread.db"))
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "tread", "installments")
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join("tread.toml"))
    }
}
