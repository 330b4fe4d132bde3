//! Layered service configuration.
//!
//! Sources, lowest precedence first: built-in defaults, an optional
//! `cashbox.{yaml,toml,json}` file (or the file passed on the command line),
//! then `CASHBOX__<SECTION>__<KEY>` environment variables. A `.env` file is
//! loaded into the environment beforehand.

use cashbox_core::CurrencyFormat;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// ISO currency code amounts are reported in.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Overrides the symbol picked for `currency`.
    #[serde(default)]
    pub currency_symbol: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    /// Product name printed on invoices and used in download filenames.
    #[serde(default = "default_product")]
    pub product: String,
    /// Shared secret for webhook signatures. Unsigned webhooks are accepted
    /// when unset.
    #[serde(default)]
    pub webhook_secret: Option<String>,
    /// Public key echoed back in endpoint verification challenges.
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub template_dir: Option<PathBuf>,
    /// Transactions, customers and subscriptions to serve.
    #[serde(default)]
    pub fixtures: Option<PathBuf>,
}

fn default_currency() -> String {
    "usd".to_string()
}

fn default_product() -> String {
    "Subscription".to_string()
}

impl Default for BillingConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            currency_symbol: None,
            vendor: None,
            product: default_product(),
            webhook_secret: None,
            public_key: None,
            template_dir: None,
            fixtures: None,
        }
    }
}

impl BillingConfig {
    pub fn currency_format(&self) -> CurrencyFormat {
        match &self.currency_symbol {
            Some(symbol) => CurrencyFormat::new(&self.currency, symbol),
            None => CurrencyFormat::for_currency(&self.currency),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration, reading `path` instead of `cashbox.*` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name("cashbox").required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("CASHBOX")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
