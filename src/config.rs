//! Environment configuration
//!
//! Values come from the process environment; `main` loads a `.env` file first
//! through `dotenvy`.

use std::str::FromStr;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    /// `None` runs against the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub nats_url: Option<String>,
    pub currency: String,
    pub default_shipping_fee: i64,
}

#[derive(Error, Debug)]
#[error("invalid value for {key}: {value:?}")]
pub struct ConfigError { pub key: &'static str, pub value: String }

impl Default for Config {
    fn default() -> Self {
        Self { port: 4000, database_url: None, database_max_connections: 10, nats_url: None, currency: "inr".to_string(), default_shipping_fee: 100 }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Ok(Self {
            port: parse(&var, "PORT")?.unwrap_or(defaults.port),
            database_url: var("DATABASE_URL"),
            database_max_connections: parse(&var, "DATABASE_MAX_CONNECTIONS")?.unwrap_or(defaults.database_max_connections),
            nats_url: var("NATS_URL"),
            currency: var("CURRENCY").unwrap_or(defaults.currency),
            default_shipping_fee: match parse::<i64>(&var, "DEFAULT_SHIPPING_FEE")? {
                Some(fee) if fee < 0 => return Err(ConfigError { key: "DEFAULT_SHIPPING_FEE", value: fee.to_string() }),
                Some(fee) => fee,
                None => defaults.default_shipping_fee,
            },
        })
    }
}

fn parse<T: FromStr>(var: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    var(key).map(|value| value.trim().parse().map_err(|_| ConfigError { key, value })).transpose()
}
