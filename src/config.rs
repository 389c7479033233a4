//! Environment-driven configuration.
//!
//! Values are read once at startup (after `dotenvy::dotenv()`); anything
//! missing or malformed falls back to the default listed next to its variable.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::scrapers::{ListingLayout, ScraperConfig, TableLocator, TimestampPolicy};

pub const ENV_DATABASE_URL: &str = "DATABASE_URL";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";
pub const ENV_PRICE_SOURCE_URL: &str = "PRICE_SOURCE_URL";
pub const ENV_PRICE_SOURCE_TABLE: &str = "PRICE_SOURCE_TABLE";
pub const ENV_PRICE_SOURCE_LAYOUT: &str = "PRICE_SOURCE_LAYOUT";
pub const ENV_PRICE_SOURCE_TIMESTAMP_POLICY: &str = "PRICE_SOURCE_TIMESTAMP_POLICY";
pub const ENV_PRICE_UPDATE_INTERVAL: &str = "PRICE_UPDATE_INTERVAL_SECS";
pub const ENV_PRICE_CACHE_TTL: &str = "PRICE_CACHE_TTL_SECS";
pub const ENV_RATE_CACHE_TTL: &str = "RATE_CACHE_TTL_SECS";
pub const ENV_EXCHANGE_RATE_API_KEY: &str = "EXCHANGE_RATE_API_KEY";
pub const ENV_EXCHANGE_RATE_BASE_URL: &str = "EXCHANGE_RATE_BASE_URL";
pub const ENV_AUDIT_LOG_PATH: &str = "AUDIT_LOG_PATH";
pub const ENV_PRICE_UPDATER_ENABLED: &str = "PRICE_UPDATER_ENABLED";

const DEFAULT_DATABASE_URL: &str = "sqlite://metals.db?mode=rwc";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_PRICE_SOURCE_URL: &str = "https://mfd.ru/centrobank/preciousmetals/";
pub const DEFAULT_EXCHANGE_RATE_BASE_URL: &str = "https://v6.exchangerate-api.com/v6";
const DEFAULT_AUDIT_LOG_PATH: &str = "price_audit_log.json";

/// 10 minutes between ingestion cycles
pub const DEFAULT_PRICE_UPDATE_INTERVAL_SECS: u64 = 600;
/// Short TTL class: composed price reads
pub const DEFAULT_PRICE_CACHE_TTL_SECS: u64 = 300;
/// Long TTL class: FX rates
pub const DEFAULT_RATE_CACHE_TTL_SECS: u64 = 3600;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub price_source_url: String,
    pub price_source_table: TableLocator,
    pub price_source_layout: ListingLayout,
    pub price_source_timestamp_policy: TimestampPolicy,
    pub price_update_interval: Duration,
    pub price_cache_ttl: Duration,
    pub rate_cache_ttl: Duration,
    pub exchange_rate_api_key: Option<String>,
    pub exchange_rate_base_url: String,
    pub audit_log_path: PathBuf,
    pub price_updater_enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let scraper = ScraperConfig::default();
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            price_source_url: DEFAULT_PRICE_SOURCE_URL.to_string(),
            price_source_table: scraper.table,
            price_source_layout: scraper.layout,
            price_source_timestamp_policy: scraper.timestamp_policy,
            price_update_interval: Duration::from_secs(DEFAULT_PRICE_UPDATE_INTERVAL_SECS),
            price_cache_ttl: Duration::from_secs(DEFAULT_PRICE_CACHE_TTL_SECS),
            rate_cache_ttl: Duration::from_secs(DEFAULT_RATE_CACHE_TTL_SECS),
            exchange_rate_api_key: None,
            exchange_rate_base_url: DEFAULT_EXCHANGE_RATE_BASE_URL.to_string(),
            audit_log_path: PathBuf::from(DEFAULT_AUDIT_LOG_PATH),
            price_updater_enabled: true,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so parsing can be tested without
    /// touching the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let string = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let secs = |key: &str, default: Duration| match lookup(key) {
            None => default,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(v) if v > 0 => Duration::from_secs(v),
                _ => {
                    tracing::warn!(key, value = %raw, "Invalid duration, using default of {}s", default.as_secs());
                    default
                }
            },
        };

        Self {
            database_url: string(ENV_DATABASE_URL, defaults.database_url),
            bind_addr: string(ENV_BIND_ADDR, defaults.bind_addr),
            price_source_url: string(ENV_PRICE_SOURCE_URL, defaults.price_source_url),
            price_source_table: parsed(&lookup, ENV_PRICE_SOURCE_TABLE, defaults.price_source_table),
            price_source_layout: parsed(&lookup, ENV_PRICE_SOURCE_LAYOUT, defaults.price_source_layout),
            price_source_timestamp_policy: parsed(
                &lookup,
                ENV_PRICE_SOURCE_TIMESTAMP_POLICY,
                defaults.price_source_timestamp_policy,
            ),
            price_update_interval: secs(ENV_PRICE_UPDATE_INTERVAL, defaults.price_update_interval),
            price_cache_ttl: secs(ENV_PRICE_CACHE_TTL, defaults.price_cache_ttl),
            rate_cache_ttl: secs(ENV_RATE_CACHE_TTL, defaults.rate_cache_ttl),
            exchange_rate_api_key: lookup(ENV_EXCHANGE_RATE_API_KEY)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            exchange_rate_base_url: string(
                ENV_EXCHANGE_RATE_BASE_URL,
                defaults.exchange_rate_base_url,
            ),
            audit_log_path: lookup(ENV_AUDIT_LOG_PATH)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.audit_log_path),
            price_updater_enabled: lookup(ENV_PRICE_UPDATER_ENABLED)
                .map(|v| !matches!(v.trim().to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(defaults.price_updater_enabled),
        }
    }
}

impl AppConfig {
    /// Scraper settings for the configured price source
    pub fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            url: self.price_source_url.clone(),
            table: self.price_source_table.clone(),
            layout: self.price_source_layout,
            timestamp_policy: self.price_source_timestamp_policy,
            ..Default::default()
        }
    }
}

fn parsed<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr<Err = String>,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|e| {
            tracing::warn!(key, error = %e, "Invalid value, using default");
            default
        }),
    }
}
