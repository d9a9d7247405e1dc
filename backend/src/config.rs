//! Configuration management for the milk collection console
//!
//! Supports hierarchical configuration loading:
//! 1. Default values in code
//! 2. Configuration files (development.toml, production.toml)
//! 3. Environment variable overrides with MILK__ prefix

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use shared::{LocalCalendar, MilkResult};

/// Main application configuration
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Current environment (development, production)
    pub environment: String,

    /// Server configuration
    pub server: ServerConfig,

    /// Remote farm API holding productions, deliveries and prices
    pub farm_api: FarmApiConfig,

    /// Reference timezone for day bucketing
    pub calendar: CalendarConfig,

    /// Dashboard and report tuning
    pub collection: CollectionConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Server port
    pub port: u16,

    /// Server host
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FarmApiConfig {
    /// Base URL, e.g. https://farm.example.com
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: Option<String>,

    /// Tenant sent in the X-Tenant-ID header
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CalendarConfig {
    /// UTC offset of the farm, e.g. "-05:00"
    pub utc_offset: String,
}

impl CalendarConfig {
    pub fn local_calendar(&self) -> MilkResult<LocalCalendar> {
        LocalCalendar::from_offset_str(&self.utc_offset)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct CollectionConfig {
    /// Days of deliveries shown on the dashboard
    pub delivery_window_days: u64,

    /// Production rows listed under the daily totals
    pub recent_entries_limit: usize,

    /// Animals listed in the report ranking
    pub top_producers_limit: usize,
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("MILK__ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let config = config::Config::builder()
            // Start with default values
            .set_default("environment", environment.clone())?
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("farm_api.base_url", "http://localhost:8000")?
            .set_default("farm_api.timeout_secs", 15)?
            .set_default("calendar.utc_offset", "-05:00")?
            .set_default("collection.delivery_window_days", 7)?
            .set_default("collection.recent_entries_limit", 5)?
            .set_default("collection.top_producers_limit", 5)?
            // Load environment-specific config file
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // Override with environment variables (MILK__ prefix)
            .add_source(
                Environment::with_prefix("MILK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            host: "0.0.0.0".to_string(),
        }
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            delivery_window_days: 7,
            recent_entries_limit: 5,
            top_producers_limit: 5,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            server: ServerConfig::default(),
            farm_api: FarmApiConfig {
                base_url: "http://localhost:8000".to_string(),
                api_token: None,
                tenant_id: None,
                timeout_secs: 15,
            },
            calendar: CalendarConfig {
                utc_offset: "-05:00".to_string(),
            },
            collection: CollectionConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_calendar_is_ecuador() {
        let calendar = Config::default().calendar.local_calendar().unwrap();
        assert_eq!(calendar.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_bad_offset_is_rejected() {
        let config = CalendarConfig {
            utc_offset: "Mars/Olympus".to_string(),
        };
        assert!(config.local_calendar().is_err());
    }
}
