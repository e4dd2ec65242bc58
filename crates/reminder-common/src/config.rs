//! Application configuration
//!
//! Loads configuration from environment variables (with `.env` support).

use std::env;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseSettings,
    pub scheduler: SchedulerSettings,
    pub storage: StorageSettings,
}

/// Database connection settings
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Notification scheduler settings
#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    /// Tick interval in seconds
    pub interval_secs: u64,
    /// Lookahead window before a reminder's due instant, in seconds
    pub window_secs: i64,
}

/// File storage settings (release-only; uploads are handled elsewhere)
#[derive(Debug, Clone)]
pub struct StorageSettings {
    pub files_dir: String,
}

// Default value functions
fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_interval_secs() -> u64 {
    5
}

fn default_window_secs() -> i64 {
    300
}

fn default_files_dir() -> String {
    "./files".to_string()
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if required environment variables are missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database: DatabaseSettings {
                url: env::var("DATABASE_URL")
                    .map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_max_connections),
                min_connections: env::var("DATABASE_MIN_CONNECTIONS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_min_connections),
            },
            scheduler: SchedulerSettings {
                interval_secs: env::var("SCHEDULER_INTERVAL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_interval_secs),
                window_secs: env::var("SCHEDULER_WINDOW_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or_else(default_window_secs),
            },
            storage: StorageSettings {
                files_dir: env::var("FILES_DIR").unwrap_or_else(|_| default_files_dir()),
            },
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(default_max_connections(), 10);
        assert_eq!(default_min_connections(), 1);
        assert_eq!(default_interval_secs(), 5);
        assert_eq!(default_window_secs(), 300);
        assert_eq!(default_files_dir(), "./files");
    }
}
