//! # reminder-common
//!
//! Shared utilities: environment-based configuration, password hashing,
//! and tracing setup.

pub mod config;
pub mod password;
pub mod telemetry;

pub use config::{AppConfig, ConfigError};
pub use password::{hash_password, verify_password};
pub use telemetry::try_init_tracing;
