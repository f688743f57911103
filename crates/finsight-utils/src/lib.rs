//! Shared utilities for finsight
//!
//! This crate provides common functionality used across the finsight workspace:
//! tracing setup and the immutable application configuration loaded once at
//! process start.

pub mod config;
pub mod error;
pub mod logging;

pub use config::{AppConfig, AppConfigBuilder};
pub use error::{ConfigError, Result};
pub use logging::{DEFAULT_FILTER, filter_for_verbosity, init_tracing_with_default};
