//! Configuration module for Fetchrank
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use fetchrank::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Rescanning every {}s", config.rescan.interval_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HttpConfig, PoolConfig, RescanConfig, ServerConfig, StoreConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
