//! Configuration module for Tour-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use tour_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Searching tiers: {:?}", config.source.tiers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, HarvestConfig, OutputConfig, SourceConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
