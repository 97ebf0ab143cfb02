//! Configuration module for Veilcrawl
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; missing keys fall back to a local Tor-style setup
//! (SOCKS proxy on 9050, control port on 9051, 5 second delay).
//!
//! # Example
//!
//! ```no_run
//! use veilcrawl::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("veilcrawl.toml")).unwrap();
//! println!("Delay between requests: {}s", config.crawler.delay_seconds);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    AnonymizerConfig, Config, CrawlerConfig, FailurePolicy, IdentityConfig, DEFAULT_USER_AGENTS,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
