//! Configuration management for defraud
//!
//! This crate provides a validated configuration system with support for:
//! - Multiple formats (YAML, TOML, JSON)
//! - Config validation with helpful error messages
//! - Config merging (file + environment + explicit overrides)
//! - Fail-fast credential resolution for remote providers
//!
//! # Example
//!
//! ```no_run
//! use defraud_config::Config;
//!
//! // Load from default location (.defraud.{toml,yml,json})
//! let config = Config::load()?;
//!
//! // Access config values
//! let chunk_size = config.chunking.chunk_size;
//! let k = config.retrieval.k;
//! # Ok::<(), defraud_config::ConfigError>(())
//! ```

pub mod credentials;
pub mod error;
pub mod loader;
pub mod types;
pub mod validation;

pub use credentials::{Credentials, Requirements};
pub use error::{ConfigError, ErrorFormatter, Result};
pub use loader::ConfigBuilder;
pub use types::*;

pub use validation::Validate;

/// Serializes tests that touch process-wide environment variables.
#[cfg(test)]
pub(crate) static ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
