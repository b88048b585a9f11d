//! Snap refresh guard configuration loading and validation.
//!
//! This crate provides:
//! - Typed Rust structs for config.json
//! - Config resolution (CLI → env → XDG → system → defaults)
//! - Semantic validation

pub mod config;
pub mod resolve;
pub mod validate;

pub use config::{load_config, Config, ConfigError, PathsConfig, ResolvedConfig, WaitConfig};
pub use resolve::{resolve_config, ConfigSource};
pub use validate::{validate_config, ValidationError, ValidationResult};
