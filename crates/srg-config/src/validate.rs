//! Configuration validation errors and semantic validation.

use crate::config::Config;
use std::path::Path;
use thiserror::Error;

/// Validation result type.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Configuration validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl ValidationError {
    /// Error code for structured error reporting.
    pub fn code(&self) -> u32 {
        match self {
            ValidationError::InvalidValue { .. } => 65,
        }
    }

    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a configuration semantically.
pub fn validate_config(config: &Config) -> ValidationResult<()> {
    check_absolute("paths.pids_cgroup_dir", &config.paths.pids_cgroup_dir)?;
    check_absolute("paths.lock_dir", &config.paths.lock_dir)?;
    check_absolute("paths.inhibit_dir", &config.paths.inhibit_dir)?;

    if config.wait.poll_interval_ms == 0 {
        return Err(ValidationError::invalid(
            "wait.poll_interval_ms",
            "must be positive",
        ));
    }
    if config.wait.helper_check_interval_ms == 0 {
        return Err(ValidationError::invalid(
            "wait.helper_check_interval_ms",
            "must be positive",
        ));
    }
    if config.wait.helper_check_interval_ms > config.wait.poll_interval_ms {
        return Err(ValidationError::invalid(
            "wait.helper_check_interval_ms",
            format!(
                "must not exceed poll_interval_ms ({})",
                config.wait.poll_interval_ms
            ),
        ));
    }
    if config.wait.helper_program.trim().is_empty() {
        return Err(ValidationError::invalid(
            "wait.helper_program",
            "must not be empty",
        ));
    }

    Ok(())
}

fn check_absolute(field: &str, path: &Path) -> ValidationResult<()> {
    if path.is_absolute() {
        Ok(())
    } else {
        Err(ValidationError::invalid(
            field,
            format!("{} is not an absolute path", path.display()),
        ))
    }
}
