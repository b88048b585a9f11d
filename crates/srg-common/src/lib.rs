//! Snap refresh guard common types.
//!
//! This crate provides foundational types shared across srg-core modules:
//! - Process and security-tag identity types
//! - Snap descriptors (apps, hooks, refresh modes)
//! - Output formats

pub mod id;
pub mod output;
pub mod snap;

pub use id::{ProcessId, SecurityTag};
pub use output::OutputFormat;
pub use snap::{AppInfo, HookInfo, SnapInfo, SnapInfoError, REFRESH_MODE_ENDURE};
