//! Snap Refresh Guard Core Library
//!
//! This library provides the coordination layer between snap refreshes and
//! running snap processes:
//! - Per-security-tag process census from the pids cgroup
//! - Soft and hard "nothing running" refresh checks
//! - Busy reports with the exact PIDs that block a refresh
//! - Waiting for run inhibition to clear (graphical, text, headless)
//!
//! The binary entry point is in `main.rs`.

pub mod check;
pub mod collect;
pub mod exit_codes;
pub mod inhibit;
pub mod lock;
pub mod logging;
pub mod wait;

pub use check::{BusySnapError, CheckError, CheckPolicy, RefreshChecker};
pub use collect::pids::{CensusError, PidsCgroup, ProcessCensus};
pub use inhibit::{HintError, HintSource, InhibitionHint, RunInhibitStore};
pub use lock::{LockDir, LockError, SnapLock};
pub use wait::{Flow, SessionCapabilities, WaitCoordinator, WaitError, WaitOptions, WaitOutcome};

// Re-export test utilities for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_log;
