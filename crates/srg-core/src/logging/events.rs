//! Standard event names used in logging.
//!
//! Events are emitted with `tracing` and carry the event name in the
//! `event` field so JSONL consumers can filter on it.

/// Busy-check events.
pub const CHECK_STARTED: &str = "check.started";
pub const CHECK_UNIT_EXEMPT: &str = "check.unit_exempt";
pub const CHECK_UNIT_BUSY: &str = "check.unit_busy";
pub const CHECK_CLEAR: &str = "check.clear";
pub const CHECK_BUSY: &str = "check.busy";

/// Per-snap lock events.
pub const LOCK_ACQUIRED: &str = "lock.acquired";
pub const LOCK_RELEASED: &str = "lock.released";

/// Wait coordinator events.
pub const WAIT_NOT_INHIBITED: &str = "wait.not_inhibited";
pub const WAIT_FLOW_SELECTED: &str = "wait.flow_selected";
pub const WAIT_POLL: &str = "wait.poll";
pub const WAIT_CLEARED: &str = "wait.cleared";
pub const WAIT_HELPER_STARTED: &str = "wait.helper_started";
pub const WAIT_HELPER_EXITED: &str = "wait.helper_exited";
pub const WAIT_HELPER_STOPPED: &str = "wait.helper_stopped";

/// Config/init events.
pub const CONFIG_LOADED: &str = "config.loaded";
pub const CONFIG_DEFAULT_USED: &str = "config.default_used";
