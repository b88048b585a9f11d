//! Process and security-tag identity types.
//!
//! A confined process is accounted to exactly one security tag. The tag is the
//! key used to look up live processes in the pids cgroup hierarchy.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u32);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ProcessId {
    fn from(pid: u32) -> Self {
        ProcessId(pid)
    }
}

/// Security tag of one confined runnable unit.
///
/// Format: `snap.<snap>.<app>` for applications and
/// `snap.<snap>.hook.<hook>` for hooks.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityTag(pub String);

impl SecurityTag {
    /// Security tag of an application.
    pub fn for_app(snap: &str, app: &str) -> Self {
        SecurityTag(format!("snap.{}.{}", snap, app))
    }

    /// Security tag of a hook.
    pub fn for_hook(snap: &str, hook: &str) -> Self {
        SecurityTag(format!("snap.{}.hook.{}", snap, hook))
    }

    /// Accept a tag given by a user.
    ///
    /// The tag is used as a directory name, so it must start with `snap.` and
    /// hold only ASCII alphanumerics, hyphens and single dots.
    pub fn parse(tag: &str) -> Option<Self> {
        let rest = tag.strip_prefix("snap.")?;
        let well_formed = !rest.is_empty()
            && rest.split('.').all(|part| {
                !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            });
        well_formed.then(|| SecurityTag(tag.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecurityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SecurityTag {
    fn from(tag: &str) -> Self {
        SecurityTag(tag.to_string())
    }
}
