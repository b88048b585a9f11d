//! Snap descriptors: the runnable units of a package.
//!
//! A snap owns applications and hooks. Names are unique within each kind, which
//! the map representation enforces. Descriptors are read-only for the refresh
//! checks; they are usually loaded from a JSON file:
//!
//! ```json
//! {
//!   "name": "pkg",
//!   "apps": {
//!     "app": {},
//!     "svc": { "daemon": "simple", "refresh-mode": "endure" }
//!   },
//!   "hooks": { "configure": {} }
//! }
//! ```

use crate::id::SecurityTag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while loading a snap descriptor.
#[derive(Debug, Error)]
pub enum SnapInfoError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid snap descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid {kind} name {name:?}")]
    InvalidName { kind: &'static str, name: String },
}

/// Refresh mode of a service that keeps running across refreshes. Other
/// modes are kept verbatim and carry no exemption.
pub const REFRESH_MODE_ENDURE: &str = "endure";

/// An application declared by a snap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AppInfo {
    /// Daemon type (`simple`, `forking`, ...); present only for services.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daemon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_mode: Option<String>,
}

impl AppInfo {
    /// Plain application, started on demand.
    pub fn command() -> Self {
        Self::default()
    }

    /// Service application with the given daemon type.
    pub fn service(daemon: impl Into<String>) -> Self {
        Self {
            daemon: Some(daemon.into()),
            refresh_mode: None,
        }
    }

    pub fn with_refresh_mode(mut self, mode: impl Into<String>) -> Self {
        self.refresh_mode = Some(mode.into());
        self
    }

    pub fn is_service(&self) -> bool {
        self.daemon.is_some()
    }

    /// Whether this service is expected to keep running across a refresh.
    pub fn endures_refresh(&self) -> bool {
        self.is_service() && self.refresh_mode.as_deref() == Some(REFRESH_MODE_ENDURE)
    }
}

/// A hook declared by a snap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookInfo {}

/// In-memory descriptor of one snap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapInfo {
    pub name: String,

    #[serde(default)]
    pub apps: BTreeMap<String, AppInfo>,

    #[serde(default)]
    pub hooks: BTreeMap<String, HookInfo>,
}

impl SnapInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_app(mut self, name: impl Into<String>, app: AppInfo) -> Self {
        self.apps.insert(name.into(), app);
        self
    }

    pub fn with_hook(mut self, name: impl Into<String>) -> Self {
        self.hooks.insert(name.into(), HookInfo::default());
        self
    }

    pub fn app_security_tag(&self, app: &str) -> SecurityTag {
        SecurityTag::for_app(&self.name, app)
    }

    pub fn hook_security_tag(&self, hook: &str) -> SecurityTag {
        SecurityTag::for_hook(&self.name, hook)
    }

    /// Load and validate a descriptor from a JSON file.
    pub fn load(path: &Path) -> Result<Self, SnapInfoError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapInfoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let info: SnapInfo =
            serde_json::from_str(&content).map_err(|source| SnapInfoError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        info.validate()?;
        Ok(info)
    }

    /// Check a snap name on its own, e.g. one given on the command line.
    pub fn validate_name(name: &str) -> Result<(), SnapInfoError> {
        check_name("snap", name)
    }

    /// Check that every name is safe to embed in a security tag.
    ///
    /// Security tags become path components under the cgroup hierarchy, so
    /// names may only hold ASCII alphanumerics and inner hyphens.
    pub fn validate(&self) -> Result<(), SnapInfoError> {
        check_name("snap", &self.name)?;
        for name in self.apps.keys() {
            check_name("app", name)?;
        }
        for name in self.hooks.keys() {
            check_name("hook", name)?;
        }
        Ok(())
    }
}

fn check_name(kind: &'static str, name: &str) -> Result<(), SnapInfoError> {
    let valid = !name.is_empty()
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SnapInfoError::InvalidName {
            kind,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_detection() {
        assert!(!AppInfo::command().is_service());
        assert!(AppInfo::service("simple").is_service());
    }

    #[test]
    fn test_endure_requires_service() {
        let app = AppInfo::command().with_refresh_mode(REFRESH_MODE_ENDURE);
        assert!(!app.endures_refresh());

        let svc = AppInfo::service("simple").with_refresh_mode(REFRESH_MODE_ENDURE);
        assert!(svc.endures_refresh());

        let restart = AppInfo::service("simple").with_refresh_mode("restart");
        assert!(!restart.endures_refresh());
    }

    #[test]
    fn test_parse_descriptor() {
        let json = r#"{
            "name": "pkg",
            "apps": {
                "app": {},
                "svc": { "daemon": "simple", "refresh-mode": "endure" }
            },
            "hooks": { "configure": {} }
        }"#;
        let info: SnapInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.name, "pkg");
        assert!(!info.apps["app"].is_service());
        assert!(info.apps["svc"].endures_refresh());
        assert!(info.hooks.contains_key("configure"));
        assert!(info.validate().is_ok());
    }

    #[test]
    fn test_unknown_refresh_mode_is_kept_and_not_exempt() {
        let json = r#"{
            "name": "pkg",
            "apps": { "svc": { "daemon": "simple", "refresh-mode": "ignore-running" } }
        }"#;
        let info: SnapInfo = serde_json::from_str(json).unwrap();
        let svc = &info.apps["svc"];
        assert_eq!(svc.refresh_mode.as_deref(), Some("ignore-running"));
        assert!(svc.is_service());
        assert!(!svc.endures_refresh());
    }

    #[test]
    fn test_security_tags() {
        let info = SnapInfo::new("pkg").with_app("app", AppInfo::command()).with_hook("install");
        assert_eq!(info.app_security_tag("app").as_str(), "snap.pkg.app");
        assert_eq!(info.hook_security_tag("install").as_str(), "snap.pkg.hook.install");
    }

    #[test]
    fn test_validate_rejects_path_components() {
        let info = SnapInfo::new("pkg").with_app("../etc", AppInfo::command());
        assert!(matches!(
            info.validate(),
            Err(SnapInfoError::InvalidName { kind: "app", .. })
        ));
        assert!(SnapInfo::new("").validate().is_err());
        assert!(SnapInfo::new("-pkg").validate().is_err());
    }
}
