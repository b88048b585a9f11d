//! Run inhibition hints.
//!
//! While a snap is being refreshed, snapd publishes a hint in
//! `<inhibit_dir>/<snap>.lock`. A missing or empty file means the snap may be
//! used. Otherwise the file content names the reason, `refresh` being the
//! common one.
//!
//! Reading a hint takes a shared lock on the hint file only; it never touches
//! the per-snap lock used by refresh checks.

use crate::lock::flock;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use thiserror::Error;
use tracing::trace;

/// Hint published while a snap is being refreshed.
pub const HINT_REFRESH: &str = "refresh";

/// Current inhibition state of a snap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "hint", rename_all = "snake_case")]
pub enum InhibitionHint {
    NotInhibited,
    Inhibited(String),
}

impl InhibitionHint {
    /// Interpret the raw content of a hint file.
    pub fn from_tag(raw: &str) -> Self {
        let hint = raw.trim();
        if hint.is_empty() {
            InhibitionHint::NotInhibited
        } else {
            InhibitionHint::Inhibited(hint.to_string())
        }
    }

    pub fn is_inhibited(&self) -> bool {
        matches!(self, InhibitionHint::Inhibited(_))
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            InhibitionHint::NotInhibited => None,
            InhibitionHint::Inhibited(hint) => Some(hint),
        }
    }
}

#[derive(Debug, Error)]
pub enum HintError {
    #[error("cannot read inhibition hint {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Source of inhibition hints.
pub trait HintSource {
    fn current_hint(&self, snap: &str) -> Result<InhibitionHint, HintError>;
}

impl<T: HintSource + ?Sized> HintSource for &T {
    fn current_hint(&self, snap: &str) -> Result<InhibitionHint, HintError> {
        (**self).current_hint(snap)
    }
}

/// Hint store kept by snapd under the run directory.
#[derive(Debug, Clone)]
pub struct RunInhibitStore {
    dir: PathBuf,
}

impl RunInhibitStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, snap: &str) -> PathBuf {
        self.dir.join(format!("{snap}.lock"))
    }
}

impl HintSource for RunInhibitStore {
    fn current_hint(&self, snap: &str) -> Result<InhibitionHint, HintError> {
        let path = self.path_for(snap);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(InhibitionHint::NotInhibited)
            }
            Err(source) => return Err(HintError::Io { path, source }),
        };

        let mut raw = String::new();
        let read = flock(&file, libc::LOCK_SH).and_then(|()| file.read_to_string(&mut raw));
        // The shared lock goes away with the descriptor.
        drop(file);
        read.map_err(|source| HintError::Io { path, source })?;

        let hint = InhibitionHint::from_tag(&raw);
        trace!(snap, ?hint, "read inhibition hint");
        Ok(hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tag() {
        assert_eq!(InhibitionHint::from_tag(""), InhibitionHint::NotInhibited);
        assert_eq!(InhibitionHint::from_tag(" \n"), InhibitionHint::NotInhibited);
        assert_eq!(
            InhibitionHint::from_tag("refresh\n"),
            InhibitionHint::Inhibited(HINT_REFRESH.to_string())
        );
    }

    #[test]
    fn test_reason() {
        assert_eq!(InhibitionHint::NotInhibited.reason(), None);
        let hint = InhibitionHint::Inhibited("refresh".to_string());
        assert!(hint.is_inhibited());
        assert_eq!(hint.reason(), Some("refresh"));
    }

    #[test]
    fn test_store_missing_file_not_inhibited() {
        let dir = tempfile::tempdir().unwrap();
        let store = RunInhibitStore::new(dir.path());
        assert_eq!(store.current_hint("pkg").unwrap(), InhibitionHint::NotInhibited);
    }

    #[test]
    fn test_store_reads_hint() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pkg.lock"), "refresh").unwrap();
        std::fs::write(dir.path().join("other.lock"), "").unwrap();
        let store = RunInhibitStore::new(dir.path());

        assert_eq!(
            store.current_hint("pkg").unwrap(),
            InhibitionHint::Inhibited("refresh".to_string())
        );
        assert_eq!(store.current_hint("other").unwrap(), InhibitionHint::NotInhibited);
    }

    #[test]
    fn test_store_read_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("pkg.lock")).unwrap();
        let store = RunInhibitStore::new(dir.path());
        let err = store.current_hint("pkg").unwrap_err();
        assert!(err.to_string().contains("pkg.lock"));
    }

    #[test]
    fn test_serialize_hint() {
        let json = serde_json::to_value(InhibitionHint::Inhibited("refresh".into())).unwrap();
        assert_eq!(json, serde_json::json!({"state": "inhibited", "hint": "refresh"}));
        let json = serde_json::to_value(InhibitionHint::NotInhibited).unwrap();
        assert_eq!(json, serde_json::json!({"state": "not_inhibited"}));
    }
}
