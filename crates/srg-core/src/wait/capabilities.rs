//! Session capability probes and flow selection.

use serde::{Deserialize, Serialize};
use std::io::IsTerminal;

/// What the current session can present to the user.
///
/// Probed once by the caller and passed to the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionCapabilities {
    pub graphical_session: bool,
    pub helper_available: bool,
    pub output_is_interactive: bool,
}

impl SessionCapabilities {
    /// Probe the running process environment.
    pub fn detect(helper_program: &str) -> Self {
        Self {
            graphical_session: graphical_session_from(|key| std::env::var(key).ok()),
            helper_available: which::which(helper_program).is_ok(),
            output_is_interactive: std::io::stdout().is_terminal(),
        }
    }

    pub fn headless() -> Self {
        Self::default()
    }

    pub fn interactive() -> Self {
        Self {
            output_is_interactive: true,
            ..Self::default()
        }
    }

    pub fn graphical() -> Self {
        Self {
            graphical_session: true,
            helper_available: true,
            output_is_interactive: true,
        }
    }
}

/// A display server is reachable through X11 or Wayland.
pub fn graphical_session_from(lookup: impl Fn(&str) -> Option<String>) -> bool {
    ["DISPLAY", "WAYLAND_SOCKET"]
        .iter()
        .any(|key| lookup(key).is_some_and(|value| !value.is_empty()))
}

/// How the wait is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Flow {
    /// Progress window run by the helper program.
    Graphical,
    /// Message on the terminal.
    Text,
    /// Silent polling.
    Headless,
}

impl Flow {
    pub fn select(caps: &SessionCapabilities) -> Self {
        if caps.graphical_session && caps.helper_available {
            Flow::Graphical
        } else if caps.output_is_interactive {
            Flow::Text
        } else {
            Flow::Headless
        }
    }
}

impl std::fmt::Display for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Graphical => write!(f, "graphical"),
            Flow::Text => write!(f, "text"),
            Flow::Headless => write!(f, "headless"),
        }
    }
}
