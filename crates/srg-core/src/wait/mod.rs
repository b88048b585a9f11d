//! Waiting for a snap's run inhibition to clear.
//!
//! When a snap is being refreshed, starting one of its apps has to wait until
//! the refresh is done. The coordinator reads the inhibition hint and, if the
//! snap is inhibited, picks exactly one flow for the whole wait:
//! - Graphical: a progress window run by a helper program
//! - Text: a message on the terminal
//! - Headless: silent polling
//!
//! Submodules:
//! - `capabilities`: session probes and flow selection
//! - `helper`: the progress helper process and its guard
//! - `flows`: the polling loops

pub mod capabilities;
pub mod flows;
pub mod helper;

pub use capabilities::{Flow, SessionCapabilities};
pub use flows::{inhibit_message, HELPER_TITLE};
pub use helper::{HelperGuard, HelperLauncher, ProgressHelper, ZenityLauncher};

use crate::inhibit::{HintError, HintSource, InhibitionHint};
use crate::logging::event_names;
use serde::{Deserialize, Serialize};
use srg_config::WaitConfig;
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WaitError {
    #[error(transparent)]
    Hint(#[from] HintError),

    #[error("cannot start {program}: {source}")]
    HelperSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("cannot check progress helper: {0}")]
    Helper(#[source] io::Error),
}

/// How a wait finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WaitOutcome {
    /// The snap was not inhibited to begin with.
    AlreadyClear,
    /// The hint cleared after `polls` re-reads.
    Cleared { flow: Flow, polls: u32 },
    /// The progress helper went away before the hint cleared.
    HelperExited { polls: u32 },
}

/// Timing of the wait loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    pub helper_check_interval: Duration,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self::from(&WaitConfig::default())
    }
}

impl From<&WaitConfig> for WaitOptions {
    fn from(config: &WaitConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            helper_check_interval: config.helper_check_interval(),
        }
    }
}

/// Blocks the caller while a snap is inhibited.
pub struct WaitCoordinator<S, L, W> {
    hints: S,
    launcher: L,
    caps: SessionCapabilities,
    out: W,
    options: WaitOptions,
}

impl<S, L, W> WaitCoordinator<S, L, W>
where
    S: HintSource,
    L: HelperLauncher,
    W: Write,
{
    pub fn new(hints: S, launcher: L, caps: SessionCapabilities, out: W) -> Self {
        Self {
            hints,
            launcher,
            caps,
            out,
            options: WaitOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn capabilities(&self) -> &SessionCapabilities {
        &self.caps
    }

    /// Return once `snap` may be used.
    pub fn wait_while_inhibited(&mut self, snap: &str) -> Result<WaitOutcome, WaitError> {
        let hint = self.hints.current_hint(snap)?;
        if hint == InhibitionHint::NotInhibited {
            info!(event = event_names::WAIT_NOT_INHIBITED, snap, "snap not inhibited");
            return Ok(WaitOutcome::AlreadyClear);
        }

        let flow = Flow::select(&self.caps);
        info!(
            event = event_names::WAIT_FLOW_SELECTED,
            snap,
            %flow,
            hint = hint.reason().unwrap_or_default(),
            "waiting for inhibition to clear"
        );

        let outcome = match flow {
            Flow::Graphical => {
                flows::graphical(&self.hints, &self.launcher, snap, &hint, &self.options)
            }
            Flow::Text => flows::text(&self.hints, &mut self.out, snap, &hint, &self.options),
            Flow::Headless => flows::headless(&self.hints, snap, &self.options),
        }?;

        info!(event = event_names::WAIT_CLEARED, snap, ?outcome, "wait finished");
        Ok(outcome)
    }

    /// Give back the text output sink.
    pub fn into_output(self) -> W {
        self.out
    }
}
