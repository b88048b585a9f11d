//! The three ways of waiting for an inhibition to clear.
//!
//! All flows re-read the hint once per poll interval and finish as soon as
//! the snap is no longer inhibited. There is no upper bound on the wait.

use super::capabilities::Flow;
use super::helper::{HelperGuard, HelperLauncher};
use super::{WaitError, WaitOptions, WaitOutcome};
use crate::inhibit::{HintSource, InhibitionHint, HINT_REFRESH};
use crate::logging::event_names;
use std::io::Write;
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Title of the progress window.
pub const HELPER_TITLE: &str = "snap package cannot be used";

/// User-facing explanation for an inhibited snap.
pub fn inhibit_message(snap: &str, hint: &InhibitionHint) -> String {
    match hint.reason() {
        Some(HINT_REFRESH) => format!("snap package {snap:?} is being refreshed, please wait"),
        other => format!(
            "snap package cannot be used now: {}",
            other.unwrap_or_default()
        ),
    }
}

/// Read the hint once. `true` when the snap is no longer inhibited.
fn poll_once<S: HintSource>(hints: &S, snap: &str, polls: u32) -> Result<bool, WaitError> {
    let hint = hints.current_hint(snap)?;
    debug!(event = event_names::WAIT_POLL, snap, polls, inhibited = hint.is_inhibited(), "polled hint");
    Ok(!hint.is_inhibited())
}

/// Sleep one interval, re-read the hint, repeat until it clears.
pub(super) fn poll_until_clear<S: HintSource>(
    hints: &S,
    snap: &str,
    options: &WaitOptions,
) -> Result<u32, WaitError> {
    let mut polls = 0u32;
    loop {
        thread::sleep(options.poll_interval);
        polls += 1;
        if poll_once(hints, snap, polls)? {
            return Ok(polls);
        }
    }
}

pub(super) fn headless<S: HintSource>(
    hints: &S,
    snap: &str,
    options: &WaitOptions,
) -> Result<WaitOutcome, WaitError> {
    let polls = poll_until_clear(hints, snap, options)?;
    Ok(WaitOutcome::Cleared {
        flow: Flow::Headless,
        polls,
    })
}

pub(super) fn text<S: HintSource, W: Write>(
    hints: &S,
    out: &mut W,
    snap: &str,
    hint: &InhibitionHint,
    options: &WaitOptions,
) -> Result<WaitOutcome, WaitError> {
    let message = inhibit_message(snap, hint);
    if let Err(err) = writeln!(out, "{message}")
        .and_then(|()| writeln!(out, "please wait..."))
        .and_then(|()| out.flush())
    {
        warn!(snap, error = %err, "cannot write wait message");
    }

    let polls = poll_until_clear(hints, snap, options)?;
    Ok(WaitOutcome::Cleared {
        flow: Flow::Text,
        polls,
    })
}

/// Show the helper window and wait for either the hint to clear or the
/// helper to exit, whichever happens first.
pub(super) fn graphical<S: HintSource, L: HelperLauncher>(
    hints: &S,
    launcher: &L,
    snap: &str,
    hint: &InhibitionHint,
    options: &WaitOptions,
) -> Result<WaitOutcome, WaitError> {
    let message = inhibit_message(snap, hint);
    let helper = launcher
        .launch(HELPER_TITLE, &message)
        .map_err(|source| WaitError::HelperSpawn {
            program: launcher.program().to_string(),
            source,
        })?;
    let mut helper = HelperGuard::new(helper);
    info!(
        event = event_names::WAIT_HELPER_STARTED,
        snap,
        program = launcher.program(),
        pid = helper.id(),
        "progress helper started"
    );

    let mut polls = 0u32;
    let mut next_tick = Instant::now() + options.poll_interval;
    loop {
        if let Some(status) = helper.try_wait().map_err(WaitError::Helper)? {
            if status.success() {
                info!(event = event_names::WAIT_HELPER_EXITED, snap, polls, "progress helper exited");
            } else {
                warn!(event = event_names::WAIT_HELPER_EXITED, snap, polls, %status, "progress helper failed");
            }
            return Ok(WaitOutcome::HelperExited { polls });
        }

        let now = Instant::now();
        if now >= next_tick {
            polls += 1;
            next_tick += options.poll_interval;
            if next_tick <= now {
                next_tick = now + options.poll_interval;
            }
            if poll_once(hints, snap, polls)? {
                return Ok(WaitOutcome::Cleared {
                    flow: Flow::Graphical,
                    polls,
                });
            }
            continue;
        }

        thread::sleep(options.helper_check_interval.min(next_tick - now));
    }
}
