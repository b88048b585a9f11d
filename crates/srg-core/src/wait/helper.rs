//! Graphical progress helper process.
//!
//! The helper shows an indeterminate progress window and never exits on its
//! own, so the waiting side owns its lifetime through [`HelperGuard`].

use crate::logging::event_names;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long an interrupted helper gets to exit before it is killed.
pub const HELPER_GRACE: Duration = Duration::from_millis(500);

const GRACE_POLL: Duration = Duration::from_millis(10);

/// A running progress helper.
pub trait ProgressHelper {
    fn id(&self) -> u32;

    /// Reap the helper if it has exited, without blocking.
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;

    /// Ask the helper to go away (SIGINT).
    fn interrupt(&mut self) -> io::Result<()>;

    /// Force the helper to exit (SIGKILL).
    fn kill(&mut self) -> io::Result<()>;

    /// Block until the helper exits and reap it.
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

impl ProgressHelper for Child {
    fn id(&self) -> u32 {
        Child::id(self)
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Child::try_wait(self)
    }

    fn interrupt(&mut self) -> io::Result<()> {
        let pid = Child::id(self) as libc::pid_t;
        // SAFETY: kill has no memory-safety preconditions.
        let result = unsafe { libc::kill(pid, libc::SIGINT) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn kill(&mut self) -> io::Result<()> {
        Child::kill(self)
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        Child::wait(self)
    }
}

/// Starts progress helpers.
pub trait HelperLauncher {
    type Helper: ProgressHelper;

    /// Program name used in logs and errors.
    fn program(&self) -> &str;

    fn launch(&self, title: &str, text: &str) -> io::Result<Self::Helper>;
}

/// Launches a zenity-compatible progress dialog.
#[derive(Debug, Clone)]
pub struct ZenityLauncher {
    program: String,
}

impl ZenityLauncher {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments for a pulsating progress window without a cancel button.
    pub fn args(title: &str, text: &str) -> Vec<String> {
        vec![
            format!("--title={title}"),
            "--progress".to_string(),
            format!("--text={text}"),
            "--pulsate".to_string(),
            "--no-cancel".to_string(),
        ]
    }
}

impl HelperLauncher for ZenityLauncher {
    type Helper = Child;

    fn program(&self) -> &str {
        &self.program
    }

    fn launch(&self, title: &str, text: &str) -> io::Result<Child> {
        Command::new(&self.program)
            .args(Self::args(title, text))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
    }
}

/// Owns a running helper. On drop, a helper that was not reaped yet is
/// interrupted, given [`HELPER_GRACE`] to exit, then killed and reaped.
#[derive(Debug)]
pub struct HelperGuard<H: ProgressHelper> {
    helper: H,
    reaped: bool,
    grace: Duration,
}

impl<H: ProgressHelper> HelperGuard<H> {
    pub fn new(helper: H) -> Self {
        Self {
            helper,
            reaped: false,
            grace: HELPER_GRACE,
        }
    }

    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    pub fn id(&self) -> u32 {
        self.helper.id()
    }

    /// Check whether the helper has exited.
    ///
    /// Once this returns an exit status the helper is reaped and will not be
    /// signaled again; its PID may already belong to another process.
    pub fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        if self.reaped {
            return Ok(None);
        }
        let status = self.helper.try_wait()?;
        if status.is_some() {
            self.reaped = true;
        }
        Ok(status)
    }

    /// Poll until the helper exits or the grace period runs out.
    fn reap_within_grace(&mut self, pid: u32) -> Option<ExitStatus> {
        let deadline = Instant::now() + self.grace;
        loop {
            match self.helper.try_wait() {
                Ok(Some(status)) => return Some(status),
                Ok(None) if Instant::now() < deadline => thread::sleep(GRACE_POLL),
                Ok(None) => return None,
                Err(err) => {
                    warn!(pid, error = %err, "cannot check helper status");
                    return None;
                }
            }
        }
    }
}

impl<H: ProgressHelper> Drop for HelperGuard<H> {
    fn drop(&mut self) {
        if self.reaped {
            return;
        }
        self.reaped = true;
        let pid = self.helper.id();
        if let Err(err) = self.helper.interrupt() {
            debug!(pid, error = %err, "cannot interrupt helper");
        }
        if let Some(status) = self.reap_within_grace(pid) {
            debug!(event = event_names::WAIT_HELPER_STOPPED, pid, %status, "helper stopped");
            return;
        }

        warn!(pid, grace_ms = self.grace.as_millis() as u64, "helper ignored SIGINT, sending SIGKILL");
        if let Err(err) = self.helper.kill() {
            warn!(pid, error = %err, "cannot kill helper");
        }
        match self.helper.wait() {
            Ok(status) => {
                debug!(event = event_names::WAIT_HELPER_STOPPED, pid, %status, "helper killed")
            }
            Err(err) => warn!(pid, error = %err, "cannot reap helper"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zenity_args() {
        let args = ZenityLauncher::args("snap package cannot be used", "please wait");
        assert_eq!(
            args,
            vec![
                "--title=snap package cannot be used",
                "--progress",
                "--text=please wait",
                "--pulsate",
                "--no-cancel",
            ]
        );
    }

    #[test]
    fn test_guard_interrupts_running_child() {
        let child = Command::new("sleep")
            .arg("30")
            .stdin(Stdio::null())
            .spawn()
            .expect("spawn sleep");
        let start = std::time::Instant::now();
        let mut guard = HelperGuard::new(child);
        assert!(guard.try_wait().unwrap().is_none());
        drop(guard);
        assert!(start.elapsed() < std::time::Duration::from_secs(10));
    }

    #[test]
    fn test_guard_skips_reaped_child() {
        let child = Command::new("true").spawn().expect("spawn true");
        let mut guard = HelperGuard::new(child);
        let mut status = None;
        for _ in 0..200 {
            status = guard.try_wait().unwrap();
            if status.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(10));
        }
        assert!(status.is_some_and(|s| s.success()));
        // Already reaped: no further status and no signal on drop.
        assert!(guard.try_wait().unwrap().is_none());
    }

    #[test]
    fn test_guard_kills_child_ignoring_sigint() {
        let child = Command::new("sh")
            .args(["-c", "trap '' INT; sleep 30"])
            .stdin(Stdio::null())
            .spawn()
            .expect("spawn sh");
        // Let the shell install its trap before the guard interrupts it.
        std::thread::sleep(Duration::from_millis(200));
        let guard = HelperGuard::new(child).with_grace(Duration::from_millis(100));
        let start = Instant::now();
        drop(guard);
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    /// Helper that ignores SIGINT and only exits when killed.
    #[derive(Default)]
    struct StubbornHelper {
        interrupts: usize,
        kills: usize,
        waits: usize,
    }

    impl ProgressHelper for &mut StubbornHelper {
        fn id(&self) -> u32 {
            4242
        }

        fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
            Ok(None)
        }

        fn interrupt(&mut self) -> io::Result<()> {
            self.interrupts += 1;
            Ok(())
        }

        fn kill(&mut self) -> io::Result<()> {
            self.kills += 1;
            Ok(())
        }

        fn wait(&mut self) -> io::Result<ExitStatus> {
            use std::os::unix::process::ExitStatusExt;
            self.waits += 1;
            Ok(ExitStatus::from_raw(9))
        }
    }

    #[test]
    fn test_guard_escalates_after_grace() {
        let mut helper = StubbornHelper::default();
        drop(HelperGuard::new(&mut helper).with_grace(Duration::from_millis(30)));
        assert_eq!(helper.interrupts, 1);
        assert_eq!(helper.kills, 1);
        assert_eq!(helper.waits, 1);
    }

    #[test]
    fn test_launch_missing_program_fails() {
        let launcher = ZenityLauncher::new("/nonexistent/srg-progress-helper");
        assert!(launcher.launch("title", "text").is_err());
    }
}
