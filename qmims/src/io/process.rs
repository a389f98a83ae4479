//! Helpers for running a child process attached to the caller's terminal.

use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, error, instrument};
use wait_timeout::ChildExt;

/// How often a blocked wait releases the child so a terminate request can take it.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How a cancellable wait ended.
#[derive(Debug)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    /// The child was taken (and killed) by a terminate request.
    Cancelled,
}

/// Spawn `cmd` with stdin/stdout/stderr inherited from this process.
///
/// Nothing is captured: the child talks to the user's terminal directly.
#[instrument(skip_all)]
pub fn spawn_inherited(mut cmd: Command) -> Result<Child> {
    cmd.stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());

    debug!(program = ?cmd.get_program(), "spawning child process");
    match cmd.spawn() {
        Ok(child) => Ok(child),
        Err(e) => {
            error!(err = %e, "failed to spawn command");
            Err(e).with_context(|| format!("spawn {}", cmd.get_program().to_string_lossy()))
        }
    }
}

/// Block until the child in `slot` exits or `cancelled` is raised.
///
/// The slot lock is held for at most `poll` at a time. Whoever cancels is
/// expected to take the child out of the slot and kill it; an empty slot ends
/// the wait as [`WaitOutcome::Cancelled`].
#[instrument(skip_all, fields(poll_ms = poll.as_millis()))]
pub fn wait_cancellable(
    slot: &Mutex<Option<Child>>,
    cancelled: &AtomicBool,
    poll: Duration,
) -> Result<WaitOutcome> {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            debug!("wait cancelled");
            return Ok(WaitOutcome::Cancelled);
        }
        let mut guard = lock(slot);
        let Some(child) = guard.as_mut() else {
            return Ok(WaitOutcome::Cancelled);
        };
        if let Some(status) = child.wait_timeout(poll).context("wait for command")? {
            guard.take();
            debug!(exit_code = ?status.code(), "command finished");
            return Ok(WaitOutcome::Exited(status));
        }
    }
}

/// Kill and reap a child, ignoring errors from a process that already exited.
pub fn kill_quietly(mut child: Child) {
    if let Err(e) = child.kill() {
        debug!(err = %e, "kill failed (process may have exited)");
    }
    if let Err(e) = child.wait() {
        debug!(err = %e, "reap after kill failed");
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn sh(script: &str) -> Command {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(script);
        cmd
    }

    #[test]
    fn waits_for_exit_status() {
        let child = spawn_inherited(sh("exit 3")).expect("spawn");
        let slot = Mutex::new(Some(child));
        let cancelled = AtomicBool::new(false);

        let outcome = wait_cancellable(&slot, &cancelled, WAIT_POLL_INTERVAL).expect("wait");
        match outcome {
            WaitOutcome::Exited(status) => assert_eq!(status.code(), Some(3)),
            WaitOutcome::Cancelled => panic!("expected exit"),
        }
        assert!(lock(&slot).is_none());
    }

    #[test]
    fn spawn_reports_missing_program() {
        let err = spawn_inherited(Command::new("/nonexistent/qmims-worker")).unwrap_err();
        assert!(err.to_string().contains("spawn /nonexistent/qmims-worker"));
    }

    #[test]
    fn cancel_from_another_thread_ends_wait() {
        let child = spawn_inherited(sh("sleep 30")).expect("spawn");
        let slot = Arc::new(Mutex::new(Some(child)));
        let cancelled = Arc::new(AtomicBool::new(false));

        let canceller = {
            let slot = Arc::clone(&slot);
            let cancelled = Arc::clone(&cancelled);
            thread::spawn(move || {
                thread::sleep(Duration::from_millis(200));
                cancelled.store(true, Ordering::SeqCst);
                if let Some(child) = lock(&slot).take() {
                    kill_quietly(child);
                }
            })
        };

        let started = Instant::now();
        let outcome = wait_cancellable(&slot, &cancelled, WAIT_POLL_INTERVAL).expect("wait");
        canceller.join().expect("join");
        assert!(matches!(outcome, WaitOutcome::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
    }
}
