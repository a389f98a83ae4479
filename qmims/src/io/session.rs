//! Lifecycle of one external worker invocation.
//!
//! A [`ProcessSession`] lives for a single command:
//!
//! ```text
//! Idle --start()--> Starting --stop()--> Executing --> Completed | Failed
//!   \                  \                     \
//!    `---------------------------------------`--terminate()--> Terminated
//! ```
//!
//! `send_message` only records the prompt. `stop` is the blocking call: it
//! spawns the worker with the caller's terminal attached and waits for it.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::io::config::WorkerConfig;
use crate::io::process::{
    WAIT_POLL_INTERVAL, WaitOutcome, kill_quietly, lock, spawn_inherited, wait_cancellable,
};
use crate::ui;

/// Exit code reported when the worker produced none (spawn failure, signal).
pub const FALLBACK_EXIT_CODE: i32 = 1;

/// Settings fixed when the session is created.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Working directory of the worker (the project being documented).
    pub cwd: PathBuf,
    /// Echo the worker command line before running it.
    pub verbose: bool,
    /// Recorded for diagnostics; the worker's own trust flag lives in [`WorkerConfig`].
    pub auto_approve: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Starting,
    Executing,
    Completed,
    Failed,
    Terminated,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Terminated
        )
    }
}

/// Signals emitted while the worker runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The worker could not run or finished unsuccessfully.
    Error { message: String },
    /// The worker is gone; `code` falls back to [`FALLBACK_EXIT_CODE`].
    Exit { code: i32 },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no prompt was provided to the worker (call send_message before stop)")]
    NoPrompt,
    #[error("worker cannot run from state {0:?}")]
    InvalidState(SessionState),
    #[error("worker failed with exit code {code}: {message}")]
    WorkerFailed { code: i32, message: String },
    #[error("worker was terminated")]
    Terminated,
}

impl SessionError {
    /// Exit code carried by a worker failure.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            SessionError::WorkerFailed { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// State shared with [`TerminateHandle`]s.
struct Shared {
    state: Mutex<SessionState>,
    child: Mutex<Option<std::process::Child>>,
    progress: Mutex<Option<ProgressBar>>,
    cancelled: AtomicBool,
}

impl fmt::Debug for Shared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shared")
            .field("state", &self.state())
            .field("cancelled", &self.cancelled.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl Shared {
    fn state(&self) -> SessionState {
        *lock(&self.state)
    }

    /// Move to `to` if the current state is one of `from`; otherwise report
    /// the state that blocked the move. Check and write happen under one lock.
    fn transition(&self, from: &[SessionState], to: SessionState) -> Result<(), SessionState> {
        let mut state = lock(&self.state);
        if !from.contains(&*state) {
            return Err(*state);
        }
        debug!(from = ?*state, to = ?to, "session state change");
        *state = to;
        Ok(())
    }

    fn stop_progress(&self) {
        if let Some(bar) = lock(&self.progress).take() {
            bar.finish_and_clear();
        }
    }

    fn terminate(&self) {
        {
            let mut state = lock(&self.state);
            if state.is_terminal() {
                return;
            }
            self.cancelled.store(true, Ordering::SeqCst);
            debug!(from = ?*state, "terminating session");
            *state = SessionState::Terminated;
        }
        self.reap_child();
        self.stop_progress();
    }

    /// Kill and reap the child still in the slot, if any.
    ///
    /// The slot stays locked until the child is reaped, so a concurrent `stop`
    /// cannot return while the worker is still alive.
    fn reap_child(&self) {
        let mut slot = lock(&self.child);
        if let Some(child) = slot.take() {
            info!(pid = child.id(), "killing worker");
            kill_quietly(child);
        }
    }
}

/// Cloneable, thread-safe handle that can terminate a running session.
#[derive(Debug, Clone)]
pub struct TerminateHandle {
    shared: Arc<Shared>,
}

impl TerminateHandle {
    /// Kill the worker (if any) and stop the spinner. Safe to call repeatedly.
    pub fn terminate(&self) {
        self.shared.terminate();
    }
}

/// One worker invocation: start signal, prompt handoff, blocking run, cancel.
#[derive(Debug)]
pub struct ProcessSession {
    options: SessionOptions,
    worker: WorkerConfig,
    prompt: Option<String>,
    shared: Arc<Shared>,
    listeners: Vec<Sender<SessionEvent>>,
}

impl ProcessSession {
    pub fn new(options: SessionOptions, worker: WorkerConfig) -> Self {
        Self {
            options,
            worker,
            prompt: None,
            shared: Arc::new(Shared {
                state: Mutex::new(SessionState::Idle),
                child: Mutex::new(None),
                progress: Mutex::new(None),
                cancelled: AtomicBool::new(false),
            }),
            listeners: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Receive [`SessionEvent`]s emitted from now on.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.listeners.push(tx);
        rx
    }

    pub fn terminate_handle(&self) -> TerminateHandle {
        TerminateHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Signal that work is beginning. Shows a spinner; spawns nothing.
    pub fn start(&mut self, message: &str) {
        if let Err(state) = self
            .shared
            .transition(&[SessionState::Idle], SessionState::Starting)
        {
            debug!(state = ?state, "start ignored");
            return;
        }
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        *lock(&self.shared.progress) = Some(bar);
    }

    /// Store the prompt for the next `stop`. The last call wins.
    pub fn send_message(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!(bytes = text.len(), "prompt stored");
        self.prompt = Some(text);
    }

    /// Run the worker with the stored prompt and block until it finishes.
    #[instrument(skip_all, fields(cwd = %self.options.cwd.display()))]
    pub fn stop(&mut self) -> Result<(), SessionError> {
        let Some(prompt) = self.prompt.clone() else {
            return Err(SessionError::NoPrompt);
        };
        self.shared
            .transition(
                &[SessionState::Idle, SessionState::Starting],
                SessionState::Executing,
            )
            .map_err(SessionError::InvalidState)?;

        // The spinner would interleave with the worker's own terminal output.
        self.shared.stop_progress();

        let cmd = self.command(&prompt);
        if self.options.verbose {
            ui::info(&format!(
                "Running {} {} <prompt: {} bytes> in {}",
                self.worker.program,
                self.worker.args.join(" "),
                prompt.len(),
                self.options.cwd.display()
            ));
        }
        info!(
            program = %self.worker.program,
            auto_approve = self.options.auto_approve,
            "starting worker"
        );

        let child = match spawn_inherited(cmd) {
            Ok(child) => child,
            Err(err) => return Err(self.fail(FALLBACK_EXIT_CODE, format!("{err:#}"))),
        };
        {
            let mut slot = lock(&self.shared.child);
            // A terminate request may have landed between the state change and the spawn.
            if self.shared.cancelled.load(Ordering::SeqCst) {
                drop(slot);
                kill_quietly(child);
                return Err(SessionError::Terminated);
            }
            *slot = Some(child);
        }

        match wait_cancellable(&self.shared.child, &self.shared.cancelled, WAIT_POLL_INTERVAL) {
            Ok(WaitOutcome::Cancelled) => {
                self.shared.reap_child();
                Err(SessionError::Terminated)
            }
            Ok(WaitOutcome::Exited(status)) if status.success() => {
                if self
                    .shared
                    .transition(&[SessionState::Executing], SessionState::Completed)
                    .is_err()
                {
                    return Err(SessionError::Terminated);
                }
                self.emit(SessionEvent::Exit { code: 0 });
                info!("worker completed");
                Ok(())
            }
            Ok(WaitOutcome::Exited(status)) => {
                let code = status.code().unwrap_or(FALLBACK_EXIT_CODE);
                Err(self.fail(code, format!("{} exited with {status}", self.worker.program)))
            }
            Err(err) => {
                self.shared.reap_child();
                Err(self.fail(FALLBACK_EXIT_CODE, format!("{err:#}")))
            }
        }
    }

    /// Kill the worker if one is running. A no-op on sessions that never started
    /// or already finished.
    pub fn terminate(&self) {
        self.shared.terminate();
    }

    fn command(&self, prompt: &str) -> Command {
        let mut cmd = Command::new(&self.worker.program);
        cmd.args(&self.worker.args)
            .arg(prompt)
            .current_dir(&self.options.cwd);
        cmd
    }

    fn fail(&mut self, code: i32, message: String) -> SessionError {
        if self
            .shared
            .transition(&[SessionState::Executing], SessionState::Failed)
            .is_err()
        {
            return SessionError::Terminated;
        }
        warn!(code, %message, "worker failed");
        self.emit(SessionEvent::Error {
            message: message.clone(),
        });
        self.emit(SessionEvent::Exit { code });
        SessionError::WorkerFailed { code, message }
    }

    fn emit(&mut self, event: SessionEvent) {
        self.listeners.retain(|tx| tx.send(event.clone()).is_ok());
    }
}
