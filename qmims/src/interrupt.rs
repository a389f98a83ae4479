//! Ctrl-C handling while the worker owns the terminal.

use std::process;
use std::thread;

use anyhow::{Context, Result};
use tracing::debug;

use crate::exit_codes;
use crate::io::session::TerminateHandle;
use crate::ui;

/// Register the interrupt handler for one command invocation.
///
/// Call once, right before the blocking `ProcessSession::stop`. The signal is
/// registered before this returns. The first interrupt kills the worker and
/// exits with [`exit_codes::INTERRUPTED`] without waiting for the worker to
/// shut down gracefully.
pub fn install(handle: TerminateHandle) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("build signal runtime")?;
    let listener = {
        let _guard = runtime.enter();
        Listener::register()?
    };

    thread::Builder::new()
        .name("qmims-interrupt".to_string())
        .spawn(move || {
            if !runtime.block_on(listener.recv()) {
                return;
            }
            debug!("interrupt received");
            handle.terminate();
            ui::warn("Interrupted; worker terminated.");
            process::exit(exit_codes::INTERRUPTED);
        })
        .context("spawn interrupt thread")?;
    Ok(())
}

#[cfg(unix)]
struct Listener(tokio::signal::unix::Signal);

#[cfg(unix)]
impl Listener {
    fn register() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        let sigint = signal(SignalKind::interrupt()).context("register SIGINT handler")?;
        Ok(Self(sigint))
    }

    async fn recv(mut self) -> bool {
        self.0.recv().await.is_some()
    }
}

#[cfg(not(unix))]
struct Listener;

#[cfg(not(unix))]
impl Listener {
    fn register() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(self) -> bool {
        match tokio::signal::ctrl_c().await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(%err, "failed to listen for ctrl-c");
                false
            }
        }
    }
}
