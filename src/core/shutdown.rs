//! # OS termination signals.
//!
//! [`wait_for_termination`] completes when the process is asked to stop and reports which
//! request arrived. The generator treats every one of them as "begin draining", never as
//! an error.
//!
//! **Unix:** `SIGINT`, `SIGTERM`, `SIGQUIT` (plus [`tokio::signal::ctrl_c`]).
//! **Elsewhere:** Ctrl-C only.

use std::fmt;

/// Termination request observed by [`wait_for_termination`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationSignal {
    /// Ctrl-C / `SIGINT`.
    Interrupt,
    /// `SIGTERM` (systemd, Kubernetes, plain `kill`).
    Terminate,
    /// `SIGQUIT`.
    Quit,
}

impl fmt::Display for TerminationSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminationSignal::Interrupt => "SIGINT",
            TerminationSignal::Terminate => "SIGTERM",
            TerminationSignal::Quit => "SIGQUIT",
        })
    }
}

/// Waits for a termination request.
///
/// Each call installs independent listeners. Fails only if they cannot be registered.
#[cfg(unix)]
pub async fn wait_for_termination() -> std::io::Result<TerminationSignal> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let received = tokio::select! {
        _ = tokio::signal::ctrl_c() => TerminationSignal::Interrupt,
        _ = sigint.recv()  => TerminationSignal::Interrupt,
        _ = sigterm.recv() => TerminationSignal::Terminate,
        _ = sigquit.recv() => TerminationSignal::Quit,
    };
    Ok(received)
}

/// Waits for a termination request.
///
/// Each call installs an independent listener. Fails only if it cannot be registered.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> std::io::Result<TerminationSignal> {
    tokio::signal::ctrl_c().await?;
    Ok(TerminationSignal::Interrupt)
}
