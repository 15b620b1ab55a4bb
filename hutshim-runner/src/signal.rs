//! Termination signal listener
//!
//! Installed once per run and polled both while waiting for a request and
//! while a method runs. Listening replaces the default SIGTERM and SIGINT
//! disposition for the rest of the process lifetime, so the loop must keep
//! reacting to them. A signal while waiting ends the loop. During dispatch a
//! first signal stops the loop after the request and a second one abandons
//! the method. Code that blocks a thread without yielding is not interrupted;
//! only SIGKILL stops it.

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

pub(crate) struct Signals {
    #[cfg(unix)]
    term: Option<Signal>,
    #[cfg(unix)]
    int: Option<Signal>,
}

impl Signals {
    pub(crate) fn install() -> Self {
        #[cfg(unix)]
        {
            let term = signal(SignalKind::terminate())
                .map_err(|e| tracing::warn!(error = %e, "cannot listen for SIGTERM"))
                .ok();
            let int = signal(SignalKind::interrupt())
                .map_err(|e| tracing::warn!(error = %e, "cannot listen for SIGINT"))
                .ok();
            Self { term, int }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    /// Resolves when SIGTERM or SIGINT is received; never resolves if no
    /// listener could be installed.
    pub(crate) async fn recv(&mut self) {
        #[cfg(unix)]
        {
            tokio::select! {
                Some(()) = recv_opt(&mut self.term) => {}
                Some(()) = recv_opt(&mut self.int) => {}
                else => std::future::pending::<()>().await,
            }
        }
        #[cfg(not(unix))]
        {
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(unix)]
async fn recv_opt(sig: &mut Option<Signal>) -> Option<()> {
    match sig {
        Some(sig) => sig.recv().await,
        None => None,
    }
}
