//! Request loop and dispatcher for hutshim services
//!
//! This crate turns a set of service [`Interface`]s into a process the
//! platform can invoke through files:
//!
//! 1. **Read** the request file (`req.json`) from the root directory
//! 2. **Enter** the request's sandbox directory (`.stackhut/<req_id>`)
//! 3. **Dispatch** `Interface.method` with the positional params
//! 4. **Restore** the root directory and **write** the response file
//!    (`resp.json`) with a single open/write/close, so it may be a FIFO
//! 5. **Loop** for the next request, or stop
//!
//! # Run Modes
//!
//! - **Persistent** (default): keeps serving requests from the same files
//!   until the request read comes back empty, a termination signal arrives,
//!   a fault occurs or `max_requests` is reached. `preBatch` runs once before
//!   the first request and `postBatch` once after the last.
//! - **SingleShot**: serves one request. The batch hooks still bracket it.
//!   An empty request file is invalid here and gets a `-32000` response.
//!
//! A fault (`-32000`) always ends the run once its response has been written;
//! `postBatch` is skipped but `shutdown` still runs. Panics count as faults
//! wherever they happen in the process, including tasks and threads spawned
//! by service code.
//!
//! # Signals
//!
//! With signal handling on, SIGTERM or SIGINT while waiting for a request
//! ends the loop cleanly. During a dispatch, the first signal lets the
//! request finish and stops the loop afterwards; a second one abandons the
//! method and answers `-32000`. A method that blocks its thread without
//! yielding cannot be abandoned this way.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hutshim_runner::{from_typed_fn, Context, Interface, Shim};
//! use hutshim_core::ServiceError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let shim = Shim::builder()
//!         .interface(Interface::new("Default").method(
//!             "add",
//!             from_typed_fn(|_ctx: Context, (x, y): (i64, i64)| async move {
//!                 Ok::<_, ServiceError>(x + y)
//!             }),
//!         ))
//!         .with_default_observability()
//!         .build()?;
//!
//!     let summary = shim.run().await?;
//!     tracing::info!(served = summary.served, "done");
//!     Ok(())
//! }
//! ```

mod builder;
mod config;
mod fault;
mod handler;
mod metrics;
mod router;
mod service;
mod signal;

pub use builder::ShimBuilder;
pub use config::{RunMode, ShimConfig, ENV_RUNTIME_URL, ENV_RUN_MODE};
pub use handler::{from_fn, from_typed_fn, AsyncMethod, Context, Method, MethodResult};
pub use metrics::ShimMetrics;
pub use router::{DispatchOutcome, Registry};
pub use service::{Hook, Interface, Lifecycle, NoHooks};

use hutshim_client::{RuntimeClient, Session};
use hutshim_core::{codec, Error, ErrorObject, Result, ShimRequest, ShimResponse};
use fault::FaultWatch;
use signal::Signals;
use std::sync::Arc;
use std::time::Instant;

/// Why a run of the request loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    /// Single-shot run served its request
    Completed,
    /// The request read came back empty
    EndOfInput,
    /// `max_requests` requests were served
    LimitReached,
    /// SIGTERM or SIGINT stopped the loop between requests
    Signal,
    /// A fault stopped the loop; a `-32000` response was attempted
    Fault(String),
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of requests a response was produced for
    pub served: u64,
    /// Why the loop stopped
    pub end: RunEnd,
}

impl RunSummary {
    /// Whether the run ended on a fault
    pub fn is_fault(&self) -> bool {
        matches!(self.end, RunEnd::Fault(_))
    }
}

enum Awaited {
    Request(ShimRequest),
    EndOfInput,
    Signal,
    Invalid(Error),
}

/// A configured service process
///
/// Created with [`Shim::builder`]. Owns the session shared with the runtime
/// client, so outbound calls made by methods carry the active `req_id`.
pub struct Shim {
    pub(crate) config: ShimConfig,
    pub(crate) registry: Registry,
    pub(crate) session: Session,
    pub(crate) client: RuntimeClient,
    pub(crate) metrics: Option<Arc<ShimMetrics>>,
}

impl Shim {
    /// Create a builder
    pub fn builder() -> ShimBuilder {
        ShimBuilder::new()
    }

    /// Effective configuration
    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    /// Registered interfaces
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Session shared with the runtime client
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Runtime client handed to methods through [`Context`]
    pub fn client(&self) -> &RuntimeClient {
        &self.client
    }

    /// Dispatch one request with its `req_id` active
    ///
    /// Does not touch the working directory or any file; [`Shim::run`] does
    /// that around this.
    pub async fn dispatch(&self, request: &ShimRequest) -> DispatchOutcome {
        self.session.begin_request(request.req_id.as_str());
        let ctx = Context::new(self.client.clone(), request.req_id.as_str());
        let outcome = self.registry.dispatch(request, ctx).await;
        self.session.end_request();
        outcome
    }

    /// Run the request loop
    ///
    /// Handled errors and faults are reported through the response file and
    /// the returned [`RunSummary`]; the process should exit with status 0.
    ///
    /// # Errors
    ///
    /// `Error::Io` if the root directory does not exist.
    pub async fn run(&self) -> Result<RunSummary> {
        let root = &self.config.root_dir;
        if !root.is_dir() {
            return Err(Error::Io(format!(
                "root directory {} does not exist",
                root.display()
            )));
        }

        tracing::info!(
            root_dir = %root.display(),
            mode = ?self.config.run_mode,
            interfaces = self.registry.len(),
            "request loop starting"
        );

        let mut signals = self.config.handle_signals.then(Signals::install);
        let watch = FaultWatch::install();

        if let Err(err) = self.registry.run_hook(Hook::PreBatch).await {
            self.record_hook_failure(&err);
            let msg = err.to_string();
            self.write_best_effort(&msg).await;
            self.finish(false).await;
            return Ok(RunSummary {
                served: 0,
                end: RunEnd::Fault(msg),
            });
        }

        let mut served = 0u64;
        let end = loop {
            if self.config.run_mode == RunMode::Persistent {
                if let Some(max) = self.config.max_requests {
                    if served >= max {
                        break RunEnd::LimitReached;
                    }
                }
            }

            let request = match self.await_request(signals.as_mut()).await {
                Awaited::Request(request) => request,
                Awaited::EndOfInput => {
                    tracing::info!("request input closed");
                    break RunEnd::EndOfInput;
                }
                Awaited::Signal => {
                    tracing::info!("termination signal received");
                    break RunEnd::Signal;
                }
                Awaited::Invalid(err) => {
                    let msg = err.to_string();
                    tracing::error!(error = %msg, "cannot read request");
                    self.write_best_effort(&msg).await;
                    break RunEnd::Fault(msg);
                }
            };

            let result = self.serve(&request, signals.as_mut(), &watch).await;
            served += 1;

            match result {
                Err(msg) => break RunEnd::Fault(msg),
                Ok(true) => {
                    tracing::info!("stopping after termination signal");
                    break RunEnd::Signal;
                }
                Ok(false) => {}
            }
            if self.config.run_mode == RunMode::SingleShot {
                break RunEnd::Completed;
            }
        };

        let faulted = matches!(end, RunEnd::Fault(_));
        self.finish(!faulted).await;

        tracing::info!(served, end = ?end, "request loop finished");
        Ok(RunSummary { served, end })
    }

    async fn await_request(&self, signals: Option<&mut Signals>) -> Awaited {
        let path = self.config.request_path();
        let read = codec::read_request_file(&path);

        let result = match signals {
            Some(signals) => tokio::select! {
                result = read => result,
                () = signals.recv() => return Awaited::Signal,
            },
            None => read.await,
        };

        match result {
            Ok(Some(request)) => Awaited::Request(request),
            Ok(None) if self.config.run_mode == RunMode::SingleShot => {
                Awaited::Invalid(Error::InvalidRequest("empty request file".to_string()))
            }
            Ok(None) => Awaited::EndOfInput,
            Err(err) => Awaited::Invalid(err),
        }
    }

    /// Serve one request
    ///
    /// `Ok(true)` asks the loop to stop after this request; `Err` carries the
    /// fault that ends the loop.
    async fn serve(
        &self,
        request: &ShimRequest,
        signals: Option<&mut Signals>,
        watch: &FaultWatch,
    ) -> std::result::Result<bool, String> {
        let started = Instant::now();
        let mut stop = false;

        let outcome = if let Some(msg) = watch.take() {
            tracing::error!(req_id = %request.req_id, error = %msg, "panic before dispatch");
            DispatchOutcome::fault(msg)
        } else {
            let outcome = match signals {
                Some(signals) => self.dispatch_until_interrupted(request, signals, &mut stop).await,
                None => self.dispatch_in_sandbox(request).await,
            };
            match watch.take() {
                Some(msg) if !outcome.fatal => {
                    tracing::error!(req_id = %request.req_id, error = %msg, "panic during dispatch");
                    DispatchOutcome::fault(msg)
                }
                _ => outcome,
            }
        };

        if let Some(ref metrics) = self.metrics {
            let status = match outcome.response.error_object() {
                None => "success",
                Some(_) if outcome.fatal => "fault",
                Some(_) => "error",
            };
            metrics.record_request(&request.method, status, started.elapsed().as_secs_f64());
            if let Some(err) = outcome.response.error_object() {
                metrics.record_error(err.error);
            }
        }

        if let Err(err) = self.write_response(outcome.response.clone()).await {
            tracing::error!(req_id = %request.req_id, error = %err, "cannot write response");
            return Err(format!("cannot write response: {}", err));
        }
        tracing::debug!(req_id = %request.req_id, "response written");

        match outcome.response {
            ShimResponse::Error(err) if outcome.fatal => Err(err.msg),
            _ => Ok(stop),
        }
    }

    /// Dispatch while listening for termination signals
    ///
    /// A first signal sets `stop` and lets the method finish. A second one
    /// drops the method's future and returns a fault.
    async fn dispatch_until_interrupted(
        &self,
        request: &ShimRequest,
        signals: &mut Signals,
        stop: &mut bool,
    ) -> DispatchOutcome {
        let finished = {
            let dispatch = self.dispatch_in_sandbox(request);
            tokio::pin!(dispatch);
            loop {
                tokio::select! {
                    outcome = &mut dispatch => break Some(outcome),
                    () = signals.recv() => {
                        if *stop {
                            break None;
                        }
                        tracing::warn!(req_id = %request.req_id, "termination requested, finishing current request");
                        *stop = true;
                    }
                }
            }
        };

        if let Some(outcome) = finished {
            return outcome;
        }

        tracing::error!(req_id = %request.req_id, "method abandoned after second termination signal");
        self.session.end_request();
        if let Err(e) = std::env::set_current_dir(&self.config.root_dir) {
            tracing::error!(error = %e, "working directory not restored");
        }
        DispatchOutcome::fault("interrupted by termination signal")
    }

    /// Dispatch inside the request's sandbox, always returning to the root
    async fn dispatch_in_sandbox(&self, request: &ShimRequest) -> DispatchOutcome {
        let sandbox = match self.config.sandbox_dir(&request.req_id) {
            Ok(sandbox) => sandbox,
            Err(err) => return DispatchOutcome::fault(err.to_string()),
        };

        if let Err(e) = std::env::set_current_dir(&sandbox) {
            let msg = format!("cannot enter sandbox {}: {}", sandbox.display(), e);
            tracing::error!(req_id = %request.req_id, error = %msg, "sandbox unavailable");
            return DispatchOutcome::fault(msg);
        }

        let outcome = self.dispatch(request).await;

        match std::env::set_current_dir(&self.config.root_dir) {
            Ok(()) => outcome,
            Err(e) => {
                let msg = format!(
                    "cannot return to root {}: {}",
                    self.config.root_dir.display(),
                    e
                );
                tracing::error!(error = %msg, "working directory not restored");
                if outcome.fatal {
                    outcome
                } else {
                    DispatchOutcome::fault(msg)
                }
            }
        }
    }

    async fn write_response(&self, response: ShimResponse) -> Result<()> {
        let path = self.config.response_path();
        // Opening a FIFO for writing blocks until the platform opens it for reading
        tokio::task::spawn_blocking(move || codec::write_response_file(&path, &response))
            .await
            .map_err(|e| Error::Fault(format!("response writer failed: {}", e)))?
    }

    async fn write_best_effort(&self, msg: &str) {
        let response = ShimResponse::error(ErrorObject::server_error(msg));
        if let Err(err) = self.write_response(response).await {
            tracing::error!(error = %err, "cannot write fault response");
        }
    }

    /// Run batch-end hooks, then shutdown hooks
    async fn finish(&self, post_batch: bool) {
        if post_batch {
            if let Err(err) = self.registry.run_hook(Hook::PostBatch).await {
                self.record_hook_failure(&err);
            }
        }
        if let Err(err) = self.registry.run_hook(Hook::Shutdown).await {
            self.record_hook_failure(&err);
        }
    }

    fn record_hook_failure(&self, err: &Error) {
        if let (Some(metrics), Error::Hook { hook, .. }) = (&self.metrics, err) {
            metrics.record_hook_failure(*hook);
        }
    }
}

impl std::fmt::Debug for Shim {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shim")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
