//! Builder for [`Shim`]
//!
//! Collects interfaces, configuration overrides and observability settings,
//! then wires up the session, runtime client and registry.
//!
//! # Examples
//!
//! ```rust,no_run
//! use hutshim_runner::{from_typed_fn, Context, Interface, Shim};
//! use hutshim_core::ServiceError;
//!
//! # async fn example() -> hutshim_core::Result<()> {
//! let shim = Shim::builder()
//!     .interface(Interface::new("Default").method(
//!         "add",
//!         from_typed_fn(|_ctx: Context, (x, y): (i64, i64)| async move {
//!             Ok::<_, ServiceError>(x + y)
//!         }),
//!     ))
//!     .single_shot()
//!     .with_default_observability()
//!     .build()?;
//!
//! shim.run().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::{RunMode, ShimConfig};
use crate::{Interface, Registry, Shim, ShimMetrics};
use hutshim_client::{ClientMetrics, RuntimeClient, Session};
use hutshim_core::{Error, ObservabilityConfig, Result};
use std::path::PathBuf;
use std::sync::Arc;

/// Builder for constructing a [`Shim`]
pub struct ShimBuilder {
    config: Option<ShimConfig>,
    root_dir: Option<PathBuf>,
    request_file: Option<PathBuf>,
    response_file: Option<PathBuf>,
    sandbox_root: Option<PathBuf>,
    runtime_url: Option<String>,
    run_mode: Option<RunMode>,
    max_requests: Option<u64>,
    handle_signals: Option<bool>,
    registry: Registry,
    observability_config: Option<ObservabilityConfig>,
    service_name: Option<String>,
    metrics: bool,
}

impl ShimBuilder {
    /// Create a builder; unset options come from [`ShimConfig::from_env`]
    pub fn new() -> Self {
        Self {
            config: None,
            root_dir: None,
            request_file: None,
            response_file: None,
            sandbox_root: None,
            runtime_url: None,
            run_mode: None,
            max_requests: None,
            handle_signals: None,
            registry: Registry::new(),
            observability_config: None,
            service_name: None,
            metrics: false,
        }
    }

    /// Start from an explicit configuration instead of the environment
    pub fn config(mut self, config: ShimConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Directory holding the request/response files and sandbox root
    pub fn root_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(dir.into());
        self
    }

    /// Request file name relative to the root directory
    pub fn request_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.request_file = Some(name.into());
        self
    }

    /// Response file name relative to the root directory
    pub fn response_file(mut self, name: impl Into<PathBuf>) -> Self {
        self.response_file = Some(name.into());
        self
    }

    /// Sandbox root relative to the root directory
    pub fn sandbox_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sandbox_root = Some(dir.into());
        self
    }

    /// Platform runtime endpoint
    pub fn runtime_url(mut self, url: impl Into<String>) -> Self {
        self.runtime_url = Some(url.into());
        self
    }

    /// Set the run mode
    pub fn run_mode(mut self, mode: RunMode) -> Self {
        self.run_mode = Some(mode);
        self
    }

    /// Serve exactly one request
    pub fn single_shot(self) -> Self {
        self.run_mode(RunMode::SingleShot)
    }

    /// Loop until end of input, a signal or a fault
    pub fn persistent(self) -> Self {
        self.run_mode(RunMode::Persistent)
    }

    /// Stop the persistent loop after `max` requests
    pub fn max_requests(mut self, max: u64) -> Self {
        self.max_requests = Some(max);
        self
    }

    /// Listen for SIGTERM / Ctrl-C while waiting for a request (default: on)
    pub fn handle_signals(mut self, enable: bool) -> Self {
        self.handle_signals = Some(enable);
        self
    }

    /// Register an interface
    pub fn interface(mut self, interface: Interface) -> Self {
        self.registry.register(interface);
        self
    }

    /// Replace all registered interfaces
    pub fn registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Initialize logging and telemetry with a custom configuration
    pub fn with_observability(mut self, config: ObservabilityConfig) -> Self {
        self.observability_config = Some(config);
        self
    }

    /// Initialize logging with default settings (JSON to stderr, no export)
    pub fn with_default_observability(mut self) -> Self {
        self.observability_config = Some(ObservabilityConfig::default());
        self
    }

    /// Service name for logs and metrics
    pub fn service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = Some(name.into());
        self
    }

    /// Record request loop and outbound call metrics
    pub fn with_metrics(mut self) -> Self {
        self.metrics = true;
        self
    }

    /// Build the shim
    ///
    /// # Errors
    ///
    /// - `Error::Config` for an invalid env override or observability setup
    /// - `Error::Io` when the working directory cannot be determined
    /// - `Error::Transport` when the HTTP client cannot be created
    pub fn build(self) -> Result<Shim> {
        let mut config = match self.config {
            Some(config) => config,
            None => ShimConfig::from_env()?,
        };
        if let Some(dir) = self.root_dir {
            config.root_dir = dir;
        }
        if let Some(name) = self.request_file {
            config.request_file = name;
        }
        if let Some(name) = self.response_file {
            config.response_file = name;
        }
        if let Some(dir) = self.sandbox_root {
            config.sandbox_root = dir;
        }
        if let Some(url) = self.runtime_url {
            config.runtime_url = url;
        }
        if let Some(mode) = self.run_mode {
            config.run_mode = mode;
        }
        if self.max_requests.is_some() {
            config.max_requests = self.max_requests;
        }
        if let Some(enable) = self.handle_signals {
            config.handle_signals = enable;
        }

        let service_name = self
            .service_name
            .clone()
            .or_else(|| self.observability_config.as_ref().map(|c| c.service_name.clone()))
            .unwrap_or_else(|| "hutshim".to_string());

        if let Some(mut obs) = self.observability_config {
            obs.service_name = service_name.clone();
            hutshim_core::init_observability(obs)
                .map_err(|e| Error::Config(format!("failed to initialize observability: {}", e)))?;
        }

        let session = Session::new(config.root_dir.clone());
        let mut client_builder = RuntimeClient::builder(session.clone())
            .endpoint(config.runtime_url.clone());

        let metrics = if self.metrics {
            client_builder =
                client_builder.with_metrics(Arc::new(ClientMetrics::new(service_name.clone())));
            Some(Arc::new(ShimMetrics::new(service_name.clone())))
        } else {
            None
        };
        let client = client_builder.build()?;

        tracing::debug!(
            service = %service_name,
            root_dir = %config.root_dir.display(),
            mode = ?config.run_mode,
            interfaces = self.registry.len(),
            "shim configured"
        );

        Ok(Shim {
            config,
            registry: self.registry,
            session,
            client,
            metrics,
        })
    }
}

impl Default for ShimBuilder {
    fn default() -> Self {
        Self::new()
    }
}
