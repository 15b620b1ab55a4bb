//! Service interfaces and lifecycle hooks
//!
//! A service is a set of named [`Interface`]s. Each interface exposes named
//! methods and optionally implements [`Lifecycle`] hooks:
//!
//! - `preRequest` / `postRequest` bracket each request on the interface the
//!   request targets; `postRequest` runs whatever the method's outcome
//! - `preBatch` / `postBatch` bracket a whole run of the request loop
//! - `shutdown` runs once when the process is about to terminate
//!
//! All hooks default to no-ops. A hook that fails (or panics) is a fault.
//!
//! # Examples
//!
//! ```rust
//! use async_trait::async_trait;
//! use hutshim_core::{MethodError, ServiceError};
//! use hutshim_runner::{from_typed_fn, Context, Interface, Lifecycle};
//!
//! struct Counter;
//!
//! #[async_trait]
//! impl Lifecycle for Counter {
//!     async fn pre_batch(&self) -> Result<(), MethodError> {
//!         tracing::info!("warming up");
//!         Ok(())
//!     }
//! }
//!
//! let iface = Interface::new("Default")
//!     .method("add", from_typed_fn(|_ctx: Context, (x, y): (i64, i64)| async move {
//!         Ok::<_, ServiceError>(x + y)
//!     }))
//!     .hooks(Counter);
//!
//! assert!(iface.has_method("add"));
//! ```

use crate::handler::{Context, Method};
use async_trait::async_trait;
use hutshim_core::MethodError;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Lifecycle hooks an interface may implement
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Runs before the target method of each request
    async fn pre_request(&self, _ctx: &Context) -> Result<(), MethodError> {
        Ok(())
    }

    /// Runs after the target method's outcome is known
    async fn post_request(&self, _ctx: &Context) -> Result<(), MethodError> {
        Ok(())
    }

    /// Runs once before the first request of a run
    async fn pre_batch(&self) -> Result<(), MethodError> {
        Ok(())
    }

    /// Runs once after the last request of a run
    async fn post_batch(&self) -> Result<(), MethodError> {
        Ok(())
    }

    /// Runs once when the process is terminating
    async fn shutdown(&self) -> Result<(), MethodError> {
        Ok(())
    }
}

/// Hooks that do nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHooks;

impl Lifecycle for NoHooks {}

/// Lifecycle hook names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    /// Before the target method, on the target interface
    PreRequest,
    /// After the target method's outcome is known
    PostRequest,
    /// Once before the first request of a run
    PreBatch,
    /// Once after the last request of a run
    PostBatch,
    /// Once when the run terminates
    Shutdown,
}

impl Hook {
    /// Name used in logs and fault messages
    pub fn name(&self) -> &'static str {
        match self {
            Hook::PreRequest => "preRequest",
            Hook::PostRequest => "postRequest",
            Hook::PreBatch => "preBatch",
            Hook::PostBatch => "postBatch",
            Hook::Shutdown => "shutdown",
        }
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named group of methods with optional lifecycle hooks
#[derive(Clone)]
pub struct Interface {
    name: String,
    methods: HashMap<String, Arc<dyn Method>>,
    hooks: Arc<dyn Lifecycle>,
}

impl Interface {
    /// Create an interface with no methods and no-op hooks
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: HashMap::new(),
            hooks: Arc::new(NoHooks),
        }
    }

    /// Add a method
    pub fn method(mut self, name: impl Into<String>, method: Box<dyn Method>) -> Self {
        self.register(name, method);
        self
    }

    /// Add a method in place; replaces any method of the same name
    pub fn register(&mut self, name: impl Into<String>, method: Box<dyn Method>) {
        self.methods.insert(name.into(), Arc::from(method));
    }

    /// Set the lifecycle hooks
    pub fn hooks<L: Lifecycle + 'static>(self, hooks: L) -> Self {
        self.shared_hooks(Arc::new(hooks))
    }

    /// Set lifecycle hooks shared with other code
    pub fn shared_hooks(mut self, hooks: Arc<dyn Lifecycle>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method
    pub fn get(&self, method: &str) -> Option<Arc<dyn Method>> {
        self.methods.get(method).cloned()
    }

    /// Whether a method is exposed
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Names of all exposed methods
    pub fn methods(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    pub(crate) fn lifecycle(&self) -> &dyn Lifecycle {
        self.hooks.as_ref()
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods = self.methods();
        methods.sort();
        f.debug_struct("Interface")
            .field("name", &self.name)
            .field("methods", &methods)
            .finish()
    }
}
