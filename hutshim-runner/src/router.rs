//! Interface registry and request dispatch
//!
//! The [`Registry`] maps interface names to [`Interface`]s and turns one
//! [`ShimRequest`] into one [`ShimResponse`]:
//!
//! 1. Split `method` on the first `.` into interface and method name
//! 2. Unknown interface: `{error: -32601, msg: "Service not found"}`
//! 3. Unknown method: `{error: -32601, msg: "Method not found"}`
//! 4. Run the interface's `preRequest` hook, invoke the method with the
//!    positional params, run `postRequest`
//! 5. Success becomes `{result}`, a [`ServiceError`](hutshim_core::ServiceError)
//!    becomes `{error: -32602, msg, data}`, anything else (a fault, a failing
//!    hook, a panic) becomes `{error: -32000, msg}` and marks the outcome fatal
//!
//! Interfaces keep their registration order, which is the order batch hooks
//! run in.

use crate::handler::Context;
use crate::service::{Hook, Interface};
use futures::FutureExt;
use hutshim_core::{Error, ErrorObject, MethodError, ShimRequest, ShimResponse};
use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// Result of dispatching one request
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// Response to write to the response file
    pub response: ShimResponse,
    /// Whether the request loop must stop after writing the response
    pub fatal: bool,
}

impl DispatchOutcome {
    /// A response that lets the loop continue
    pub fn respond(response: ShimResponse) -> Self {
        Self {
            response,
            fatal: false,
        }
    }

    /// A `-32000` response that ends the loop
    pub fn fault(msg: impl Into<String>) -> Self {
        Self {
            response: ShimResponse::error(ErrorObject::server_error(msg)),
            fatal: true,
        }
    }

    fn from_method_error(err: MethodError) -> Self {
        Self {
            response: ShimResponse::error(err.to_error_object()),
            fatal: err.is_fatal(),
        }
    }
}

/// Registry of service interfaces
#[derive(Clone, Default)]
pub struct Registry {
    interfaces: Arc<Vec<Interface>>,
    index: Arc<HashMap<String, usize>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface, replacing one with the same name in place
    pub fn register(&mut self, interface: Interface) {
        let interfaces = Arc::make_mut(&mut self.interfaces);
        let index = Arc::make_mut(&mut self.index);
        match index.get(interface.name()) {
            Some(&slot) => interfaces[slot] = interface,
            None => {
                index.insert(interface.name().to_string(), interfaces.len());
                interfaces.push(interface);
            }
        }
    }

    /// Look up an interface by name
    pub fn get(&self, name: &str) -> Option<&Interface> {
        self.index.get(name).map(|&slot| &self.interfaces[slot])
    }

    /// Registered interfaces in registration order
    pub fn interfaces(&self) -> impl Iterator<Item = &Interface> {
        self.interfaces.iter()
    }

    /// Number of registered interfaces
    pub fn len(&self) -> usize {
        self.interfaces.len()
    }

    /// Whether no interface is registered
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty()
    }

    /// Dispatch one request
    ///
    /// Never fails: every outcome, including panics in service code, is
    /// normalized into a response.
    #[tracing::instrument(skip(self, request, ctx), fields(req_id = %request.req_id, method = %request.method))]
    pub async fn dispatch(&self, request: &ShimRequest, ctx: Context) -> DispatchOutcome {
        let (iface_name, func_name) = request.split_method();

        let Some(interface) = self.get(iface_name) else {
            tracing::warn!(interface = %iface_name, "service not found");
            return DispatchOutcome::respond(ShimResponse::error(ErrorObject::from(
                &Error::ServiceNotFound(iface_name.to_string()),
            )));
        };

        let Some(method) = interface.get(func_name) else {
            tracing::warn!(interface = %iface_name, func = %func_name, "method not found");
            return DispatchOutcome::respond(ShimResponse::error(ErrorObject::from(
                &Error::MethodNotFound(func_name.to_string()),
            )));
        };

        let hooks = interface.lifecycle();

        let mut outcome = match guarded(hooks.pre_request(&ctx)).await {
            Err(reason) => {
                DispatchOutcome::fault(hook_error(Hook::PreRequest, iface_name, reason).to_string())
            },
            Ok(()) => {
                let params = request.params.clone();
                let call_ctx = ctx.clone();
                match guarded(async move { method.call(call_ctx, params).await }).await {
                    Ok(value) => DispatchOutcome::respond(ShimResponse::success(value)),
                    Err(err) => DispatchOutcome::from_method_error(err),
                }
            }
        };

        if let Err(reason) = guarded(hooks.post_request(&ctx)).await {
            let msg = hook_error(Hook::PostRequest, iface_name, reason).to_string();
            if outcome.fatal {
                tracing::error!(error = %msg, "hook failed after fault");
            } else {
                outcome = DispatchOutcome::fault(msg);
            }
        }

        match &outcome.response {
            ShimResponse::Success { .. } => tracing::debug!("method completed"),
            ShimResponse::Error(err) if outcome.fatal => {
                tracing::error!(code = err.error, error = %err.msg, "method faulted")
            }
            ShimResponse::Error(err) => {
                tracing::info!(code = err.error, error = %err.msg, "method returned error")
            }
        }

        outcome
    }

    /// Run a batch-level hook on every interface in registration order
    ///
    /// Every interface's hook runs even if an earlier one fails; the first
    /// failure is returned.
    pub async fn run_hook(&self, hook: Hook) -> Result<(), Error> {
        let mut first_error = None;

        for interface in self.interfaces() {
            let hooks = interface.lifecycle();
            let result = match hook {
                Hook::PreBatch => guarded(hooks.pre_batch()).await,
                Hook::PostBatch => guarded(hooks.post_batch()).await,
                Hook::Shutdown => guarded(hooks.shutdown()).await,
                Hook::PreRequest | Hook::PostRequest => continue,
            };

            if let Err(reason) = result {
                let err = hook_error(hook, interface.name(), reason);
                tracing::error!(error = %err, "lifecycle hook failed");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.interfaces.iter()).finish()
    }
}

/// Await `fut`, turning a panic into a fault
async fn guarded<T, F>(fut: F) -> Result<T, MethodError>
where
    F: Future<Output = Result<T, MethodError>>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(MethodError::fault(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panic: {}", msg)
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panic: {}", msg)
    } else {
        "panic in service code".to_string()
    }
}

fn hook_error(hook: Hook, interface: &str, reason: MethodError) -> Error {
    let reason = match reason {
        MethodError::Service(err) => err.msg,
        MethodError::Fault(reason) => reason,
    };
    Error::Hook {
        hook: hook.name(),
        interface: interface.to_string(),
        reason,
    }
}
