//! Method traits and adapters
//!
//! A service method receives the request's positional `params` together with a
//! [`Context`] for the request being served, and resolves to either a JSON
//! value or a [`MethodError`].
//!
//! # Creating Methods
//!
//! 1. **from_fn**: wrap an async closure working on the raw `Vec<Value>`
//! 2. **from_typed_fn**: wrap an async closure taking a tuple of typed
//!    positional arguments; decoding failures become application errors
//! 3. **#[method]**: annotate an ordinary async function (via hutshim-macros)
//!
//! # Examples
//!
//! ```rust
//! use hutshim_runner::{from_fn, from_typed_fn, Context};
//! use hutshim_core::{MethodError, ServiceError};
//! use serde_json::{json, Value};
//!
//! // Raw positional params
//! let echo = from_fn(|_ctx, params: Vec<Value>| async move {
//!     Ok(json!(params))
//! });
//!
//! // Typed positional params: Default.add(x, y)
//! let add = from_typed_fn(|_ctx: Context, (x, y): (i64, i64)| async move {
//!     if x < 0 {
//!         return Err(ServiceError::new("x must be positive"));
//!     }
//!     Ok(x + y)
//! });
//! ```

use hutshim_client::RuntimeClient;
use hutshim_core::{MethodError, ServiceError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Boxed future returned by every method
pub type MethodResult = Pin<Box<dyn Future<Output = Result<Value, MethodError>> + Send>>;

/// Per-request context handed to methods and request hooks
///
/// Carries the active `req_id` and a client for calling back into the
/// platform. Cloning is cheap.
#[derive(Clone, Debug)]
pub struct Context {
    client: RuntimeClient,
    req_id: Arc<str>,
}

impl Context {
    /// Create a context for one request
    pub fn new(client: RuntimeClient, req_id: impl Into<String>) -> Self {
        Self {
            client,
            req_id: Arc::from(req_id.into()),
        }
    }

    /// Id of the request being served
    pub fn req_id(&self) -> &str {
        &self.req_id
    }

    /// Client for platform runtime calls made on behalf of this request
    pub fn client(&self) -> &RuntimeClient {
        &self.client
    }
}

/// A callable service method
///
/// Implemented for you by [`from_fn`], [`from_typed_fn`] and the `#[method]`
/// attribute. Implement it by hand only for methods that need their own state.
pub trait Method: Send + Sync {
    /// Invoke the method with positional parameters
    fn call(&self, ctx: Context, params: Vec<Value>) -> MethodResult;
}

/// Adapter from an async closure to [`Method`]
pub struct AsyncMethod<F, Fut>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
{
    func: F,
}

impl<F, Fut> AsyncMethod<F, Fut>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
{
    /// Wrap `func`
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

impl<F, Fut> Method for AsyncMethod<F, Fut>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
{
    fn call(&self, ctx: Context, params: Vec<Value>) -> MethodResult {
        Box::pin((self.func)(ctx, params))
    }
}

/// Create a method from an async closure over raw JSON params
pub fn from_fn<F, Fut>(func: F) -> Box<dyn Method>
where
    F: Fn(Context, Vec<Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, MethodError>> + Send + 'static,
{
    Box::new(AsyncMethod::new(func))
}

/// Create a method with positional argument decoding
///
/// `P` is normally a tuple, one element per positional parameter. The params
/// array is decoded into `P` as a whole, so a wrong argument count or type is
/// reported as an application error (`-32602`) carrying the decoder's message.
/// An empty params array also decodes into `()`.
///
/// The closure's error type only has to convert into [`MethodError`]:
/// returning a [`ServiceError`] yields an application error, returning a
/// library `hutshim_core::Error` yields a fault.
pub fn from_typed_fn<P, R, E, F, Fut>(func: F) -> Box<dyn Method>
where
    P: DeserializeOwned + Send + 'static,
    R: Serialize + Send + 'static,
    E: Into<MethodError> + Send + 'static,
    F: Fn(Context, P) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
{
    let func = Arc::new(func);

    from_fn(move |ctx, params: Vec<Value>| {
        let func = Arc::clone(&func);
        async move {
            let args: P = decode_params(params)?;
            let result = func(ctx, args).await.map_err(Into::into)?;
            serde_json::to_value(result)
                .map_err(|e| MethodError::fault(format!("cannot serialize result: {}", e)))
        }
    })
}

fn decode_params<P: DeserializeOwned>(params: Vec<Value>) -> Result<P, MethodError> {
    let empty = params.is_empty();
    match serde_json::from_value(Value::Array(params)) {
        Ok(args) => Ok(args),
        Err(e) => {
            // `()` only decodes from null
            if empty {
                if let Ok(args) = serde_json::from_value(Value::Null) {
                    return Ok(args);
                }
            }
            Err(MethodError::Service(ServiceError::new(e.to_string())))
        }
    }
}
