//! Outbound runtime client
//!
//! [`RuntimeClient`] issues JSON-RPC 2.0 calls to the platform's local
//! runtime endpoint over HTTP POST. Every call:
//!
//! 1. **Prefixes** the arguments with the session's active `req_id`
//! 2. **Locks** the session's id counter, so only one call is ever in flight
//! 3. **Posts** `{method, params, jsonrpc: "2.0", id}` to the endpoint
//! 4. **Resolves** with `result` or rejects with the platform's `error` value
//! 5. **Bumps** the id counter, whatever the outcome
//!
//! There are no retries and no timeouts at this layer; the platform limits
//! the lifetime of the whole process instead.
//!
//! # Cloning
//!
//! `RuntimeClient` is cheaply cloneable. All clones share the HTTP connection
//! pool and the [`Session`].

use crate::session::Session;
use crate::ClientBuilder;
use hutshim_core::{codec, Error, Id, JsonRpcRequest, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

/// Default platform runtime endpoint
pub const DEFAULT_RUNTIME_URL: &str = "http://localhost:4000/jsonrpc";

/// JSON-RPC client for the platform runtime endpoint
#[derive(Clone)]
pub struct RuntimeClient {
    pub(crate) http: reqwest::Client,
    pub(crate) endpoint: Arc<str>,
    pub(crate) session: Session,
    pub(crate) metrics: Option<Arc<crate::ClientMetrics>>,
}

impl RuntimeClient {
    /// Create a client for the default endpoint
    pub fn new(session: Session) -> Result<Self> {
        ClientBuilder::new(session).build()
    }

    /// Start configuring a client
    pub fn builder(session: Session) -> ClientBuilder {
        ClientBuilder::new(session)
    }

    /// Endpoint calls are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Session this client reads `req_id` and `id_val` from
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Call a runtime function and return its raw result
    ///
    /// # Errors
    ///
    /// - `Error::NoActiveRequest` if no request is being served; nothing is
    ///   sent and the id counter is left alone
    /// - `Error::Transport` on connection failure or a non-2xx status
    /// - `Error::Serialization` if the reply body is not JSON
    /// - `Error::Remote` with the platform's `error` value when the reply has
    ///   no `result`
    #[tracing::instrument(skip(self, args), fields(method = %method))]
    pub async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value> {
        let req_id = self.session.req_id().ok_or(Error::NoActiveRequest)?;

        let mut id_val = self.session.lock_id().await;

        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(Value::String(req_id));
        params.extend(args);
        let request = JsonRpcRequest::new(method, params, Id::Number(*id_val));

        let started = Instant::now();
        let outcome = self.send(&request).await;
        *id_val += 1;
        drop(id_val);

        let status = match &outcome {
            Ok(_) => "success",
            Err(Error::Remote(_)) => "rejected",
            Err(_) => "error",
        };
        if let Some(ref metrics) = self.metrics {
            metrics.record_call(method, status, started.elapsed().as_secs_f64());
        }
        match &outcome {
            Ok(_) => tracing::debug!(id = %request.id, "runtime call completed"),
            Err(err) => tracing::warn!(id = %request.id, error = %err, "runtime call failed"),
        }

        outcome
    }

    /// Call a runtime function and decode its result
    pub async fn call_typed<T: DeserializeOwned>(&self, method: &str, args: Vec<Value>) -> Result<T> {
        let value = self.call(method, args).await?;
        serde_json::from_value(value).map_err(|e| Error::Serialization(e.to_string()))
    }

    async fn send(&self, request: &JsonRpcRequest) -> Result<Value> {
        let body = codec::encode_rpc_request(request)?;

        let response = self
            .http
            .post(&*self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport(format!("HTTP status {}", status)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        codec::decode_rpc_response(&text)?
            .into_result()
            .map_err(Error::Remote)
    }
}

impl std::fmt::Debug for RuntimeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeClient")
            .field("endpoint", &self.endpoint)
            .field("session", &self.session)
            .finish()
    }
}
