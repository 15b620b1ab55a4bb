//! Builder for [`RuntimeClient`]
//!
//! # Examples
//!
//! ```rust
//! use hutshim_client::{ClientBuilder, Session};
//!
//! let client = ClientBuilder::new(Session::new("/srv/service"))
//!     .endpoint("http://127.0.0.1:4000/jsonrpc")
//!     .build()
//!     .unwrap();
//! assert_eq!(client.endpoint(), "http://127.0.0.1:4000/jsonrpc");
//! ```

use crate::{ClientMetrics, RuntimeClient, Session, DEFAULT_RUNTIME_URL};
use hutshim_core::{Error, Result};
use std::sync::Arc;

/// Builder for configuring a runtime client
pub struct ClientBuilder {
    session: Session,
    endpoint: String,
    user_agent: String,
    metrics: Option<Arc<ClientMetrics>>,
}

impl ClientBuilder {
    /// Create a builder using the default endpoint
    pub fn new(session: Session) -> Self {
        Self {
            session,
            endpoint: DEFAULT_RUNTIME_URL.to_string(),
            user_agent: format!("hutshim/{}", env!("CARGO_PKG_VERSION")),
            metrics: None,
        }
    }

    /// Set the runtime endpoint URL
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Set the `User-Agent` header sent with every call
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = agent.into();
        self
    }

    /// Record call metrics
    pub fn with_metrics(mut self, metrics: Arc<ClientMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the HTTP client cannot be constructed.
    pub fn build(self) -> Result<RuntimeClient> {
        let http = reqwest::Client::builder()
            .user_agent(self.user_agent)
            .build()
            .map_err(|e| Error::Transport(format!("failed to create runtime client: {}", e)))?;

        Ok(RuntimeClient {
            http,
            endpoint: Arc::from(self.endpoint),
            session: self.session,
            metrics: self.metrics,
        })
    }
}
