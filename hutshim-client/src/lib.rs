//! Runtime client for hutshim services
//!
//! Services call back into the platform for things they cannot do from
//! inside their sandbox: storing and fetching files, running commands, and
//! finding out who is calling. This crate provides that client together with
//! the per-process [`Session`] it reads the active `req_id` from.
//!
//! # Core Features
//!
//! - **JSON-RPC 2.0 over HTTP**: One POST per call to the local runtime
//!   endpoint (`http://localhost:4000/jsonrpc` by default)
//! - **Request correlation**: The active `req_id` is always the first
//!   positional parameter
//! - **Monotonic ids**: A process-wide counter that never repeats
//! - **Runtime helpers**: `put_file`, `get_file`, `download_file`,
//!   `run_command`, `get_stackhut_user`, `get_service_author`, `is_author`
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use hutshim_client::{RuntimeClient, Session};
//!
//! # async fn example() -> hutshim_core::Result<()> {
//! let session = Session::from_current_dir()?;
//! let client = RuntimeClient::new(session.clone())?;
//!
//! // The runner does this for you before each request
//! session.begin_request("req-123");
//!
//! let url = client.put_file("thumbnail.png").await?;
//! let author = client.is_author().await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod client_builder;
mod metrics;
mod runtime;
mod session;

pub use client::{RuntimeClient, DEFAULT_RUNTIME_URL};
pub use client_builder::ClientBuilder;
pub use metrics::ClientMetrics;
pub use session::{in_container, Session};
