//! Core wire types and codec for hutshim
//!
//! This crate provides the foundational types shared by the shim runner and
//! the runtime client. It includes:
//!
//! - **Types**: The file-based request/response envelopes exchanged with the
//!   orchestrating platform, and the JSON-RPC 2.0 envelopes used for outbound
//!   runtime calls
//! - **Codec**: Reading and writing those envelopes as JSON
//! - **Error handling**: The library `Error`, application-level
//!   `ServiceError`, and the wire error object with its fixed codes
//! - **Observability**: `tracing` subscriber setup with optional OpenTelemetry
//!   export
//!
//! # Overview
//!
//! The platform drops a request file (`{req_id, method, params}`) into the
//! service's working directory and waits for a response file carrying either
//! `{result}` or `{error, msg, data}`. The types here model both sides of that
//! exchange so that the runner and any test harness agree on the exact shape.
//!
//! # Example
//!
//! ```rust
//! use hutshim_core::{codec, ShimRequest, ShimResponse};
//! use serde_json::json;
//!
//! let request = codec::decode_request(
//!     r#"{"req_id":"abc","method":"Default.add","params":[2,3]}"#,
//! ).unwrap();
//! assert_eq!(request.split_method(), ("Default", "add"));
//!
//! let response = ShimResponse::success(json!(5));
//! assert_eq!(codec::encode_response(&response).unwrap(), r#"{"result":5}"#);
//! ```

pub mod codec;
pub mod error;
pub mod observability;
pub mod types;

// Re-export the most commonly used types for convenience
pub use error::{codes, Error, ErrorObject, MethodError, Result, ServiceError};
pub use observability::{init_observability, shutdown_observability, ObservabilityConfig};
pub use types::{Id, JsonRpcRequest, JsonRpcResponse, ShimRequest, ShimResponse};
