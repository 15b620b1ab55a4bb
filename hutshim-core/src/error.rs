//! Error types for hutshim
//!
//! This module separates errors into the three tiers the platform understands:
//!
//! - **Routing errors**: the interface or method named by a request does not
//!   exist. Detected locally before anything is invoked. Code `-32601`.
//! - **Application errors**: raised on purpose by service code through
//!   [`ServiceError`], carrying a message and optional structured data.
//!   Code `-32602`.
//! - **Faults**: anything else (I/O failures, outbound call failures that a
//!   method did not handle, panics). Code `-32000`. A fault ends the run after
//!   a best-effort response write.
//!
//! Internally the crates use [`Error`] (via `thiserror`) and [`MethodError`];
//! both convert into the wire-format [`ErrorObject`] written to the response
//! file.
//!
//! # Examples
//!
//! ```rust
//! use hutshim_core::{codes, ErrorObject, ServiceError};
//! use serde_json::json;
//!
//! let plain = ErrorObject::application(ServiceError::new("bad input"));
//! assert_eq!(plain.error, codes::APPLICATION_ERROR);
//! assert_eq!(plain.data, json!({}));
//!
//! let detailed = ErrorObject::application(ServiceError::from_payload(
//!     json!(["bad input", {"field": "x"}]),
//! ));
//! assert_eq!(detailed.data, json!({"field": "x"}));
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Result type for hutshim operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error codes written to the `error` field of a response file
///
/// These deliberately reuse JSON-RPC 2.0 reserved codes: `-32601` (method not
/// found), `-32602` (invalid params) and `-32000` (start of the server error
/// band). No other codes are produced by the shim.
pub mod codes {
    /// Unknown interface or unknown method on a known interface
    pub const NOT_FOUND: i32 = -32601;
    /// Error raised deliberately by service code
    pub const APPLICATION_ERROR: i32 = -32602;
    /// Catch-all for faults the service did not handle
    pub const SERVER_ERROR: i32 = -32000;
}

/// Library-level error type for hutshim operations
///
/// Variants carry owned strings rather than source errors so the type stays
/// `Clone` and can be recorded, logged and converted into a wire error more
/// than once.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Serialization or deserialization error
    ///
    /// Raised when a request file, response body or outbound reply is not the
    /// JSON shape we expect.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Filesystem error
    ///
    /// Reading the request file, writing the response file, or moving between
    /// the root and sandbox directories.
    #[error("IO error: {0}")]
    Io(String),

    /// Outbound HTTP call failed before a JSON-RPC reply was obtained
    ///
    /// Covers connection failures and non-2xx statuses. Never retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The platform answered an outbound call with an error object
    ///
    /// The platform's `error` value is kept exactly as received.
    #[error("Runtime call rejected: {0}")]
    Remote(Value),

    /// An outbound call was attempted with no request being served
    #[error("No active request: outbound calls require a req_id")]
    NoActiveRequest,

    /// Invalid runner or client configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request file did not contain a usable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The interface named by the request is not registered
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The interface exists but does not expose the named method
    #[error("Method not found: {0}")]
    MethodNotFound(String),

    /// A lifecycle hook failed
    #[error("Hook {hook} failed on {interface}: {reason}")]
    Hook {
        /// Wire name of the hook (`preRequest`, `shutdown`, ...)
        hook: &'static str,
        /// Interface the hook belongs to
        interface: String,
        /// Description of the failure
        reason: String,
    },

    /// Unhandled failure inside service code or the request loop
    #[error("{0}")]
    Fault(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Error raised deliberately by a service method
///
/// A plain message becomes `{error: -32602, msg}`; a message with data becomes
/// `{error: -32602, msg, data}`.
///
/// # Examples
///
/// ```rust
/// use hutshim_core::ServiceError;
/// use serde_json::json;
///
/// let err: ServiceError = "bad input".into();
/// assert_eq!(err.msg, "bad input");
/// assert!(err.data.is_none());
///
/// let err = ServiceError::with_data("bad input", json!({"field": "x"}));
/// assert_eq!(err.data, Some(json!({"field": "x"})));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    /// Human-readable message sent to the platform
    pub msg: String,
    /// Optional structured detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ServiceError {
    /// Create an application error with only a message
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            data: None,
        }
    }

    /// Create an application error with a message and structured data
    pub fn with_data(msg: impl Into<String>, data: Value) -> Self {
        Self {
            msg: msg.into(),
            data: Some(data),
        }
    }

    /// Build an application error from a raw failure payload
    ///
    /// Accepts the two payload shapes services use to signal errors:
    ///
    /// - a string: `"bad input"`
    /// - a two-element array: `["bad input", {"field": "x"}]`
    ///
    /// Any other value is rendered as its JSON text and used as the message.
    pub fn from_payload(payload: Value) -> Self {
        match payload {
            Value::String(msg) => Self::new(msg),
            Value::Array(mut items) if !items.is_empty() && items.len() <= 2 => {
                let data = if items.len() == 2 { items.pop() } else { None };
                let msg = match items.pop() {
                    Some(Value::String(s)) => s,
                    Some(other) => other.to_string(),
                    None => String::new(),
                };
                Self { msg, data }
            }
            other => Self::new(other.to_string()),
        }
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.msg)
    }
}

impl std::error::Error for ServiceError {}

impl From<&str> for ServiceError {
    fn from(msg: &str) -> Self {
        Self::new(msg)
    }
}

impl From<String> for ServiceError {
    fn from(msg: String) -> Self {
        Self::new(msg)
    }
}

impl<S: Into<String>> From<(S, Value)> for ServiceError {
    fn from((msg, data): (S, Value)) -> Self {
        Self::with_data(msg, data)
    }
}

/// Outcome of a failed method invocation
///
/// Methods return `Result<T, MethodError>`. `ServiceError` converts into the
/// `Service` variant; any library [`Error`] propagated with `?` becomes a
/// `Fault`, which ends the run once the response has been written.
#[derive(Debug, Clone, PartialEq)]
pub enum MethodError {
    /// Application error, reported with code `-32602`
    Service(ServiceError),
    /// Unhandled failure, reported with code `-32000`
    Fault(String),
}

impl MethodError {
    /// Create a fault from any description
    pub fn fault(reason: impl Into<String>) -> Self {
        MethodError::Fault(reason.into())
    }

    /// Whether this failure must stop the request loop
    pub fn is_fatal(&self) -> bool {
        matches!(self, MethodError::Fault(_))
    }

    /// Convert into the wire error written to the response file
    pub fn to_error_object(&self) -> ErrorObject {
        match self {
            MethodError::Service(err) => ErrorObject::application(err.clone()),
            MethodError::Fault(reason) => ErrorObject::server_error(reason.clone()),
        }
    }
}

impl std::fmt::Display for MethodError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MethodError::Service(err) => write!(f, "service error: {}", err),
            MethodError::Fault(reason) => write!(f, "fault: {}", reason),
        }
    }
}

impl std::error::Error for MethodError {}

impl From<ServiceError> for MethodError {
    fn from(err: ServiceError) -> Self {
        MethodError::Service(err)
    }
}

impl From<Error> for MethodError {
    fn from(err: Error) -> Self {
        MethodError::Fault(err.to_string())
    }
}

impl From<std::io::Error> for MethodError {
    fn from(err: std::io::Error) -> Self {
        MethodError::Fault(err.to_string())
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

/// Wire-format error written to the response file
///
/// Always serialized with all three fields. Responses from platforms that omit
/// `data` are accepted and `data` defaults to an empty object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    /// One of the values in [`codes`]
    pub error: i32,
    /// Human-readable message
    pub msg: String,
    /// Structured detail, `{}` when there is none
    #[serde(default = "empty_object")]
    pub data: Value,
}

impl ErrorObject {
    /// Create an error object with an empty `data` object
    pub fn new(code: i32, msg: impl Into<String>) -> Self {
        Self {
            error: code,
            msg: msg.into(),
            data: empty_object(),
        }
    }

    /// Create an error object carrying structured data
    pub fn with_data(code: i32, msg: impl Into<String>, data: Value) -> Self {
        Self {
            error: code,
            msg: msg.into(),
            data,
        }
    }

    /// `{error: -32601, msg: "Service not found"}`
    pub fn service_not_found() -> Self {
        Self::new(codes::NOT_FOUND, "Service not found")
    }

    /// `{error: -32601, msg: "Method not found"}`
    pub fn method_not_found() -> Self {
        Self::new(codes::NOT_FOUND, "Method not found")
    }

    /// Application error raised by service code (`-32602`)
    pub fn application(err: ServiceError) -> Self {
        match err.data {
            Some(data) => Self::with_data(codes::APPLICATION_ERROR, err.msg, data),
            None => Self::new(codes::APPLICATION_ERROR, err.msg),
        }
    }

    /// Catch-all server error (`-32000`)
    pub fn server_error(msg: impl Into<String>) -> Self {
        Self::new(codes::SERVER_ERROR, msg)
    }
}

impl From<&Error> for ErrorObject {
    fn from(err: &Error) -> Self {
        match err {
            Error::ServiceNotFound(_) => ErrorObject::service_not_found(),
            Error::MethodNotFound(_) => ErrorObject::method_not_found(),
            other => ErrorObject::server_error(other.to_string()),
        }
    }
}

impl std::fmt::Display for ErrorObject {
    /// Formats as "[code] msg", e.g. "[-32601] Method not found"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.error, self.msg)
    }
}

impl std::error::Error for ErrorObject {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_routing_errors_share_code() {
        let service = ErrorObject::service_not_found();
        let method = ErrorObject::method_not_found();

        assert_eq!(service.error, -32601);
        assert_eq!(method.error, -32601);
        assert_eq!(service.msg, "Service not found");
        assert_eq!(method.msg, "Method not found");
    }

    #[test]
    fn test_plain_string_payload() {
        let err = ServiceError::from_payload(json!("bad input"));
        assert_eq!(err, ServiceError::new("bad input"));

        let obj = ErrorObject::application(err);
        assert_eq!(obj.error, -32602);
        assert_eq!(obj.msg, "bad input");
        assert_eq!(obj.data, json!({}));
    }

    #[test]
    fn test_message_and_data_payload() {
        let err = ServiceError::from_payload(json!(["bad input", {"field": "x"}]));
        assert_eq!(err.msg, "bad input");
        assert_eq!(err.data, Some(json!({"field": "x"})));

        let obj = ErrorObject::application(err);
        assert_eq!(
            serde_json::to_value(&obj).unwrap(),
            json!({"error": -32602, "msg": "bad input", "data": {"field": "x"}})
        );
    }

    #[test]
    fn test_single_element_payload_has_no_data() {
        let err = ServiceError::from_payload(json!(["only message"]));
        assert_eq!(err, ServiceError::new("only message"));
    }

    #[test]
    fn test_unexpected_payload_uses_json_text() {
        let err = ServiceError::from_payload(json!({"weird": true}));
        assert_eq!(err.msg, r#"{"weird":true}"#);
        assert!(err.data.is_none());
    }

    #[test]
    fn test_tuple_conversion() {
        let err: ServiceError = ("bad input", json!({"field": "x"})).into();
        assert_eq!(err.data, Some(json!({"field": "x"})));
    }

    #[test]
    fn test_library_error_becomes_fault() {
        let err: MethodError = Error::Transport("connection refused".into()).into();
        assert!(err.is_fatal());

        let obj = err.to_error_object();
        assert_eq!(obj.error, -32000);
        assert!(obj.msg.contains("connection refused"));
    }

    #[test]
    fn test_service_error_is_not_fatal() {
        let err: MethodError = ServiceError::new("nope").into();
        assert!(!err.is_fatal());
        assert_eq!(err.to_error_object().error, -32602);
    }

    #[test]
    fn test_error_object_from_library_error() {
        assert_eq!(
            ErrorObject::from(&Error::ServiceNotFound("Missing".into())),
            ErrorObject::service_not_found()
        );
        assert_eq!(
            ErrorObject::from(&Error::MethodNotFound("Default.nope".into())),
            ErrorObject::method_not_found()
        );
        assert_eq!(
            ErrorObject::from(&Error::Fault("boom".into())),
            ErrorObject::server_error("boom")
        );
    }

    #[test]
    fn test_missing_data_defaults_to_empty_object() {
        let obj: ErrorObject = serde_json::from_str(r#"{"error":-32601,"msg":"Method not found"}"#).unwrap();
        assert_eq!(obj, ErrorObject::method_not_found());
    }

    #[test]
    fn test_error_object_display() {
        let display = ErrorObject::method_not_found().to_string();
        assert_eq!(display, "[-32601] Method not found");
    }

    #[test]
    fn test_remote_error_keeps_value() {
        let err = Error::Remote(json!({"code": -32601, "message": "nope"}));
        match err {
            Error::Remote(value) => assert_eq!(value["code"], -32601),
            _ => panic!("Expected Remote error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: Error = io_error.into();

        match error {
            Error::Io(msg) => assert_eq!(msg, "file not found"),
            _ => panic!("Expected IO error"),
        }
    }
}
