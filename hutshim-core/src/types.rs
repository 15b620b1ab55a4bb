//! Wire types for the shim
//!
//! Two families of messages pass through the shim:
//!
//! - **File envelopes** exchanged with the orchestrating platform:
//!   [`ShimRequest`] is read from the request file and [`ShimResponse`] is
//!   written to the response file.
//! - **JSON-RPC 2.0 envelopes** used by the runtime client for outbound
//!   calls back into the platform: [`JsonRpcRequest`] and [`JsonRpcResponse`].
//!
//! # Examples
//!
//! ```rust
//! use hutshim_core::{ShimRequest, ShimResponse, ErrorObject};
//! use serde_json::json;
//!
//! let req: ShimRequest = serde_json::from_value(json!({
//!     "req_id": "abc",
//!     "method": "Default.add",
//!     "params": [2, 3]
//! })).unwrap();
//! assert_eq!(req.params.len(), 2);
//!
//! let ok = ShimResponse::success(json!(5));
//! assert!(ok.is_success());
//!
//! let err = ShimResponse::error(ErrorObject::service_not_found());
//! assert!(err.is_error());
//! ```

use crate::error::ErrorObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Request read from the request file
///
/// Created by the platform, read once per invocation and never modified after
/// parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShimRequest {
    /// Correlation id for this invocation; also names the sandbox directory
    pub req_id: String,
    /// Target in the form `Interface.method`
    pub method: String,
    /// Positional parameters, in call order
    #[serde(default)]
    pub params: Vec<Value>,
}

impl ShimRequest {
    /// Create a request
    pub fn new(req_id: impl Into<String>, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            req_id: req_id.into(),
            method: method.into(),
            params,
        }
    }

    /// Split `method` on the first `.` into interface and method names
    ///
    /// A method string without a `.` yields an empty method name.
    ///
    /// ```rust
    /// use hutshim_core::ShimRequest;
    ///
    /// let req = ShimRequest::new("r1", "Default.add.extra", vec![]);
    /// assert_eq!(req.split_method(), ("Default", "add.extra"));
    ///
    /// let req = ShimRequest::new("r1", "Default", vec![]);
    /// assert_eq!(req.split_method(), ("Default", ""));
    /// ```
    pub fn split_method(&self) -> (&str, &str) {
        self.method.split_once('.').unwrap_or((self.method.as_str(), ""))
    }
}

/// Response written to the response file
///
/// Serialized untagged, so the file holds either `{"result": ...}` or
/// `{"error": code, "msg": ..., "data": ...}` with no discriminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ShimResponse {
    /// The method completed and returned a value
    Success {
        /// Return value of the method
        result: Value,
    },
    /// Routing failure, application error or fault
    Error(ErrorObject),
}

impl ShimResponse {
    /// Create a success response
    pub fn success(result: Value) -> Self {
        ShimResponse::Success { result }
    }

    /// Create an error response
    pub fn error(error: ErrorObject) -> Self {
        ShimResponse::Error(error)
    }

    /// Whether this response carries a result
    pub fn is_success(&self) -> bool {
        matches!(self, ShimResponse::Success { .. })
    }

    /// Whether this response carries an error
    pub fn is_error(&self) -> bool {
        matches!(self, ShimResponse::Error(_))
    }

    /// The result value, if any
    pub fn result(&self) -> Option<&Value> {
        match self {
            ShimResponse::Success { result } => Some(result),
            ShimResponse::Error(_) => None,
        }
    }

    /// The error object, if any
    pub fn error_object(&self) -> Option<&ErrorObject> {
        match self {
            ShimResponse::Success { .. } => None,
            ShimResponse::Error(err) => Some(err),
        }
    }
}

impl From<ErrorObject> for ShimResponse {
    fn from(err: ErrorObject) -> Self {
        ShimResponse::Error(err)
    }
}

/// JSON-RPC 2.0 request identifier
///
/// Outbound calls always use `Number`; the other variants exist so replies
/// from the platform can be decoded whatever id they echo back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Id {
    /// Numeric identifier
    Number(u64),
    /// String identifier
    String(String),
    /// Null identifier
    Null,
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Id::String(s) => write!(f, "\"{}\"", s),
            Id::Number(n) => write!(f, "{}", n),
            Id::Null => write!(f, "null"),
        }
    }
}

impl From<u64> for Id {
    fn from(n: u64) -> Self {
        Id::Number(n)
    }
}

/// Outbound JSON-RPC 2.0 request sent to the platform runtime endpoint
///
/// Field order matches what the platform's reference shims emit:
/// `method`, `params`, `jsonrpc`, `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    /// Runtime function to invoke (`put_file`, `run_command`, ...)
    pub method: String,
    /// Positional parameters; the first is always the active `req_id`
    pub params: Vec<Value>,
    /// Always `"2.0"`
    pub jsonrpc: String,
    /// Process-local call counter
    pub id: Id,
}

impl JsonRpcRequest {
    /// Create a JSON-RPC 2.0 request
    pub fn new(method: impl Into<String>, params: Vec<Value>, id: Id) -> Self {
        Self {
            method: method.into(),
            params,
            jsonrpc: "2.0".to_string(),
            id,
        }
    }
}

/// Reply from the platform runtime endpoint
///
/// The platform is trusted to send a JSON object, but not to be strictly
/// JSON-RPC compliant. A reply is a success exactly when it has a `result`
/// key, even if that key holds `null`; anything else is a rejection carrying
/// the `error` value unchanged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JsonRpcResponse {
    /// `result` value when the key was present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// `error` value, or `null` when the key was absent
    #[serde(skip_serializing_if = "Value::is_null")]
    pub error: Value,
    /// Echoed id, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Id>,
}

impl JsonRpcResponse {
    /// Interpret a decoded reply body
    pub fn from_value(body: Value) -> Self {
        match body {
            Value::Object(mut map) => {
                let result = map.remove("result");
                let error = map.remove("error").unwrap_or(Value::Null);
                let id = map
                    .remove("id")
                    .and_then(|id| serde_json::from_value(id).ok());
                Self { result, error, id }
            }
            other => Self {
                result: None,
                error: other,
                id: None,
            },
        }
    }

    /// Whether the reply carried a `result` key
    pub fn is_success(&self) -> bool {
        self.result.is_some()
    }

    /// Resolve to the result value or reject with the platform's error value
    pub fn into_result(self) -> std::result::Result<Value, Value> {
        match self.result {
            Some(result) => Ok(result),
            None => Err(self.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_params_default_to_empty() {
        let req: ShimRequest =
            serde_json::from_str(r#"{"req_id":"abc","method":"Default.ping"}"#).unwrap();
        assert!(req.params.is_empty());
    }

    #[test]
    fn test_split_method_on_first_dot() {
        let req = ShimRequest::new("abc", "Default.add", vec![]);
        assert_eq!(req.split_method(), ("Default", "add"));
    }

    #[test]
    fn test_success_serialization() {
        let resp = ShimResponse::success(json!(5));
        assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"result":5}"#);
    }

    #[test]
    fn test_null_result_is_still_success() {
        let resp: ShimResponse = serde_json::from_str(r#"{"result":null}"#).unwrap();
        assert_eq!(resp, ShimResponse::success(Value::Null));
    }

    #[test]
    fn test_error_serialization_includes_data() {
        let resp = ShimResponse::error(ErrorObject::service_not_found());
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({"error": -32601, "msg": "Service not found", "data": {}})
        );
    }

    #[test]
    fn test_error_deserialization() {
        let resp: ShimResponse =
            serde_json::from_str(r#"{"error":-32602,"msg":"bad input","data":{"field":"x"}}"#)
                .unwrap();
        let err = resp.error_object().unwrap();
        assert_eq!(err.error, -32602);
        assert_eq!(err.data, json!({"field": "x"}));
    }

    #[test]
    fn test_outbound_request_serialization() {
        let req = JsonRpcRequest::new("is_author", vec![json!("abc")], Id::Number(0));
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"method":"is_author","params":["abc"],"jsonrpc":"2.0","id":0}"#
        );
    }

    #[test]
    fn test_reply_with_null_result_resolves() {
        let reply = JsonRpcResponse::from_value(json!({"jsonrpc": "2.0", "result": null, "id": 1}));
        assert!(reply.is_success());
        assert_eq!(reply.id, Some(Id::Number(1)));
        assert_eq!(reply.into_result(), Ok(Value::Null));
    }

    #[test]
    fn test_reply_without_result_rejects_with_error_value() {
        let error = json!({"code": -32601, "message": "Method not found"});
        let reply = JsonRpcResponse::from_value(json!({"jsonrpc": "2.0", "error": error, "id": 1}));
        assert_eq!(reply.into_result(), Err(error));
    }

    #[test]
    fn test_reply_without_either_key_rejects_with_null() {
        let reply = JsonRpcResponse::from_value(json!({"jsonrpc": "2.0"}));
        assert_eq!(reply.into_result(), Err(Value::Null));
    }

    #[test]
    fn test_id_display() {
        assert_eq!(Id::String("test".to_string()).to_string(), "\"test\"");
        assert_eq!(Id::Number(42).to_string(), "42");
        assert_eq!(Id::Null.to_string(), "null");
    }
}
