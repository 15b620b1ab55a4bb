//! Codec for shim envelopes
//!
//! This module turns request and response files into typed values and back,
//! and encodes the outbound JSON-RPC requests. All functions map serde errors
//! into [`Error`] so callers can use `?` throughout the runner and client.
//!
//! The file-level helpers ([`read_request_file`], [`write_response_file`])
//! live here too. Writing is a single open/write/close sequence on the
//! destination path, never a write-to-temp-and-rename, because the platform
//! may hand the shim a named pipe instead of a regular file.
//!
//! # Examples
//!
//! ```rust
//! use hutshim_core::{codec, ShimResponse};
//! use serde_json::json;
//!
//! let json = codec::encode_response(&ShimResponse::success(json!({"ok": true}))).unwrap();
//! let decoded = codec::decode_response(&json).unwrap();
//! assert!(decoded.is_success());
//! ```

use crate::error::{Error, Result};
use crate::types::{JsonRpcRequest, JsonRpcResponse, ShimRequest, ShimResponse};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Encode any serializable message to a JSON string
pub fn encode<T: Serialize>(msg: &T) -> Result<String> {
    serde_json::to_string(msg).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode a JSON string to a specific type
pub fn decode_as<'de, T: Deserialize<'de>>(data: &'de str) -> Result<T> {
    serde_json::from_str(data).map_err(|e| Error::Serialization(e.to_string()))
}

/// Decode the contents of a request file
///
/// # Errors
///
/// - `Error::InvalidRequest` if the text is not JSON, or is JSON without the
///   `req_id` / `method` fields
///
/// ```rust
/// use hutshim_core::codec;
///
/// assert!(codec::decode_request("not json").is_err());
/// assert!(codec::decode_request(r#"{"method":"Default.add"}"#).is_err());
/// ```
pub fn decode_request(data: &str) -> Result<ShimRequest> {
    serde_json::from_str(data).map_err(|e| Error::InvalidRequest(e.to_string()))
}

/// Encode a response for the response file
pub fn encode_response(resp: &ShimResponse) -> Result<String> {
    encode(resp)
}

/// Decode the contents of a response file
pub fn decode_response(data: &str) -> Result<ShimResponse> {
    decode_as(data)
}

/// Encode an outbound JSON-RPC request body
pub fn encode_rpc_request(req: &JsonRpcRequest) -> Result<String> {
    encode(req)
}

/// Decode an outbound reply body
///
/// # Errors
///
/// Returns `Error::Serialization` if the body is not JSON at all.
pub fn decode_rpc_response(data: &str) -> Result<JsonRpcResponse> {
    let value: serde_json::Value = decode_as(data)?;
    Ok(JsonRpcResponse::from_value(value))
}

/// Read and parse a request file
///
/// Returns `Ok(None)` when the file is empty, which is how a named pipe
/// reports that its writer closed without sending another request.
pub async fn read_request_file(path: &Path) -> Result<Option<ShimRequest>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;

    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(None);
    }

    let text = std::str::from_utf8(&bytes).map_err(|e| Error::InvalidRequest(e.to_string()))?;
    decode_request(text).map(Some)
}

/// Write a response with one explicit open/write/close sequence
///
/// The destination is opened for writing (created and truncated when it is a
/// regular file), written in full, flushed and closed. Works when the
/// destination is a FIFO.
pub fn write_response_file(path: &Path, resp: &ShimResponse) -> Result<()> {
    let body = encode_response(resp)?;

    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::Io(format!("{}: {}", path.display(), e)))?;
    file.write_all(body.as_bytes())?;
    file.flush()?;
    drop(file);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorObject;
    use crate::types::Id;
    use serde_json::json;

    #[test]
    fn test_decode_request() {
        let req = decode_request(r#"{"req_id":"abc","method":"Default.add","params":[2,3]}"#)
            .unwrap();
        assert_eq!(req.req_id, "abc");
        assert_eq!(req.method, "Default.add");
        assert_eq!(req.params, vec![json!(2), json!(3)]);
    }

    #[test]
    fn test_decode_request_rejects_garbage() {
        match decode_request("{oops") {
            Err(Error::InvalidRequest(_)) => {}
            other => panic!("Expected InvalidRequest, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rpc_response_rejects_non_json() {
        assert!(matches!(
            decode_rpc_response("<html>oops</html>"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_encode_rpc_request() {
        let req = JsonRpcRequest::new("get_file", vec![json!("abc"), json!("key")], Id::Number(3));
        let json = encode_rpc_request(&req).unwrap();
        assert!(json.contains(r#""method":"get_file""#));
        assert!(json.contains(r#""params":["abc","key"]"#));
        assert!(json.contains(r#""jsonrpc":"2.0""#));
        assert!(json.contains(r#""id":3"#));
    }

    #[test]
    fn test_response_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resp.json");
        let resp = ShimResponse::error(ErrorObject::with_data(
            -32602,
            "bad input",
            json!({"field": "x", "nested": [1, 2, {"k": null}]}),
        ));

        write_response_file(&path, &resp).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(decode_response(&text).unwrap(), resp);
    }

    #[test]
    fn test_write_truncates_previous_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resp.json");
        std::fs::write(&path, "x".repeat(256)).unwrap();

        write_response_file(&path, &ShimResponse::success(json!(1))).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), r#"{"result":1}"#);
    }

    #[tokio::test]
    async fn test_read_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, r#"{"req_id":"r1","method":"Default.ping","params":[]}"#).unwrap();

        let req = read_request_file(&path).await.unwrap().unwrap();
        assert_eq!(req.req_id, "r1");
    }

    #[tokio::test]
    async fn test_read_empty_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("req.json");
        std::fs::write(&path, "\n").unwrap();

        assert!(read_request_file(&path).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_missing_request_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = read_request_file(&dir.path().join("req.json")).await;
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
