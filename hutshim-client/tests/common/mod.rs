//! Common test utilities for hutshim-client integration tests
//!
//! Helpers to stand up a mock platform runtime endpoint with `httpmock` and
//! point a client at it.

#![allow(dead_code)]

use httpmock::MockServer;
use hutshim_client::{RuntimeClient, Session};
use serde_json::{json, Value};

/// Path the platform serves JSON-RPC on
pub const RPC_PATH: &str = "/jsonrpc";

/// Build a client for `server` with `req_id` already active
pub fn client_for(server: &MockServer, req_id: &str) -> (RuntimeClient, Session) {
    let session = Session::new(std::env::temp_dir());
    session.begin_request(req_id);
    let client = RuntimeClient::builder(session.clone())
        .endpoint(server.url(RPC_PATH))
        .build()
        .expect("client");
    (client, session)
}

/// Reply body for a successful call
pub fn rpc_result(id: u64, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "result": result,
        "id": id
    })
}

/// Reply body for a rejected call
pub fn rpc_error(id: u64, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": id
    })
}

/// Expected request body for an outbound call
pub fn rpc_request(method: &str, params: Value, id: u64) -> Value {
    json!({
        "method": method,
        "params": params,
        "jsonrpc": "2.0",
        "id": id
    })
}
