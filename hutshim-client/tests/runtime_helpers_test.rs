//! Parameter shaping of the runtime helper functions

mod common;

use common::{client_for, rpc_result, rpc_request, RPC_PATH};
use httpmock::prelude::*;
use hutshim_core::Error;
use serde_json::json;

#[tokio::test]
async fn test_put_file_defaults_to_public() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("put_file", json!(["r1", "out.png", true]), 0));
        then.status(200)
            .json_body(rpc_result(0, json!("https://files.example/out.png")));
    });

    let (client, _session) = client_for(&server, "r1");
    let url = client.put_file("out.png").await.unwrap();

    assert_eq!(url, json!("https://files.example/out.png"));
    mock.assert();
}

#[tokio::test]
async fn test_put_file_private() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("put_file", json!(["r1", "out.png", false]), 0));
        then.status(200).json_body(rpc_result(0, json!("key-1")));
    });

    let (client, _session) = client_for(&server, "r1");
    client.put_file_with("out.png", false).await.unwrap();

    mock.assert();
}

#[tokio::test]
async fn test_get_file() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("get_file", json!(["r1", "key-1"]), 0));
        then.status(200).json_body(rpc_result(0, json!("local.png")));
    });

    let (client, _session) = client_for(&server, "r1");
    assert_eq!(client.get_file("key-1").await.unwrap(), json!("local.png"));
    mock.assert();
}

#[tokio::test]
async fn test_download_file_defaults_name_to_null() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(rpc_request(
            "download_file",
            json!(["r1", "http://example.com/a.txt", null]),
            0,
        ));
        then.status(200).json_body(rpc_result(0, json!("a.txt")));
    });

    let (client, _session) = client_for(&server, "r1");
    let name = client
        .download_file("http://example.com/a.txt", None)
        .await
        .unwrap();

    assert_eq!(name, json!("a.txt"));
    mock.assert();
}

#[tokio::test]
async fn test_download_file_with_name() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST).path(RPC_PATH).json_body(rpc_request(
            "download_file",
            json!(["r1", "http://example.com/a.txt", "b.txt"]),
            0,
        ));
        then.status(200).json_body(rpc_result(0, json!("b.txt")));
    });

    let (client, _session) = client_for(&server, "r1");
    let name = client
        .download_file("http://example.com/a.txt", Some("b.txt"))
        .await
        .unwrap();

    assert_eq!(name, json!("b.txt"));
    mock.assert();
}

#[tokio::test]
async fn test_run_command_defaults_stdin_to_empty() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("run_command", json!(["r1", "ls", ""]), 0));
        then.status(200).json_body(rpc_result(0, json!("a.txt\n")));
    });

    let (client, _session) = client_for(&server, "r1");
    assert_eq!(client.run_command("ls", None).await.unwrap(), json!("a.txt\n"));
    mock.assert();
}

#[tokio::test]
async fn test_run_command_with_stdin() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("run_command", json!(["r1", "wc", "one two"]), 0));
        then.status(200).json_body(rpc_result(0, json!("2")));
    });

    let (client, _session) = client_for(&server, "r1");
    client.run_command("wc", Some("one two")).await.unwrap();
    mock.assert();
}

#[tokio::test]
async fn test_identity_helpers() {
    let server = MockServer::start();
    let user = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("get_stackhut_user", json!(["r1"]), 0));
        then.status(200).json_body(rpc_result(0, json!("alice")));
    });
    let author = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("get_service_author", json!(["r1"]), 1));
        then.status(200).json_body(rpc_result(1, json!("bob")));
    });
    let is_author = server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .json_body(rpc_request("is_author", json!(["r1"]), 2));
        then.status(200).json_body(rpc_result(2, json!(false)));
    });

    let (client, _session) = client_for(&server, "r1");
    assert_eq!(client.get_stackhut_user().await.unwrap(), json!("alice"));
    assert_eq!(client.get_service_author().await.unwrap(), json!("bob"));
    assert_eq!(client.is_author().await.unwrap(), json!(false));

    user.assert();
    author.assert();
    is_author.assert();
}

#[tokio::test]
async fn test_identity_helpers_pass_null_through() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .body_includes(r#""method":"get_stackhut_user""#);
        then.status(200).json_body(rpc_result(0, json!(null)));
    });
    server.mock(|when, then| {
        when.method(POST)
            .path(RPC_PATH)
            .body_includes(r#""method":"get_service_author""#);
        then.status(200).json_body(rpc_result(1, json!(null)));
    });

    let (client, session) = client_for(&server, "r1");
    assert_eq!(client.get_stackhut_user().await.unwrap(), json!(null));
    assert_eq!(client.get_service_author().await.unwrap(), json!(null));
    assert_eq!(session.id_val().await, 2);
}

#[tokio::test]
async fn test_helpers_do_not_check_result_type() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH);
        then.status(200).json_body(rpc_result(0, json!("yes")));
    });

    let (client, session) = client_for(&server, "r1");
    assert_eq!(client.is_author().await.unwrap(), json!("yes"));
    assert_eq!(session.id_val().await, 1);
}

#[tokio::test]
async fn test_call_typed_reports_wrong_type() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path(RPC_PATH);
        then.status(200).json_body(rpc_result(0, json!("yes")));
    });

    let (client, session) = client_for(&server, "r1");
    let result = client.call_typed::<bool>("is_author", vec![]).await;
    assert!(matches!(result, Err(Error::Serialization(_))));
    assert_eq!(session.id_val().await, 1);
}
