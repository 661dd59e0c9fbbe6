//! Integration tests for the full request/response path.
//!
//! A small in-process gateway accepts framed requests on a loopback port,
//! answers each command the way the AMAS gateway does, and wraps the reply
//! in the same `(NNNNNNNN)` envelope.
//!
//! # Running
//!
//! ```bash
//! cargo test --test exchange_integration -- --nocapture
//! ```

use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use amas_console::bridge::{BridgeHandle, ExchangeJob, ExchangeService};
use amas_console::models::Command;
use amas_console::wire::{
    declared_length, frame, round_trip, ExchangeOptions, ExchangeOutcome, PreparedRequest,
    ReadStrategy, Target, HEADER_LEN,
};

/// Start a gateway on an ephemeral port. Each connection handles one request.
async fn spawn_gateway() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle_connection(socket, false));
        }
    });

    Target::new("127.0.0.1", port)
}

/// Like `spawn_gateway`, but the reply is written in two segments.
async fn spawn_split_gateway() -> Target {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            tokio::spawn(handle_connection(socket, true));
        }
    });

    Target::new("127.0.0.1", port)
}

async fn handle_connection(mut socket: TcpStream, split: bool) {
    let mut header = [0u8; HEADER_LEN];
    socket.read_exact(&mut header).await.unwrap();
    let len = declared_length(&header).expect("request header");

    let mut body = vec![0u8; len];
    socket.read_exact(&mut body).await.unwrap();
    let request: Value = serde_json::from_slice(&body).unwrap();

    let response = frame(&reply(&request).to_string()).unwrap();
    let bytes = response.as_bytes();

    if split {
        let (first, rest) = bytes.split_at(HEADER_LEN + 4);
        socket.write_all(first).await.unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        // The single-read client may already have hung up
        let _ = socket.write_all(rest).await;
    } else {
        socket.write_all(bytes).await.unwrap();
    }
}

fn reply(request: &Value) -> Value {
    match request["cmd"].as_str() {
        Some("auth") => json!({
            "cmd": "auth",
            "result": "success",
            "sessionId": "abcde12345",
            "reqNo": request["reqNo"],
        }),
        Some("heartBeat") => json!({
            "cmd": "heartBeat",
            "result": "success",
            "sessionId": request["sessionId"],
        }),
        Some("execute") => json!({
            "cmd": "execute",
            "result": "success",
            "output": format!(
                "{} {}",
                request["command"].as_str().unwrap_or_default(),
                request["params"]["target"].as_str().unwrap_or_default()
            ),
        }),
        _ => json!({ "result": "fail", "message": "unknown command" }),
    }
}

#[tokio::test]
async fn test_auth_template_round_trip() {
    let target = spawn_gateway().await;
    let outcome = round_trip(
        &target,
        &Command::Auth.template_text(),
        &ExchangeOptions::default(),
    )
    .await
    .unwrap();

    assert!(outcome.is_success());
    assert_eq!(
        outcome.display_text(),
        "{\n  \"cmd\": \"auth\",\n  \"result\": \"success\",\n  \"sessionId\": \"abcde12345\",\n  \"reqNo\": \"test_1\"\n}"
    );
    assert_eq!(outcome.note(), None);
}

#[tokio::test]
async fn test_heartbeat_preserves_non_ascii() {
    let target = spawn_gateway().await;
    let outcome = round_trip(
        &target,
        r#"{"cmd": "heartBeat", "sessionId": "세션-1"}"#,
        &ExchangeOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome.display_text(),
        "{\n  \"cmd\": \"heartBeat\",\n  \"result\": \"success\",\n  \"sessionId\": \"세션-1\"\n}"
    );
    assert_eq!(outcome.note(), None);
}

#[tokio::test]
async fn test_execute_template_round_trip() {
    let target = spawn_gateway().await;
    let outcome = round_trip(
        &target,
        &Command::Execute.template_text(),
        &ExchangeOptions::default(),
    )
    .await
    .unwrap();

    assert!(outcome.display_text().contains("\"output\": \"ping 127.0.0.1\""));
}

#[tokio::test]
async fn test_unknown_command_is_still_a_response() {
    let target = spawn_gateway().await;
    let outcome = round_trip(&target, r#"{"cmd":"logout"}"#, &ExchangeOptions::default())
        .await
        .unwrap();

    assert!(outcome.is_success());
    assert!(outcome.display_text().contains("unknown command"));
}

#[tokio::test]
async fn test_declared_length_reads_split_reply() {
    let target = spawn_split_gateway().await;
    let options = ExchangeOptions {
        read_strategy: ReadStrategy::DeclaredLength,
        ..ExchangeOptions::default()
    };

    let outcome = round_trip(&target, &Command::HeartBeat.template_text(), &options)
        .await
        .unwrap();

    assert_eq!(
        outcome.display_text(),
        "{\n  \"cmd\": \"heartBeat\",\n  \"result\": \"success\",\n  \"sessionId\": \"abcde12345\"\n}"
    );
}

#[tokio::test]
async fn test_single_read_flags_split_reply() {
    let target = spawn_split_gateway().await;
    let outcome = round_trip(
        &target,
        &Command::HeartBeat.template_text(),
        &ExchangeOptions::default(),
    )
    .await
    .unwrap();

    // Only the first segment arrives: header plus `{"cm`
    assert_eq!(outcome.display_text(), "{\"cm");
    assert!(outcome.note().unwrap().starts_with("Header declares "));
}

#[tokio::test]
async fn test_unreachable_gateway_reports_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let outcome = round_trip(
        &Target::new("127.0.0.1", port),
        r#"{"cmd":"heartBeat"}"#,
        &ExchangeOptions::default(),
    )
    .await
    .unwrap();

    assert!(matches!(outcome, ExchangeOutcome::Failed(_)));
    assert!(outcome.display_text().starts_with("Error: "));
}

#[tokio::test]
async fn test_invalid_json_is_rejected_before_connecting() {
    let err = round_trip(
        &Target::new("127.0.0.1", 1),
        "{\"cmd\": heartBeat}",
        &ExchangeOptions::default(),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().starts_with("Invalid JSON: "), "{}", err);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_worker_round_trip_against_gateway() {
    let target = spawn_gateway().await;
    let handle = BridgeHandle::spawn().unwrap();

    for (request_id, command) in Command::all().iter().enumerate() {
        handle
            .request_exchange(ExchangeJob {
                request_id,
                target: target.clone(),
                request: PreparedRequest::from_value(&command.template()).unwrap(),
                options: ExchangeOptions::default(),
            })
            .unwrap();
    }

    let mut responses = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(10);
    while responses.len() < Command::all().len() {
        assert!(Instant::now() < deadline, "Timed out waiting for worker");
        match handle.poll_response() {
            Some(response) => responses.push(response),
            None => tokio::time::sleep(Duration::from_millis(10)).await,
        }
    }

    let ids: Vec<usize> = responses.iter().map(|r| r.request_id).collect();
    assert_eq!(ids, vec![0, 1, 2]);
    assert!(responses.iter().all(|r| r.outcome.is_success()));
}
