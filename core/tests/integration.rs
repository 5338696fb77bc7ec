//! End-to-end calls against the live mock server.
//!
//! # Design
//! Starts the mock JSON-RPC server on a random port, then drives the
//! dispatcher through `UreqTransport` over real HTTP. Checks what actually
//! reached the server (via the echoed reply and the params header) rather
//! than what the client thinks it sent.
#![cfg(feature = "ureq")]

use std::net::SocketAddr;
use std::sync::Arc;

use jrpc_core::{
    CallError, CallOptions, CallResponse, Destination, DestinationConfig, EmptyParams, JrpcRequest, JrpcResult,
    ResponseMode, UreqTransport,
};
use serde_json::json;
use std::io::Read;

/// Start the mock server on an ephemeral port and return its address.
fn start_server() -> SocketAddr {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener).await
        })
        .unwrap();
    });

    addr
}

fn destination<C>(client: C, addr: SocketAddr, path: &str) -> Destination<C> {
    Destination::from_config(
        client,
        DestinationConfig {
            method: "POST".to_string(),
            protocol: "http".to_string(),
            host: addr.ip().to_string(),
            port: addr.port(),
            path: path.to_string(),
            options: CallOptions::default(),
        },
    )
}

#[test]
fn ping_round_trip() {
    let addr = start_server();
    let dest = destination(UreqTransport::new(), addr, "");

    // Step 1: ping with no params, default options.
    let snap = dest.call_snapshot(&JrpcRequest::new("ping", "1")).unwrap();
    assert_eq!(snap.status_code, 200);
    assert_eq!(snap.status, "200 OK");
    assert_eq!(snap.request.url, format!("http://127.0.0.1:{}", addr.port()));
    assert_eq!(snap.request.body, br#"{"jsonrpc":"2.0","id":"1","method":"ping"}"#);
    assert_eq!(snap.header("x-received-params"), Some("absent"));

    // Step 2: the body parses against the declared reply shape.
    let reply: JrpcResult = snap.json().unwrap();
    assert_eq!(reply.version, "2.0");
    assert_eq!(reply.id, "1");
    assert!(!reply.is_error());
    assert_eq!(reply.result["method"], "ping");
    assert_eq!(reply.result["content_type"], "application/json");
    assert_eq!(snap.content_length, Some(snap.body.len() as u64));

    // Step 3: same call keeping empty params.
    let keep = destination(UreqTransport::new(), addr, "")
        .with_options(CallOptions::default().with_empty_params(EmptyParams::Keep));
    let snap = keep.call_snapshot(&JrpcRequest::new("ping", "2")).unwrap();
    assert_eq!(snap.header("x-received-params"), Some("present"));
    let reply = JrpcResult::from_slice(&snap.body).unwrap();
    assert_eq!(reply.result["params"], json!({}));
}

#[test]
fn params_and_path_reach_the_server() {
    let addr = start_server();
    let dest = destination(UreqTransport::new(), addr, "rpc/v1");

    let req = JrpcRequest::new("getBalance", "abc")
        .with_param("account", "alice")
        .unwrap()
        .with_param("blocks", [1, 2, 3])
        .unwrap();
    let snap = dest.call_snapshot(&req).unwrap();

    assert_eq!(snap.request.url, format!("http://127.0.0.1:{}/rpc/v1", addr.port()));
    let reply: JrpcResult = snap.json().unwrap();
    assert_eq!(reply.result["path"], "/rpc/v1");
    assert_eq!(reply.result["params"], json!({"account": "alice", "blocks": [1, 2, 3]}));
}

#[test]
fn rpc_error_is_left_for_the_caller() {
    let addr = start_server();
    let dest = destination(UreqTransport::new(), addr, "");

    let req = JrpcRequest::new("fail", "9").with_param("why", "test").unwrap();
    let snap = dest.call_snapshot(&req).unwrap();
    assert_eq!(snap.status_code, 200);

    let err = JrpcResult::from_slice(&snap.body).unwrap().into_result().unwrap_err();
    assert_eq!(err.code, -32000);
    assert_eq!(err.data, Some(json!({"why": "test"})));
}

#[test]
fn raw_mode_hands_back_open_body() {
    let addr = start_server();
    let dest = destination(UreqTransport::new(), addr, "")
        .with_options(CallOptions::default().with_response_mode(ResponseMode::Raw));

    let CallResponse::Raw(mut raw) = dest.call(&JrpcRequest::new("ping", "raw")).unwrap() else {
        panic!("expected raw response");
    };
    assert_eq!(raw.status().as_u16(), 200);
    assert_eq!(raw.head.header("x-received-params"), Some("absent"));

    let mut body = Vec::new();
    raw.body.read_to_end(&mut body).unwrap();
    raw.close().unwrap();
    let reply = JrpcResult::from_slice(&body).unwrap();
    assert_eq!(reply.id, "raw");
}

#[test]
fn non_2xx_is_still_a_response() {
    let addr = start_server();
    let mut dest = destination(UreqTransport::new(), addr, "");
    dest.method = "GET".to_string();

    // GET carries a body here; the server only routes POST.
    match dest.call_snapshot(&JrpcRequest::new("ping", "1")) {
        Ok(snap) => assert_eq!(snap.status_code, 405),
        Err(CallError::Transport(_)) => {}
        Err(other) => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn nothing_listening_is_a_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
    let dest = destination(UreqTransport::new(), addr, "");

    let err = dest.call(&JrpcRequest::new("ping", "1")).unwrap_err();
    assert!(matches!(err, CallError::Transport(_)), "{err:?}");
}

#[test]
fn concurrent_calls_share_one_transport() {
    let addr = start_server();
    let transport = Arc::new(UreqTransport::new());

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let dest = destination(transport.clone(), addr, "");
            std::thread::spawn(move || {
                let id = format!("call-{i}");
                let snap = dest.call_snapshot(&JrpcRequest::new("ping", id.clone())).unwrap();
                let reply: JrpcResult = snap.json().unwrap();
                assert_eq!(reply.id, id);
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
