#![allow(dead_code)]

use anyhow::Context as _;
use axum::Json;
use axum::Router;
use axum::routing::get;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt as _, AsyncWriteExt as _};

pub use hodor_test_support::{pick_unused_port, serve};

/// Paths requested so far, in arrival order.
pub type RequestLog = Arc<Mutex<Vec<String>>>;

/// A gateway answering the three probe endpoints with fixed JSON bodies.
pub fn healthy_gateway(log: RequestLog) -> Router {
    let route = |path: &'static str, body: serde_json::Value| {
        let log = log.clone();
        get(move || async move {
            log.lock().expect("log lock").push(path.to_string());
            Json(body)
        })
    };
    Router::new()
        .route("/health", route("/health", json!({"status": "ok"})))
        .route("/ready", route("/ready", json!({"status": "ready"})))
        .route("/api/tools", route("/api/tools", json!({"tools": []})))
}

/// Answers `/health` and `/ready`, then never answers `/api/tools`.
pub fn stalling_gateway() -> Router {
    Router::new()
        .route("/health", get(|| async { Json(json!({"status": "ok"})) }))
        .route("/ready", get(|| async { Json(json!({"status": "ready"})) }))
        .route(
            "/api/tools",
            get(|| async {
                std::future::pending::<()>().await;
                Json(json!({"tools": []}))
            }),
        )
}

/// A raw HTTP/1.1 server that hangs up without answering requests for `drop_path`.
///
/// Every other path gets `{"path": "<path>"}` with `Connection: close`.
pub async fn spawn_flaky_gateway(drop_path: &'static str) -> anyhow::Result<(SocketAddr, RequestLog)> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .context("bind flaky gateway")?;
    let addr = listener.local_addr()?;
    let log = RequestLog::default();
    let accept_log = log.clone();
    tokio::spawn(async move {
        while let Ok((mut sock, _)) = listener.accept().await {
            let log = accept_log.clone();
            tokio::spawn(async move {
                let mut buf = vec![0_u8; 4096];
                let mut read = 0;
                while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                    match sock.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => read += n,
                    }
                    if read == buf.len() {
                        return;
                    }
                }
                let head = String::from_utf8_lossy(&buf[..read]);
                let path = head
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or_default()
                    .to_string();
                log.lock().expect("log lock").push(path.clone());
                if path == drop_path {
                    return;
                }
                let body = json!({ "path": path }).to_string();
                let resp = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = sock.write_all(resp.as_bytes()).await;
                let _ = sock.shutdown().await;
            });
        }
    });
    Ok((addr, log))
}
