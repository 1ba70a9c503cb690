#![allow(dead_code)]

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, Sse};
use axum::routing::{get, post};
use futures::Stream;
use serde_json::json;
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

/// In-process stand-in for Hodor's MCP SSE transport.
///
/// Every JSON-RPC request POSTed to `/messages` is recorded and answered on the event stream,
/// preceded by an unrelated notification the client has to skip.
#[derive(Clone, Default)]
pub struct FakeMcpGateway {
    events: Arc<Mutex<Option<mpsc::UnboundedSender<Event>>>>,
    received: Arc<Mutex<Vec<serde_json::Value>>>,
    tools: Arc<Vec<serde_json::Value>>,
    exec_fails: bool,
}

impl FakeMcpGateway {
    pub fn with_tools(tools: Vec<serde_json::Value>) -> Self {
        Self {
            tools: Arc::new(tools),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing_exec(mut self) -> Self {
        self.exec_fails = true;
        self
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/sse", get(sse))
            .route("/messages", post(messages))
            .with_state(self.clone())
    }

    pub fn received(&self) -> Vec<serde_json::Value> {
        self.received.lock().expect("received lock").clone()
    }

    /// `method`, or `tools/call:<name>` for tool calls.
    pub fn received_calls(&self) -> Vec<String> {
        self.received()
            .iter()
            .map(|m| {
                let method = m["method"].as_str().unwrap_or_default();
                match m.pointer("/params/name").and_then(serde_json::Value::as_str) {
                    Some(name) if method == "tools/call" => format!("{method}:{name}"),
                    _ => method.to_string(),
                }
            })
            .collect()
    }

    fn reply(&self, msg: &serde_json::Value) -> serde_json::Value {
        let id = msg["id"].clone();
        let text_result = |v: serde_json::Value| {
            json!({"jsonrpc": "2.0", "id": id, "result": {
                "content": [{"type": "text", "text": v.to_string()}]
            }})
        };
        match (
            msg["method"].as_str(),
            msg.pointer("/params/name").and_then(serde_json::Value::as_str),
        ) {
            (Some("initialize"), _) => json!({"jsonrpc": "2.0", "id": id, "result": {
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "hodor-fake", "version": "0"}
            }}),
            (Some("tools/call"), Some("hodor-find")) => {
                text_result(json!({ "tools": self.tools.as_slice() }))
            }
            (Some("tools/call"), Some("hodor-schema")) => {
                text_result(json!({"type": "object", "properties": {}}))
            }
            (Some("tools/call"), Some("hodor-exec")) if self.exec_fails => {
                json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32000, "message": "tool failed"}})
            }
            (Some("tools/call"), Some("hodor-exec")) => text_result(json!({
                "ok": true,
                "tool": msg.pointer("/params/arguments/tool"),
                "arguments": msg.pointer("/params/arguments/arguments"),
            })),
            _ => json!({"jsonrpc": "2.0", "id": id, "error": {"code": -32601, "message": "method not found"}}),
        }
    }
}

async fn sse(
    State(gw): State<FakeMcpGateway>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel();
    let _ = tx.send(
        Event::default()
            .event("endpoint")
            .data("/messages?sessionId=test-session"),
    );
    *gw.events.lock().expect("events lock") = Some(tx);
    let stream = futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|evt| (Ok::<_, Infallible>(evt), rx))
    });
    Sse::new(stream)
}

async fn messages(
    State(gw): State<FakeMcpGateway>,
    Json(msg): Json<serde_json::Value>,
) -> StatusCode {
    gw.received.lock().expect("received lock").push(msg.clone());
    if msg.get("id").is_none() {
        return StatusCode::ACCEPTED;
    }
    let reply = gw.reply(&msg);
    if let Some(tx) = gw.events.lock().expect("events lock").as_ref() {
        let noise = json!({"jsonrpc": "2.0", "method": "notifications/message", "params": {"level": "info"}});
        let _ = tx.send(Event::default().event("message").data(noise.to_string()));
        let _ = tx.send(Event::default().event("message").data(reply.to_string()));
    }
    StatusCode::ACCEPTED
}
