//! Minimal MCP client for the gateway's SSE transport.
//!
//! `GET /sse` opens a long-lived event stream whose first event names the messages endpoint.
//! JSON-RPC requests are POSTed there and their responses arrive back on the event stream.

use std::time::Duration;

use futures::StreamExt as _;
use futures::stream::BoxStream;
use serde_json::json;
use url::Url;

use crate::error::FlowError;

/// Bound on opening `/sse` and receiving the messages endpoint.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const PROTOCOL_VERSION: &str = "2024-11-05";

struct SseFrame {
    event: Option<String>,
    data: String,
}

pub struct McpSseSession {
    http: reqwest::Client,
    messages_url: Url,
    events: BoxStream<'static, Result<SseFrame, FlowError>>,
    request_timeout: Duration,
}

impl McpSseSession {
    /// `<base>/sse`, with any trailing `/` on the base dropped first.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn sse_url(base_url: &str) -> Result<Url, FlowError> {
        Ok(base_dir(base_url)?.join("sse")?)
    }

    /// Open the event stream and wait for the messages endpoint, within [`CONNECT_TIMEOUT`].
    ///
    /// # Errors
    ///
    /// See [`McpSseSession::connect_with_timeout`].
    pub async fn connect(base_url: &str) -> Result<Self, FlowError> {
        Self::connect_with_timeout(base_url, CONNECT_TIMEOUT).await
    }

    /// # Errors
    ///
    /// Returns an error if the stream cannot be opened, answers with a non-success status, or
    /// ends (or stalls past `connect_timeout`) without announcing an endpoint.
    pub async fn connect_with_timeout(
        base_url: &str,
        connect_timeout: Duration,
    ) -> Result<Self, FlowError> {
        let base = base_dir(base_url)?;
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        let timed_out = |what: &str| FlowError::Timeout {
            waiting_for: what.to_string(),
        };
        let resp = tokio::time::timeout(
            connect_timeout,
            http.get(base.join("sse")?)
                .header(reqwest::header::ACCEPT, "text/event-stream")
                .send(),
        )
        .await
        .map_err(|_| timed_out("SSE response headers"))??;
        if !resp.status().is_success() {
            return Err(FlowError::Connect {
                status: resp.status(),
            });
        }

        let mut events = sse_stream::SseStream::from_byte_stream(resp.bytes_stream())
            .map(|evt| match evt {
                Ok(evt) => Ok(SseFrame {
                    event: evt.event.map(|e| e.to_string()),
                    data: evt.data.map(|d| d.to_string()).unwrap_or_default(),
                }),
                Err(e) => Err(FlowError::Stream(Box::new(e))),
            })
            .boxed();

        let endpoint = tokio::time::timeout(connect_timeout, async {
            while let Some(frame) = events.next().await {
                if let Some(endpoint) = parse_endpoint(&frame?.data) {
                    return Ok(endpoint);
                }
            }
            Err(FlowError::MissingEndpoint)
        })
        .await
        .map_err(|_| timed_out("messages endpoint"))??;

        let messages_url = base.join(&endpoint)?;
        tracing::debug!(%messages_url, "MCP SSE session opened");

        Ok(Self {
            http,
            messages_url,
            events,
            request_timeout: REQUEST_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn messages_url(&self) -> &Url {
        &self.messages_url
    }

    /// Send a JSON-RPC request and wait for the message carrying the same `id`.
    ///
    /// Notifications and responses to other ids seen meanwhile are dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the POST fails, the stream ends, or no response arrives in time.
    pub async fn request(
        &mut self,
        id: u64,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FlowError> {
        self.post(&json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        }))
        .await?;

        tokio::time::timeout(self.request_timeout, self.next_response(id))
            .await
            .map_err(|_| FlowError::Timeout {
                waiting_for: format!("response to request {id} ({method})"),
            })?
    }

    /// Send a JSON-RPC notification. Nothing is read back.
    ///
    /// # Errors
    ///
    /// Returns an error if the POST fails.
    pub async fn notify(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<(), FlowError> {
        self.post(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        }))
        .await
    }

    /// MCP handshake. Returns the server name when the gateway reports one.
    ///
    /// # Errors
    ///
    /// Returns an error if either message cannot be delivered or the response never arrives.
    pub async fn initialize(&mut self) -> Result<Option<String>, FlowError> {
        let resp = self
            .request(
                1,
                "initialize",
                json!({
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {
                        "name": env!("CARGO_PKG_NAME"),
                        "version": env!("CARGO_PKG_VERSION"),
                    }
                }),
            )
            .await?;
        self.notify("notifications/initialized", json!({})).await?;

        Ok(resp
            .pointer("/result/serverInfo/name")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string))
    }

    /// `tools/call`; returns the whole JSON-RPC message (`result` or `error`).
    ///
    /// # Errors
    ///
    /// See [`McpSseSession::request`].
    pub async fn call_tool(
        &mut self,
        id: u64,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<serde_json::Value, FlowError> {
        self.request(
            id,
            "tools/call",
            json!({ "name": name, "arguments": arguments }),
        )
        .await
    }

    async fn post(&self, body: &serde_json::Value) -> Result<(), FlowError> {
        self.http
            .post(self.messages_url.clone())
            .json(body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn next_response(&mut self, id: u64) -> Result<serde_json::Value, FlowError> {
        let want = json!(id);
        while let Some(frame) = self.events.next().await {
            let frame = frame?;
            if frame.event.as_deref().is_some_and(|e| e != "message") {
                continue;
            }
            let Ok(msg) = serde_json::from_str::<serde_json::Value>(&frame.data) else {
                tracing::debug!(data = %frame.data, "skipping non-JSON SSE event");
                continue;
            };
            if msg.get("id") == Some(&want) {
                return Ok(msg);
            }
            tracing::debug!(?msg, "skipping unrelated MCP message");
        }
        Err(FlowError::StreamClosed {
            waiting_for: format!("response to request {id}"),
        })
    }
}

fn base_dir(base_url: &str) -> Result<Url, FlowError> {
    Ok(Url::parse(&format!("{}/", base_url.trim_end_matches('/')))?)
}

/// The endpoint event carries either `{"url": "..."}` or the URL itself.
fn parse_endpoint(data: &str) -> Option<String> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    if data.starts_with('{') {
        let v: serde_json::Value = serde_json::from_str(data).ok()?;
        return v.get("url").and_then(serde_json::Value::as_str).map(str::to_string);
    }
    Some(data.to_string())
}
