//! Error types for the gateway sample clients.

use thiserror::Error;

/// The only way a probe can fail: the GET could not be issued or completed.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{}", display_chain(.0))]
    Transport(#[from] reqwest::Error),
}

/// Errors raised by the MCP SSE tool flow.
#[derive(Error, Debug)]
pub enum FlowError {
    /// `GET /sse` answered with a non-success status.
    #[error("cannot connect to SSE endpoint (HTTP {status})")]
    Connect { status: reqwest::StatusCode },

    /// The event stream never announced a messages endpoint.
    #[error("could not parse messages endpoint from SSE")]
    MissingEndpoint,

    /// The event stream ended while something was still pending.
    #[error("SSE stream closed while waiting for {waiting_for}")]
    StreamClosed { waiting_for: String },

    #[error("timed out waiting for {waiting_for}")]
    Timeout { waiting_for: String },

    #[error("no result from {tool}")]
    NoResult { tool: String },

    #[error("{tool} returned an error: {error}")]
    Rpc {
        tool: String,
        error: serde_json::Value,
    },

    #[error("SSE stream error")]
    Stream(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("HTTP error: {}", display_chain(.0))]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Render an error with its sources, `outer: inner: root`.
///
/// reqwest's own message ("error sending request for url (...)") hides the interesting part
/// (connection refused, dns failure) in the source chain.
pub fn display_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let msg = cause.to_string();
        if !out.contains(&msg) {
            out.push_str(": ");
            out.push_str(&msg);
        }
        source = cause.source();
    }
    out
}
