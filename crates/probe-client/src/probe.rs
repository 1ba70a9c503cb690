//! Probe the gateway's plain HTTP endpoints.
//!
//! Three GETs, strictly one after another, in the order of [`PROBE_PATHS`]. A failing path is
//! reported inline and never stops the run.

use std::io::Write;

use crate::error::ProbeError;

/// Relative paths probed, in order.
pub const PROBE_PATHS: [&str; 3] = ["/health", "/ready", "/api/tools"];

pub const BANNER: &str = "=== Hodor MCP Gateway - Rust sample ===";

/// Result of probing a single path.
#[derive(Debug)]
pub struct ProbeOutcome {
    pub path: &'static str,
    pub result: Result<serde_json::Value, ProbeError>,
}

impl ProbeOutcome {
    /// One report line: `<path>: <compact json>` or `<path>: error: <description>`.
    #[must_use]
    pub fn render(&self) -> String {
        match &self.result {
            Ok(value) => format!("{}: {value}", self.path),
            Err(e) => format!("{}: error: {e}", self.path),
        }
    }
}

pub struct ProbeClient {
    base_url: String,
    http: reqwest::Client,
}

impl ProbeClient {
    /// No default headers, no timeout, no retries.
    #[must_use]
    pub fn new(base_url: String) -> Self {
        Self {
            base_url,
            http: reqwest::Client::new(),
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Plain concatenation; `http://h/` + `/health` yields `http://h//health`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Issue one GET and decode the body.
    ///
    /// The status code is not inspected: an error page with a JSON body is reported like any
    /// other JSON value. A body that is not JSON decodes to `null`.
    pub async fn probe(&self, path: &'static str) -> ProbeOutcome {
        let url = self.endpoint(path);
        let result = self.fetch_json(&url).await;
        if let Err(e) = &result {
            tracing::warn!(%url, error = %e, "probe failed");
        }
        ProbeOutcome { path, result }
    }

    async fn fetch_json(&self, url: &str) -> Result<serde_json::Value, ProbeError> {
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        // Reading the full body hands the connection back before the next probe starts.
        let body = resp.bytes().await?;
        tracing::debug!(%url, %status, bytes = body.len(), "probe response");
        Ok(decode_body(url, &body))
    }

    /// Probe every path in [`PROBE_PATHS`], each fully resolved before the next.
    pub async fn run(&self) -> Vec<ProbeOutcome> {
        let mut outcomes = Vec::with_capacity(PROBE_PATHS.len());
        for path in PROBE_PATHS {
            outcomes.push(self.probe(path).await);
        }
        outcomes
    }

    /// Like [`ProbeClient::run`], but writes the header up front and each line as soon as its
    /// probe resolves, so a gateway that stalls on one path still shows the earlier results.
    ///
    /// # Errors
    ///
    /// Returns an error only if writing to `out` fails.
    pub async fn report<W: Write>(&self, out: &mut W) -> std::io::Result<Vec<ProbeOutcome>> {
        write_header(out, &self.base_url)?;
        let mut outcomes = Vec::with_capacity(PROBE_PATHS.len());
        for path in PROBE_PATHS {
            let outcome = self.probe(path).await;
            writeln!(out, "{}", outcome.render())?;
            out.flush()?;
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }
}

fn decode_body(url: &str, body: &[u8]) -> serde_json::Value {
    match serde_json::from_slice(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(%url, error = %e, "response body is not JSON");
            serde_json::Value::Null
        }
    }
}

/// Write the banner and the base URL, followed by a blank line.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn write_header<W: Write>(out: &mut W, base_url: &str) -> std::io::Result<()> {
    writeln!(out, "{BANNER}")?;
    writeln!(out, "Base URL: {base_url}")?;
    writeln!(out)?;
    out.flush()
}

/// Write the header and one line per outcome.
///
/// # Errors
///
/// Returns an error only if writing to `out` fails.
pub fn write_report<W: Write>(
    out: &mut W,
    base_url: &str,
    outcomes: &[ProbeOutcome],
) -> std::io::Result<()> {
    write_header(out, base_url)?;
    for outcome in outcomes {
        writeln!(out, "{}", outcome.render())?;
    }
    out.flush()
}
