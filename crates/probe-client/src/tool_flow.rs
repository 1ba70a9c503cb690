//! The dynamic MCP flow: `hodor-find` → `hodor-schema` → `hodor-exec`.

use std::io::Write;

use anyhow::Context as _;
use owo_colors::OwoColorize as _;
use serde::Deserialize;
use serde_json::json;

use crate::error::FlowError;
use crate::mcp_sse::McpSseSession;

pub const FIND_TOOL: &str = "hodor-find";
pub const SCHEMA_TOOL: &str = "hodor-schema";
pub const EXEC_TOOL: &str = "hodor-exec";

const LISTED_TOOLS: usize = 10;
const DESCRIPTION_PREVIEW: usize = 50;
const RESULT_PREVIEW: usize = 500;
const TEXT_RESULT_PREVIEW: usize = 300;

#[derive(Debug, Clone)]
pub struct FlowOptions {
    pub base_url: String,
    pub query: String,
    /// `server:tool_name`; picked from the search results when absent.
    pub execute: Option<String>,
    pub color: bool,
}

/// A tool as listed by `hodor-find`.
///
/// The gateway serializes PascalCase; camelCase is accepted too.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ToolSummary {
    #[serde(rename = "FullName", alias = "fullName", default = "unnamed_tool")]
    pub full_name: String,
    #[serde(rename = "Description", alias = "description", default)]
    pub description: String,
}

fn unnamed_tool() -> String {
    "?".to_string()
}

/// Gateway tools wrap their JSON output in `content[0].text`; unwrap it when present.
#[must_use]
pub fn unwrap_tool_payload(result: &serde_json::Value) -> serde_json::Value {
    let Some(text) = result
        .pointer("/content/0/text")
        .and_then(serde_json::Value::as_str)
    else {
        return result.clone();
    };
    serde_json::from_str(text).unwrap_or_else(|_| serde_json::Value::String(text.to_string()))
}

/// Tools listed under `tools`. Entries that are not tool objects are skipped.
#[must_use]
pub fn parse_tools(payload: &serde_json::Value) -> Vec<ToolSummary> {
    let Some(tools) = payload.get("tools").and_then(serde_json::Value::as_array) else {
        return Vec::new();
    };
    tools
        .iter()
        .filter_map(|t| match ToolSummary::deserialize(t) {
            Ok(tool) => Some(tool),
            Err(e) => {
                tracing::debug!(error = %e, entry = %t, "skipping malformed tool entry");
                None
            }
        })
        .collect()
}

/// Choose which tool to execute.
///
/// An explicit choice wins. Otherwise prefer a memory "create" tool, then a time tool, then
/// whatever came first.
#[must_use]
pub fn pick_tool(tools: &[ToolSummary], explicit: Option<&str>) -> Option<String> {
    if let Some(name) = explicit {
        return Some(name.to_string());
    }
    let lower = |t: &ToolSummary| t.full_name.to_lowercase();
    tools
        .iter()
        .find(|t| {
            let n = lower(t);
            n.contains("memory") && n.contains("create")
        })
        .or_else(|| tools.iter().find(|t| lower(t).contains("time")))
        .or_else(|| tools.first())
        .map(|t| t.full_name.clone())
}

/// Demo arguments for the tool about to be executed.
#[must_use]
pub fn exec_arguments(tool: &str) -> serde_json::Value {
    let name = tool.to_lowercase();
    if name.contains("create") {
        json!({ "type": "create", "content": "Hello from Hodor Rust sample!" })
    } else if name.contains("fetch") || name.contains("url") {
        json!({ "url": "https://example.com" })
    } else {
        json!({})
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn result_of(msg: &serde_json::Value, tool: &str) -> Result<serde_json::Value, FlowError> {
    if let Some(result) = msg.get("result") {
        return Ok(result.clone());
    }
    match msg.get("error") {
        Some(error) => Err(FlowError::Rpc {
            tool: tool.to_string(),
            error: error.clone(),
        }),
        None => Err(FlowError::NoResult {
            tool: tool.to_string(),
        }),
    }
}

/// Text content that parses as JSON is pretty-printed (first 500 chars), other text is cut at
/// 300 chars, and a result without text content is shown whole.
fn render_exec_result(result: &serde_json::Value) -> anyhow::Result<String> {
    let Some(text) = result
        .pointer("/content/0/text")
        .and_then(serde_json::Value::as_str)
    else {
        return Ok(result.to_string());
    };
    Ok(match serde_json::from_str::<serde_json::Value>(text) {
        Ok(v) => {
            let pretty = serde_json::to_string_pretty(&v).context("render tool result")?;
            truncate_chars(&pretty, RESULT_PREVIEW).to_string()
        }
        Err(_) => truncate_chars(text, TEXT_RESULT_PREVIEW).to_string(),
    })
}

struct Printer<'w, W> {
    out: &'w mut W,
    color: bool,
}

impl<W: Write> Printer<'_, W> {
    fn step(&mut self, text: &str) -> std::io::Result<()> {
        if self.color {
            writeln!(self.out, "{}", text.bold())
        } else {
            writeln!(self.out, "{text}")
        }
    }

    fn line(&mut self, text: &str) -> std::io::Result<()> {
        writeln!(self.out, "{text}")
    }
}

/// Run the whole flow against the gateway at `options.base_url`, writing progress to `out`.
///
/// Finding no tools ends the flow early without an error.
///
/// # Errors
///
/// Returns an error if the gateway is unreachable, a step gets no result, `hodor-exec` reports
/// an error, or writing to `out` fails.
pub async fn run<W: Write>(options: &FlowOptions, out: &mut W) -> anyhow::Result<()> {
    let mut p = Printer {
        out,
        color: options.color,
    };

    p.step("=== Hodor MCP - hodor-find → hodor-exec flow ===")?;
    p.line("")?;
    let sse_url = McpSseSession::sse_url(&options.base_url)?;
    p.step(&format!("1. Connecting to {sse_url}..."))?;
    let mut session = McpSseSession::connect(&options.base_url)
        .await
        .context("cannot connect; is Hodor running?")?;
    p.line(&format!("   Messages URL: {}", session.messages_url()))?;
    p.line("")?;

    p.step("2. Sending initialize...")?;
    let server = session.initialize().await.context("initialize")?;
    p.line(&format!("   Server: {}", server.as_deref().unwrap_or("?")))?;
    p.line("")?;

    p.step(&format!("3. {FIND_TOOL}(query=\"{}\")...", options.query))?;
    let found = session
        .call_tool(2, FIND_TOOL, json!({ "query": options.query }))
        .await?;
    let tools = parse_tools(&unwrap_tool_payload(&result_of(&found, FIND_TOOL)?));
    tracing::info!(count = tools.len(), query = %options.query, "tools found");
    p.line(&format!("   Found {} tool(s):", tools.len()))?;
    for t in tools.iter().take(LISTED_TOOLS) {
        p.line(&format!(
            "      - {}: {}...",
            t.full_name,
            truncate_chars(&t.description, DESCRIPTION_PREVIEW)
        ))?;
    }
    if tools.len() > LISTED_TOOLS {
        p.line(&format!("      ... and {} more", tools.len() - LISTED_TOOLS))?;
    }
    p.line("")?;

    if tools.is_empty() {
        p.line("   No tools found. Try a different query or ensure servers are enabled.")?;
        return Ok(());
    }
    let Some(tool) = pick_tool(&tools, options.execute.as_deref()) else {
        return Ok(());
    };

    p.step(&format!("4. {SCHEMA_TOOL}(tool=\"{tool}\")..."))?;
    let schema = session
        .call_tool(3, SCHEMA_TOOL, json!({ "tool": tool }))
        .await?;
    match result_of(&schema, SCHEMA_TOOL) {
        Ok(_) => p.line("   Schema received")?,
        Err(e) => {
            tracing::warn!(error = %e, %tool, "schema lookup failed");
            p.line(&format!("   Schema unavailable: {e}"))?;
        }
    }
    p.line("")?;

    let args = exec_arguments(&tool);
    p.step(&format!("5. {EXEC_TOOL}(tool=\"{tool}\", arguments={args})..."))?;
    let executed = session
        .call_tool(4, EXEC_TOOL, json!({ "tool": tool, "arguments": args }))
        .await?;
    let rendered = render_exec_result(&result_of(&executed, EXEC_TOOL)?)?;
    p.line(&format!("   Result: {rendered}"))?;
    p.line("")?;
    p.step("=== Done ===")?;
    p.out.flush()?;
    Ok(())
}
