//! Sample clients for the Hodor MCP Gateway.
//!
//! - [`probe`]: GET `/health`, `/ready` and `/api/tools` and print what comes back.
//! - [`tool_flow`]: the dynamic MCP flow (`hodor-find` → `hodor-schema` → `hodor-exec`) over the
//!   gateway's SSE transport, built on [`mcp_sse`].
//!
//! Both read the gateway base URL from `HODOR_URL` (see [`config`]).

pub mod config;
pub mod error;
pub mod logging;
pub mod mcp_sse;
pub mod probe;
pub mod tool_flow;
