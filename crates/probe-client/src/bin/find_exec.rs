//! Hodor MCP Gateway: hodor-find → hodor-schema → hodor-exec over the MCP SSE transport.
//!
//! Requires a running gateway. Usage: `hodor-find-exec [--query memory] [--execute time:now]`

use std::io::IsTerminal as _;

use clap::Parser;
use hodor_probe::config::{self, BASE_URL_ENV};
use hodor_probe::logging;
use hodor_probe::tool_flow::{self, FlowOptions};

#[derive(Parser, Debug)]
#[command(name = "hodor-find-exec", about = "Search, inspect and execute a Hodor tool")]
struct Cli {
    /// Search query for hodor-find.
    #[arg(short, long, default_value = "memory")]
    query: String,

    /// Tool to execute (`server:tool_name`). Picked from the search results if omitted.
    #[arg(short, long)]
    execute: Option<String>,

    /// Hodor base URL [default: $HODOR_URL, then http://localhost:8080].
    #[arg(long)]
    url: Option<String>,

    #[arg(long, default_value = "warn")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Cli {
    /// `--url`, else `HODOR_URL`, else the default; empty values count as unset.
    fn base_url(&self, env_value: Option<String>) -> String {
        config::resolve_flag_or_env(self.url.clone(), env_value)
            .trim_end_matches('/')
            .to_string()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.log_json);

    let stdout = std::io::stdout();
    let options = FlowOptions {
        base_url: cli.base_url(std::env::var(BASE_URL_ENV).ok()),
        query: cli.query,
        execute: cli.execute,
        color: stdout.is_terminal(),
    };
    tool_flow::run(&options, &mut stdout.lock()).await
}
