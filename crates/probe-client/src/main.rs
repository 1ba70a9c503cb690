//! Probe the Hodor MCP Gateway's `/health`, `/ready` and `/api/tools` endpoints.
//!
//! Run: `HODOR_URL=http://localhost:8080 cargo run --bin hodor-probe`
//!
//! Failed probes are printed inline; the process exits successfully either way.

use hodor_probe::{config, logging, probe};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init("warn", false);

    let base_url = config::base_url_from_env();
    let client = probe::ProbeClient::new(base_url);
    let outcomes = client.report(&mut std::io::stdout().lock()).await?;

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    tracing::debug!(base_url = client.base_url(), failed, "probe run finished");
    Ok(())
}
