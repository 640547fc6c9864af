//! Proxy entrypoint.

// Bin target reuses lib deps, silence noisy lint.
#![allow(unused_crate_dependencies)]

use anyhow::Context;
use clap::Parser;
use orbit_folio_proxy::{AppState, IsahcCompletions, Opts, serve};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
		.init();

	let opts = Opts::parse();
	let bind = opts.bind;
	let config = opts
		.into_config(std::env::var("OPENAI_API_KEY").ok())
		.context("failed to read the system prompt file")?;

	if config.api_key.is_none() {
		log::warn!("no API key configured; chat requests will fail until one is set");
	}

	let upstream = IsahcCompletions::new(config.upstream_url.clone()).context("failed to build the HTTP client")?;
	serve(bind, AppState::new(config, upstream))
		.await
		.with_context(|| format!("failed to serve on {bind}"))
}
