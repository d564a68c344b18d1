pub mod error;
pub mod format;
pub mod server;
pub mod tools;

use std::{io, path::PathBuf};

use clap::Parser;
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use crate::tools::MemoryTools;
use evermem_config::DEFAULT_LOG_LEVEL;

#[derive(Debug, Parser)]
#[command(
	version = evermem_cli::VERSION,
	rename_all = "kebab",
	styles = evermem_cli::styles(),
)]
pub struct Args {
	/// Optional TOML config. Values set here win over EVERMEM_* environment variables.
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: Option<PathBuf>,
	/// Log filter directive, e.g. `debug` or `evermem_client=trace`. Logs go to stderr.
	#[arg(long, value_name = "LEVEL")]
	pub log_level: Option<String>,
}

pub async fn run(args: Args) -> Result<()> {
	let config = evermem_config::load(args.config.as_deref())?;

	init_tracing(args.log_level.as_deref().unwrap_or(&config.log_level));

	tracing::info!(
		user_id = %config.defaults.user_id,
		group_id = %config.defaults.group_id,
		"Default identifiers resolved."
	);

	server::serve_stdio(MemoryTools::from_config(&config)).await
}

// stdout carries the MCP protocol stream, so diagnostics must stay on stderr.
fn init_tracing(directive: &str) {
	let filter =
		EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(io::stderr)
		.with_ansi(false)
		.init();
}
