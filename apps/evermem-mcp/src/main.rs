use clap::Parser;

use evermem_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	evermem_mcp::run(args).await
}
