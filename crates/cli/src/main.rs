use anyhow::Context;
use clap::Parser;
use nebula_shell::{cli::Cli, commands, logging};
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose).context("failed to initialize logging")?;

	if let Err(err) = commands::dispatch(cli).await {
		error!(target = "nebula", code = %err.code(), error = %err, "command failed");
		std::process::exit(1);
	}
	Ok(())
}
