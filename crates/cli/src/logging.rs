//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise `-v` raises the workspace targets to
//! `info` and `-vv` to `debug`; the default only shows warnings. Logs go to
//! stderr so stdout stays a clean result stream.

use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

pub fn default_directives(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn",
		1 => "warn,nebula=info",
		2 => "info,nebula=debug",
		_ => "debug",
	}
}

pub fn init_logging(verbose: u8) -> anyhow::Result<()> {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives(verbose)));

	registry()
		.with(fmt::layer().with_writer(std::io::stderr).with_target(true).with_filter(filter))
		.try_init()?;
	Ok(())
}
