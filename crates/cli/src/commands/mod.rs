//! Command dispatch.
//!
//! Every one-shot command builds a [`Shell`] from the resolved configuration,
//! runs against it and prints one result envelope. The interactive shell
//! prints one envelope per frame instead.

mod interactive;
mod render;
mod repos;
mod session;

use std::time::Instant;

use nebula_runtime::LocalStorage;
use serde::Serialize;
use tracing::debug;

use crate::cli::{Cli, Commands, ReposAction};
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::output::{OutputFormat, ResultBuilder, print_result};
use crate::shell::{AuthState, Shell};

pub use interactive::{ReplCommand, apply, parse_line, run_script};
pub use render::render;
pub use repos::{create_repo, launch, list_repos};
pub use session::{login, logout, status};

/// Resolves configuration: file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<ShellConfig> {
	let mut config = ShellConfig::load(cli.config.as_deref())?;
	config.apply_env(|key| std::env::var(key).ok())?;
	if let Some(api_url) = &cli.api_url {
		config.api_url = api_url.clone();
	}
	Ok(config)
}

pub fn open_storage(config: &ShellConfig, ephemeral: bool) -> LocalStorage {
	if ephemeral {
		LocalStorage::in_memory()
	} else {
		LocalStorage::load(config.storage_path())
	}
}

/// Runs the parsed command line and prints its result.
pub async fn dispatch(cli: Cli) -> Result<()> {
	let started = Instant::now();
	let name = cli.command.name();
	let format = cli.format;

	let outcome = match run(cli, format).await {
		Ok(Some(data)) => Ok(data),
		Ok(None) => return Ok(()),
		Err(err) => Err(err),
	};
	finish(name, started, format, outcome)
}

async fn run(cli: Cli, format: OutputFormat) -> Result<Option<serde_json::Value>> {
	let config = resolve_config(&cli)?;
	let storage = open_storage(&config, cli.ephemeral);
	debug!(target = "nebula.shell", api = %config.api_url, storage = ?storage.path(), "starting");
	let mut shell = Shell::from_config(&config, storage)?;

	let data = match cli.command {
		Commands::Login { username, password } => to_json(login(&mut shell, &username, &password).await?)?,
		Commands::Logout => to_json(logout(&mut shell))?,
		Commands::Status => to_json(status(&shell, &config))?,
		Commands::Repos { action: ReposAction::List } => to_json(list_repos(&shell, &config).await?)?,
		Commands::Repos {
			action: ReposAction::Create { name, description },
		} => to_json(create_repo(&shell, &config, &name, description.as_deref()).await?)?,
		Commands::Launch { id } => to_json(launch(&shell, &config, &id).await?)?,
		Commands::Render { path } => to_json(render(&mut shell, &path).await)?,
		Commands::Shell => {
			let stdin = tokio::io::BufReader::new(tokio::io::stdin());
			run_script(&mut shell, stdin, format).await?;
			return Ok(None);
		}
	};
	Ok(Some(data))
}

fn finish(name: &str, started: Instant, format: OutputFormat, outcome: Result<serde_json::Value>) -> Result<()> {
	match outcome {
		Ok(data) => {
			print_result(&ResultBuilder::new(name).started_at(started).data(data).build(), format);
			Ok(())
		}
		Err(err) => {
			let builder = ResultBuilder::<()>::new(name).started_at(started);
			let builder = match err.details() {
				Some(details) => builder.error_with_details(err.code(), err.to_string(), details),
				None => builder.error(err.code(), err.to_string()),
			};
			print_result(&builder.build(), format);
			Err(err)
		}
	}
}

fn to_json<T: Serialize>(data: T) -> Result<serde_json::Value> {
	Ok(serde_json::to_value(data)?)
}

fn require_session(shell: &Shell) -> Result<()> {
	match shell.auth_state() {
		AuthState::LoggedIn => Ok(()),
		AuthState::LoggedOut => Err(ShellError::NotLoggedIn),
	}
}
