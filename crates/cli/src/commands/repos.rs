//! One-shot repository commands.
//!
//! These call [`nebula_code::api`] directly instead of mounting the Code
//! module through the loader: there is no view to render, only data to print.
//! They still share the shell's client, session and query cache.

use nebula_code::api;
use tracing::info;

use super::require_session;
use crate::config::ShellConfig;
use crate::error::Result;
use crate::output::{LaunchData, RepoCreatedData, ReposData};
use crate::shell::Shell;

pub async fn list_repos(shell: &Shell, config: &ShellConfig) -> Result<ReposData> {
	require_session(shell)?;
	let repos = api::cached_repos(shell.services(), &config.project_id).await?;
	Ok(ReposData {
		project_id: config.project_id.clone(),
		repositories: repos.to_vec(),
	})
}

pub async fn create_repo(shell: &Shell, config: &ShellConfig, name: &str, description: Option<&str>) -> Result<RepoCreatedData> {
	require_session(shell)?;
	let services = shell.services();
	let repository = api::create_repo(services.api(), &config.project_id, name, description).await?;
	services.queries().invalidate(&api::repos_prefix());
	Ok(RepoCreatedData { repository })
}

/// Launches an IDE container. The returned proxy URL is absolute.
pub async fn launch(shell: &Shell, config: &ShellConfig, repo_id: &str) -> Result<LaunchData> {
	require_session(shell)?;
	let api = shell.services().api();
	let session = api::launch_ide(api, repo_id).await?;
	let proxy_url = api.resolve_link(&session.proxy_url)?;
	info!(target = "nebula.code", repo = repo_id, %proxy_url, "IDE ready");
	Ok(LaunchData {
		repository_id: repo_id.to_string(),
		proxy_url: proxy_url.to_string(),
		password_hint: config.ide_password_hint.clone(),
		session,
	})
}
