//! Calls to the code service.

use std::sync::Arc;

use nebula_protocol::{CreateResourceRequest, LaunchResult, Resource};
use nebula_runtime::{ApiClient, ClientError, QueryKey, Result, SharedServices};

pub const REPOS_PATH: &str = "/api/repos";

pub const EMPTY_NAME_MESSAGE: &str = "Please enter a repository name";

/// Cache key for the repository list of a project.
pub fn repos_key(project_id: &str) -> QueryKey {
	QueryKey::new(["repos", project_id])
}

/// Prefix covering every repository list.
pub fn repos_prefix() -> QueryKey {
	QueryKey::new(["repos"])
}

pub async fn list_repos(api: &ApiClient, project_id: &str) -> Result<Vec<Resource>> {
	api.get_json(REPOS_PATH, &[("projectId", project_id)], "Failed to load repos").await
}

/// Repository list through the shared query cache.
pub async fn cached_repos(services: &SharedServices, project_id: &str) -> Result<Arc<Vec<Resource>>> {
	let api = services.api().clone();
	let project = project_id.to_string();
	services
		.queries()
		.fetch(repos_key(project_id), move || async move { list_repos(&api, &project).await })
		.await
}

/// Creates a repository. An empty name fails without a request.
pub async fn create_repo(api: &ApiClient, project_id: &str, name: &str, description: Option<&str>) -> Result<Resource> {
	let name = name.trim();
	if name.is_empty() {
		return Err(ClientError::validation(EMPTY_NAME_MESSAGE));
	}
	let body = CreateResourceRequest {
		project_id: project_id.to_string(),
		name: name.to_string(),
		description: description.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
	};
	api.post_json(REPOS_PATH, &body, "Failed to create repo").await
}

/// Provisions an IDE for `repo_id`. The id travels as one encoded path
/// segment; empty and dot ids fail without a request.
pub async fn launch_ide(api: &ApiClient, repo_id: &str) -> Result<LaunchResult> {
	if matches!(repo_id, "" | "." | "..") {
		return Err(ClientError::validation(format!("Invalid repository id '{repo_id}'")));
	}
	api.post_empty(&["api", "repos", repo_id, "ide", "launch"], "Failed to launch IDE").await
}
