//! Typed payloads placed in the `data` field of command results.

use nebula_protocol::{LaunchResult, Resource};
use serde::Serialize;

use crate::shell::AuthState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
	pub state: AuthState,
	pub location: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutData {
	/// False when there was no session to clear.
	pub cleared: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusData {
	pub state: AuthState,
	pub location: String,
	pub api_url: String,
	pub token_url: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub storage: Option<String>,
	pub code_prefix: String,
	pub modules: Vec<ModuleStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleStatus {
	pub name: String,
	pub entry: String,
	pub bindings: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReposData {
	pub project_id: String,
	pub repositories: Vec<Resource>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepoCreatedData {
	pub repository: Resource,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchData {
	pub repository_id: String,
	/// Proxy URL resolved against the API base.
	pub proxy_url: String,
	pub password_hint: String,
	pub session: LaunchResult,
}
