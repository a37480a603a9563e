//! Shell configuration.
//!
//! Resolution order, later wins: built-in defaults, the JSON config file
//! (`--config` or `$XDG_CONFIG_HOME/nebula/workspace.json`), `NEBULA_*`
//! environment variables, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use nebula_code::{CodeSettings, DEFAULT_PASSWORD_HINT, DEFAULT_PROJECT_ID};
use nebula_runtime::{DEFAULT_TIMEOUT_SECS, EntrySource, normalize_path};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

const CONFIG_SCHEMA_VERSION: u32 = 1;

pub const DEFAULT_API_URL: &str = "http://localhost:8090";
pub const DEFAULT_TOKEN_URL: &str = "http://localhost:8080/realms/nebula/protocol/openid-connect/token";
pub const DEFAULT_CLIENT_ID: &str = "workspace";
pub const DEFAULT_CODE_PREFIX: &str = "/repos";

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("failed to read config {path}: {source}")]
	Read {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to parse config {path}: {source}")]
	Parse {
		path: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("invalid value for {var}: {value:?} ({reason})")]
	InvalidEnv { var: String, value: String, reason: String },

	#[error("invalid {field} URL {value:?}: {reason}")]
	InvalidUrl { field: &'static str, value: String, reason: String },

	#[error("invalid route prefix {0:?}: must name a path below /")]
	InvalidPrefix(String),
}

/// On-disk configuration file. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShellConfig {
	pub schema: u32,
	/// Base URL of the workspace backends (`/api/...`).
	pub api_url: String,
	/// Identity provider token endpoint.
	pub token_url: String,
	pub client_id: String,
	pub project_id: String,
	/// Where the code module's entry manifest is served. `None` uses the bundled manifest.
	pub code_entry_url: Option<String>,
	/// Reserved location prefix owned by the code module.
	pub code_prefix: String,
	/// Per-request timeout in seconds. `0` disables the timeout.
	pub timeout_secs: u64,
	/// Session storage file. Defaults to `<config home>/nebula/storage.json`.
	pub storage_path: Option<PathBuf>,
	pub ide_password_hint: String,
}

impl Default for ShellConfig {
	fn default() -> Self {
		Self {
			schema: CONFIG_SCHEMA_VERSION,
			api_url: DEFAULT_API_URL.into(),
			token_url: DEFAULT_TOKEN_URL.into(),
			client_id: DEFAULT_CLIENT_ID.into(),
			project_id: DEFAULT_PROJECT_ID.into(),
			code_entry_url: None,
			code_prefix: DEFAULT_CODE_PREFIX.into(),
			timeout_secs: DEFAULT_TIMEOUT_SECS,
			storage_path: None,
			ide_password_hint: DEFAULT_PASSWORD_HINT.into(),
		}
	}
}

impl ShellConfig {
	/// Loads `path`, or the default config file when `path` is `None`.
	///
	/// A missing default file yields defaults; a missing explicit file is an error.
	pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
		let (path, explicit) = match path {
			Some(path) => (path.to_path_buf(), true),
			None => (default_config_path(), false),
		};
		let content = match fs::read_to_string(&path) {
			Ok(content) => content,
			Err(err) if !explicit && err.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
			Err(source) => {
				return Err(ConfigError::Read {
					path: path.display().to_string(),
					source,
				});
			}
		};
		serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
			path: path.display().to_string(),
			source,
		})
	}

	/// Applies `NEBULA_*` overrides. `lookup` is `std::env::var` in production.
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let set = |target: &mut String, var: &str| {
			if let Some(value) = lookup(var).filter(|v| !v.trim().is_empty()) {
				*target = value;
			}
		};
		set(&mut self.api_url, "NEBULA_API_URL");
		set(&mut self.token_url, "NEBULA_TOKEN_URL");
		set(&mut self.client_id, "NEBULA_CLIENT_ID");
		set(&mut self.project_id, "NEBULA_PROJECT_ID");

		if let Some(value) = lookup("NEBULA_CODE_ENTRY_URL") {
			let value = value.trim();
			self.code_entry_url = if value.is_empty() || value == "bundled" { None } else { Some(value.to_string()) };
		}

		if let Some(value) = lookup("NEBULA_TIMEOUT_SECS") {
			self.timeout_secs = value.trim().parse::<u64>().map_err(|e| ConfigError::InvalidEnv {
				var: "NEBULA_TIMEOUT_SECS".into(),
				value: value.clone(),
				reason: e.to_string(),
			})?;
		}
		Ok(())
	}

	pub fn api_url(&self) -> Result<Url, ConfigError> {
		parse_url("api", &self.api_url)
	}

	pub fn token_url(&self) -> Result<Url, ConfigError> {
		parse_url("token", &self.token_url)
	}

	pub fn code_entry(&self) -> Result<EntrySource, ConfigError> {
		match &self.code_entry_url {
			Some(url) => Ok(EntrySource::Remote(parse_url("code entry", url)?)),
			None => Ok(EntrySource::Bundled(nebula_code::manifest())),
		}
	}

	pub fn code_settings(&self) -> CodeSettings {
		CodeSettings {
			project_id: self.project_id.clone(),
			password_hint: self.ide_password_hint.clone(),
		}
	}

	/// Normalized module prefix; `/` is reserved for the home view.
	pub fn code_prefix(&self) -> Result<String, ConfigError> {
		let prefix = normalize_path(&self.code_prefix);
		if prefix == "/" {
			return Err(ConfigError::InvalidPrefix(self.code_prefix.clone()));
		}
		Ok(prefix)
	}

	pub fn request_timeout(&self) -> Option<Duration> {
		(self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
	}

	pub fn storage_path(&self) -> PathBuf {
		self.storage_path
			.clone()
			.unwrap_or_else(|| config_home().join("nebula/storage.json"))
	}
}

fn parse_url(field: &'static str, value: &str) -> Result<Url, ConfigError> {
	Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
		field,
		value: value.to_string(),
		reason: e.to_string(),
	})
}

/// `$XDG_CONFIG_HOME`, falling back to `~/.config`.
pub fn config_home() -> PathBuf {
	std::env::var_os("XDG_CONFIG_HOME")
		.filter(|v| !v.is_empty())
		.map(PathBuf::from)
		.or_else(|| dirs::home_dir().map(|h| h.join(".config")))
		.unwrap_or_else(|| PathBuf::from("."))
}

pub fn default_config_path() -> PathBuf {
	config_home().join("nebula/workspace.json")
}
