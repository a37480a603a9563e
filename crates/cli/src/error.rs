use nebula_runtime::{ClientError, LoginError, ModuleLoadError, RegistryError, ServicesError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::output::ErrorCode;

#[derive(Debug, Error)]
pub enum ShellError {
	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Client(#[from] ClientError),

	#[error(transparent)]
	Login(#[from] LoginError),

	#[error(transparent)]
	ModuleLoad(#[from] ModuleLoadError),

	#[error(transparent)]
	Services(#[from] ServicesError),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error("Not logged in; run `nebula login` first")]
	NotLoggedIn,

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("failed to encode output: {0}")]
	Encode(#[from] serde_json::Error),
}

pub type Result<T, E = ShellError> = std::result::Result<T, E>;

impl ShellError {
	pub fn code(&self) -> ErrorCode {
		match self {
			ShellError::Config(_) => ErrorCode::ConfigError,
			ShellError::Client(err) => match err {
				ClientError::AuthExpired => ErrorCode::AuthExpired,
				ClientError::Validation(_) => ErrorCode::ValidationFailed,
				ClientError::RequestFailed { .. } => ErrorCode::RequestFailed,
				ClientError::Network(_) => ErrorCode::NetworkError,
				ClientError::Decode(_) => ErrorCode::ProtocolError,
				ClientError::Url(_) => ErrorCode::InvalidInput,
			},
			ShellError::Login(err) => match err {
				LoginError::InvalidCredentials => ErrorCode::InvalidCredentials,
				LoginError::MissingCredentials => ErrorCode::InvalidInput,
				LoginError::Network(_) => ErrorCode::NetworkError,
				LoginError::Decode(_) => ErrorCode::ProtocolError,
			},
			ShellError::ModuleLoad(_) => ErrorCode::ModuleLoadFailed,
			ShellError::NotLoggedIn => ErrorCode::NotLoggedIn,
			ShellError::Io(_) => ErrorCode::IoError,
			ShellError::Services(_) | ShellError::Registry(_) | ShellError::Encode(_) => ErrorCode::InternalError,
		}
	}

	/// Structured context for the error envelope.
	pub fn details(&self) -> Option<serde_json::Value> {
		match self {
			ShellError::Client(err) => err.status().map(|status| serde_json::json!({ "status": status })),
			ShellError::ModuleLoad(err) => Some(serde_json::json!({ "kind": err.kind() })),
			_ => None,
		}
	}
}
