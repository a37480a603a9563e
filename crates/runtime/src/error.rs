//! Error taxonomy shared by the shell and feature modules.
//!
//! Every variant carries owned strings so results can be cloned out of shared
//! in-flight futures (query cache, module loader).

use thiserror::Error;

/// Failure of a call made through [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
	/// The backend answered 401. The session has already been cleared.
	#[error("Session expired; please log in again")]
	AuthExpired,

	/// A client-side precondition failed; no request was sent.
	#[error("{0}")]
	Validation(String),

	/// Non-2xx, non-401 response.
	#[error("{message}")]
	RequestFailed { status: u16, message: String },

	/// The request never produced a response.
	#[error("Network error: {0}")]
	Network(String),

	/// A 2xx response whose body could not be decoded.
	#[error("Unexpected response: {0}")]
	Decode(String),

	#[error("Invalid request URL: {0}")]
	Url(String),
}

impl ClientError {
	pub fn validation(message: impl Into<String>) -> Self {
		ClientError::Validation(message.into())
	}

	pub fn is_auth_expired(&self) -> bool {
		matches!(self, ClientError::AuthExpired)
	}

	/// HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			ClientError::AuthExpired => Some(401),
			ClientError::RequestFailed { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Failure of the password exchange with the identity provider.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoginError {
	#[error("Invalid credentials")]
	InvalidCredentials,

	#[error("Please enter a username and password")]
	MissingCredentials,

	#[error("Network error: {0}")]
	Network(String),

	#[error("Unexpected token response: {0}")]
	Decode(String),
}

/// Failure persisting the durable key-value storage.
#[derive(Debug, Error)]
pub enum StorageError {
	#[error("storage I/O failed for {path}: {source}")]
	Io {
		path: String,
		#[source]
		source: std::io::Error,
	},

	#[error("storage serialization failed: {0}")]
	Serialize(#[from] serde_json::Error),
}

/// Failure building the host's shared services.
#[derive(Debug, Error)]
pub enum ServicesError {
	#[error("failed to create HTTP client: {0}")]
	HttpClient(String),
}

/// Result alias for API calls.
pub type Result<T, E = ClientError> = std::result::Result<T, E>;
