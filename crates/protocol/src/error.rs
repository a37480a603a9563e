//! Error payloads returned by the workspace backends.

use serde::{Deserialize, Serialize};

/// Structured error body (`{"message": "..."}`).
///
/// Backends are not consistent about including `message`, so it is optional
/// and callers fall back to their own wording when it is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
	#[serde(default)]
	pub message: Option<String>,
}

impl ErrorBody {
	/// Returns the message when present and non-empty.
	pub fn message(&self) -> Option<&str> {
		self.message.as_deref().filter(|m| !m.trim().is_empty())
	}
}
