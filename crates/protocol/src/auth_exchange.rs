//! OAuth2 resource-owner password exchange with the identity provider.

use serde::{Deserialize, Serialize};

/// Grant type sent with every password exchange.
pub const PASSWORD_GRANT: &str = "password";

/// Form body posted to the token endpoint (`application/x-www-form-urlencoded`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenRequest {
	pub client_id: String,
	pub grant_type: String,
	pub username: String,
	pub password: String,
}

impl TokenRequest {
	pub fn password(client_id: impl Into<String>, username: impl Into<String>, password: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			grant_type: PASSWORD_GRANT.to_string(),
			username: username.into(),
			password: password.into(),
		}
	}
}

/// Successful token endpoint response. Only `access_token` is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
	pub access_token: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<String>,
}
