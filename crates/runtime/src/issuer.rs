//! Password exchange against the external identity provider.

use std::time::Duration;

use nebula_protocol::{TokenRequest, TokenResponse};
use tracing::{info, warn};
use url::Url;

use crate::error::{LoginError, ServicesError};

/// Exchanges user credentials for an access token.
///
/// The issuer never touches the session; the caller decides what to do with
/// the token.
#[derive(Debug, Clone)]
pub struct TokenIssuer {
	http: reqwest::Client,
	endpoint: Url,
	client_id: String,
}

impl TokenIssuer {
	pub fn new(endpoint: Url, client_id: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ServicesError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let http = builder.build().map_err(|e| ServicesError::HttpClient(e.to_string()))?;
		Ok(Self {
			http,
			endpoint,
			client_id: client_id.into(),
		})
	}

	pub fn endpoint(&self) -> &Url {
		&self.endpoint
	}

	/// Performs a single password-grant exchange and returns the access token.
	pub async fn exchange(&self, username: &str, password: &str) -> Result<String, LoginError> {
		if username.is_empty() || password.is_empty() {
			return Err(LoginError::MissingCredentials);
		}

		let form = TokenRequest::password(&self.client_id, username, password);
		let response = self
			.http
			.post(self.endpoint.clone())
			.form(&form)
			.send()
			.await
			.map_err(|e| LoginError::Network(e.to_string()))?;

		if !response.status().is_success() {
			warn!(target = "nebula.login", status = response.status().as_u16(), "token exchange rejected");
			return Err(LoginError::InvalidCredentials);
		}

		let body: TokenResponse = response.json().await.map_err(|e| LoginError::Decode(e.to_string()))?;
		if body.access_token.is_empty() {
			return Err(LoginError::Decode("empty access_token".into()));
		}

		info!(target = "nebula.login", username, "token issued");
		Ok(body.access_token)
	}
}
