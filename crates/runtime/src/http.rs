//! Authenticated client for the workspace backends.
//!
//! Every call goes through [`ApiClient::call`], which:
//! 1. Attaches `Authorization: Bearer <token>` when a session exists
//! 2. Sends the request once (no retries)
//! 3. On 401 clears the session and replaces the location with `/` before
//!    returning [`ClientError::AuthExpired`]
//! 4. Maps any other non-2xx response to [`ClientError::RequestFailed`]

use std::sync::Arc;

use nebula_protocol::ErrorBody;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::error::{ClientError, Result};
use crate::navigator::Navigator;
use crate::session::{ClearReason, SessionStore};

/// Location the client is sent to when its credentials expire.
pub const LOGIN_ENTRY_POINT: &str = "/";

#[derive(Debug)]
struct ApiInner {
	http: reqwest::Client,
	base_url: Url,
	session: Arc<SessionStore>,
	navigator: Navigator,
}

/// Shared authenticated HTTP client. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
	inner: Arc<ApiInner>,
}

impl ApiClient {
	pub(crate) fn new(http: reqwest::Client, base_url: Url, session: Arc<SessionStore>, navigator: Navigator) -> Self {
		Self {
			inner: Arc::new(ApiInner {
				http,
				base_url,
				session,
				navigator,
			}),
		}
	}

	pub fn base_url(&self) -> &Url {
		&self.inner.base_url
	}

	/// Resolves an absolute API path (`/api/...`) against the base URL,
	/// keeping any path prefix the base URL carries.
	pub fn endpoint(&self, path: &str) -> Result<Url> {
		let mut url = self.inner.base_url.clone();
		let prefix = url.path().trim_end_matches('/').to_string();
		let suffix = path.trim_start_matches('/');
		url.set_path(&format!("{prefix}/{suffix}"));
		Ok(url)
	}

	/// Builds an endpoint from path segments, each percent-encoded on its own.
	/// Empty and dot segments are rejected, so ids taken from user input
	/// cannot reach a different route.
	pub fn endpoint_segments(&self, segments: &[&str]) -> Result<Url> {
		let mut url = self.inner.base_url.clone();
		{
			let mut path = url
				.path_segments_mut()
				.map_err(|()| ClientError::Url(format!("{} cannot carry a path", self.inner.base_url)))?;
			path.pop_if_empty();
			for segment in segments {
				if matches!(*segment, "" | "." | "..") {
					return Err(ClientError::validation(format!("Invalid path segment '{segment}'")));
				}
				path.push(segment);
			}
		}
		Ok(url)
	}

	/// Resolves a URL returned by a backend. Relative URLs are taken relative
	/// to the API origin.
	pub fn resolve_link(&self, link: &str) -> Result<Url> {
		self.inner
			.base_url
			.join(link)
			.map_err(|e| ClientError::Url(format!("{link}: {e}")))
	}

	pub fn request(&self, method: Method, path: &str) -> Result<RequestBuilder> {
		Ok(self.inner.http.request(method, self.endpoint(path)?))
	}

	/// Sends `request` with session credentials and classifies the response.
	///
	/// `context` names the operation; it becomes the error message when a
	/// failing response carries no usable message of its own.
	pub async fn call(&self, request: RequestBuilder, context: &str) -> Result<Response> {
		let request = match self.inner.session.token() {
			Some(token) => request.bearer_auth(token),
			None => request,
		};

		let response = request.send().await.map_err(|e| {
			warn!(target = "nebula.http", %context, error = %e, "request failed to complete");
			ClientError::Network(e.to_string())
		})?;

		let status = response.status();
		debug!(target = "nebula.http", %context, status = status.as_u16(), url = %response.url(), "response");

		if status == StatusCode::UNAUTHORIZED {
			self.expire_session(context);
			return Err(ClientError::AuthExpired);
		}

		if !status.is_success() {
			let body = response.text().await.ok();
			let message = failure_message(status, body.as_deref(), context);
			warn!(target = "nebula.http", %context, status = status.as_u16(), %message, "request rejected");
			return Err(ClientError::RequestFailed {
				status: status.as_u16(),
				message,
			});
		}

		Ok(response)
	}

	pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)], context: &str) -> Result<T> {
		let request = self.request(Method::GET, path)?.query(query);
		let response = self.call(request, context).await?;
		decode(response).await
	}

	pub async fn post_json<B, T>(&self, path: &str, body: &B, context: &str) -> Result<T>
	where
		B: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let request = self.request(Method::POST, path)?.json(body);
		let response = self.call(request, context).await?;
		decode(response).await
	}

	/// Body-less POST addressed by [`endpoint_segments`](Self::endpoint_segments).
	pub async fn post_empty<T: DeserializeOwned>(&self, segments: &[&str], context: &str) -> Result<T> {
		let request = self.inner.http.post(self.endpoint_segments(segments)?);
		let response = self.call(request, context).await?;
		decode(response).await
	}

	fn expire_session(&self, context: &str) {
		warn!(target = "nebula.http", %context, "authorization rejected; ending session");
		self.inner.session.clear(ClearReason::AuthExpired);
		self.inner.navigator.replace(LOGIN_ENTRY_POINT);
	}

	pub(crate) fn same_instance(&self, other: &ApiClient) -> bool {
		Arc::ptr_eq(&self.inner, &other.inner)
	}
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
	response.json::<T>().await.map_err(|e| ClientError::Decode(e.to_string()))
}

/// Picks the user-facing message for a failed response:
/// the body's `message` if the body is JSON carrying one, the status text if
/// the body is not JSON, and `"<context> (<status>)"` otherwise.
pub(crate) fn failure_message(status: StatusCode, body: Option<&str>, context: &str) -> String {
	let fallback = || format!("{context} ({})", status.as_u16());
	match body.map(|b| serde_json::from_str::<ErrorBody>(b)) {
		Some(Ok(parsed)) => parsed.message().map(String::from).unwrap_or_else(fallback),
		_ => status.canonical_reason().map(String::from).unwrap_or_else(fallback),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::query::QueryCache;
	use crate::storage::LocalStorage;

	fn client(base: &str) -> ApiClient {
		let (session, _writer) = SessionStore::open(LocalStorage::in_memory(), Arc::new(QueryCache::new()));
		ApiClient::new(reqwest::Client::new(), Url::parse(base).unwrap(), session.store(), Navigator::new("/"))
	}

	#[test]
	fn segments_are_encoded_individually() {
		let api = client("http://api.local/gateway/");
		let url = api.endpoint_segments(&["api", "repos", "a/b c", "ide", "launch"]).unwrap();
		assert_eq!(url.as_str(), "http://api.local/gateway/api/repos/a%2Fb%20c/ide/launch");
	}

	#[test]
	fn dot_and_empty_segments_are_rejected() {
		let api = client("http://api.local");
		for id in ["..", ".", ""] {
			let err = api.endpoint_segments(&["api", "repos", id, "ide", "launch"]).unwrap_err();
			assert!(matches!(err, ClientError::Validation(_)), "{id:?}");
		}
	}

	#[test]
	fn message_from_structured_body_wins() {
		let msg = failure_message(StatusCode::BAD_REQUEST, Some(r#"{"message":"Name taken"}"#), "Failed to create repo");
		assert_eq!(msg, "Name taken");
	}

	#[test]
	fn non_json_body_uses_status_text() {
		let msg = failure_message(StatusCode::INTERNAL_SERVER_ERROR, Some("<html>oops</html>"), "Failed to launch IDE");
		assert_eq!(msg, "Internal Server Error");
	}

	#[test]
	fn json_without_message_uses_context() {
		let msg = failure_message(StatusCode::FORBIDDEN, Some("{}"), "Failed to launch IDE");
		assert_eq!(msg, "Failed to launch IDE (403)");
	}

	#[test]
	fn blank_message_uses_context() {
		let msg = failure_message(StatusCode::CONFLICT, Some(r#"{"message":"  "}"#), "Failed to create repo");
		assert_eq!(msg, "Failed to create repo (409)");
	}
}
