//! The host's shared services.
//!
//! One [`SharedServices`] value is built at startup and passed explicitly to
//! every remote module factory. Modules never construct their own session,
//! client, cache or navigator; the loader hands them the host's instances.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::error::ServicesError;
use crate::http::ApiClient;
use crate::navigator::Navigator;
use crate::query::QueryCache;
use crate::session::{SessionContext, SessionStore, SessionWriter};
use crate::storage::LocalStorage;

/// Services every remote module must share with the host, by name.
pub const SHARED_DEPENDENCIES: [&str; 4] = ["api-client", "navigator", "query-cache", "session"];

pub fn shared_dependency_set() -> BTreeSet<String> {
	SHARED_DEPENDENCIES.iter().map(|s| s.to_string()).collect()
}

/// Inputs for [`SharedServices::new`].
#[derive(Debug)]
pub struct ServicesConfig {
	pub api_base_url: Url,
	/// Per-request timeout. `None` waits indefinitely.
	pub request_timeout: Option<Duration>,
	pub storage: LocalStorage,
	pub initial_location: String,
}

/// Host-owned singletons shared with every feature module. Cheap to clone;
/// clones refer to the same instances.
#[derive(Debug, Clone)]
pub struct SharedServices {
	session: SessionContext,
	api: ApiClient,
	queries: Arc<QueryCache>,
	navigator: Navigator,
}

impl SharedServices {
	/// Builds the shared services and returns the single session writer
	/// alongside them.
	pub fn new(config: ServicesConfig) -> Result<(Self, SessionWriter), ServicesError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = config.request_timeout {
			builder = builder.timeout(timeout);
		}
		let http = builder.build().map_err(|e| ServicesError::HttpClient(e.to_string()))?;

		let queries = Arc::new(QueryCache::new());
		let (session, writer) = SessionStore::open(config.storage, Arc::clone(&queries));
		let navigator = Navigator::new(&config.initial_location);
		let api = ApiClient::new(http, config.api_base_url, session.store(), navigator.clone());

		debug!(target = "nebula.services", api = %api.base_url(), location = %navigator.location(), "shared services ready");

		Ok((
			Self {
				session,
				api,
				queries,
				navigator,
			},
			writer,
		))
	}

	pub fn session(&self) -> &SessionContext {
		&self.session
	}

	pub fn api(&self) -> &ApiClient {
		&self.api
	}

	pub fn queries(&self) -> &QueryCache {
		&self.queries
	}

	pub fn navigator(&self) -> &Navigator {
		&self.navigator
	}

	/// True when every service in `other` is the same instance as in `self`.
	pub fn same_instances(&self, other: &SharedServices) -> bool {
		self.session.same_store(&other.session)
			&& self.api.same_instance(&other.api)
			&& Arc::ptr_eq(&self.queries, &other.queries)
			&& self.navigator.same_instance(&other.navigator)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn services() -> (SharedServices, SessionWriter) {
		SharedServices::new(ServicesConfig {
			api_base_url: Url::parse("http://127.0.0.1:9").unwrap(),
			request_timeout: Some(Duration::from_secs(5)),
			storage: LocalStorage::in_memory(),
			initial_location: "/".into(),
		})
		.unwrap()
	}

	#[test]
	fn clones_share_instances() {
		let (services, _writer) = services();
		let clone = services.clone();
		assert!(services.same_instances(&clone));

		let (other, _) = self::services();
		assert!(!services.same_instances(&other));
	}

	#[test]
	fn writer_updates_are_seen_by_the_shared_context() {
		let (services, writer) = services();
		writer.set_token("T");
		assert!(services.clone().session().is_authenticated());
	}

	#[test]
	fn dependency_set_is_sorted_and_complete() {
		let set = shared_dependency_set();
		assert_eq!(set.len(), SHARED_DEPENDENCIES.len());
		assert!(set.contains("query-cache"));
	}
}
