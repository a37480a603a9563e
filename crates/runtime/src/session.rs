//! Bearer-token session store.
//!
//! The store is opened exactly once, by [`SharedServices::new`](crate::SharedServices::new),
//! which hands out two capabilities:
//!
//! * [`SessionContext`]: cloneable read-only view given to every component.
//! * [`SessionWriter`]: the single mutation entry point, owned by the shell
//!   (login/logout). The authenticated client clears the store on 401 through
//!   crate-private access.
//!
//! There is no change notification. Consumers consult the context on every
//! render, so a cleared token shows up the next time anyone looks.
//!
//! Every token change empties the host's [`QueryCache`]: cached responses
//! belong to the credentials that fetched them.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::query::QueryCache;
use crate::storage::LocalStorage;

/// Well-known storage key holding the bearer token.
pub const TOKEN_KEY: &str = "token";

/// Why a session was cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
	Logout,
	AuthExpired,
}

impl std::fmt::Display for ClearReason {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ClearReason::Logout => write!(f, "logout"),
			ClearReason::AuthExpired => write!(f, "auth_expired"),
		}
	}
}

#[derive(Debug)]
pub(crate) struct SessionStore {
	storage: Mutex<LocalStorage>,
	queries: Arc<QueryCache>,
}

impl SessionStore {
	pub(crate) fn open(storage: LocalStorage, queries: Arc<QueryCache>) -> (SessionContext, SessionWriter) {
		let store = Arc::new(Self {
			storage: Mutex::new(storage),
			queries,
		});
		(SessionContext { store: Arc::clone(&store) }, SessionWriter { store })
	}

	pub(crate) fn token(&self) -> Option<String> {
		self.storage
			.lock()
			.get(TOKEN_KEY)
			.filter(|t| !t.is_empty())
			.map(String::from)
	}

	fn set_token(&self, token: &str) {
		{
			let mut storage = self.storage.lock();
			if let Err(err) = storage.set(TOKEN_KEY, token) {
				warn!(target = "nebula.session", error = %err, "failed to persist session token");
			}
			info!(target = "nebula.session", persisted = storage.path().is_some(), "session established");
		}
		self.queries.clear();
	}

	pub(crate) fn clear(&self, reason: ClearReason) -> bool {
		let removed = self.storage.lock().remove(TOKEN_KEY);
		self.queries.clear();
		match removed {
			Ok(existed) => {
				if existed {
					info!(target = "nebula.session", %reason, "session cleared");
				}
				existed
			}
			Err(err) => {
				warn!(target = "nebula.session", %reason, error = %err, "failed to persist session removal");
				true
			}
		}
	}
}

/// Read-only handle to the current session.
#[derive(Debug, Clone)]
pub struct SessionContext {
	store: Arc<SessionStore>,
}

impl SessionContext {
	/// Current bearer token. Empty tokens count as absent.
	pub fn token(&self) -> Option<String> {
		self.store.token()
	}

	pub fn is_authenticated(&self) -> bool {
		self.token().is_some()
	}

	pub(crate) fn store(&self) -> Arc<SessionStore> {
		Arc::clone(&self.store)
	}

	/// True when both handles refer to the same store instance.
	pub fn same_store(&self, other: &SessionContext) -> bool {
		Arc::ptr_eq(&self.store, &other.store)
	}
}

/// The designated session mutation entry point. Not cloneable.
#[derive(Debug)]
pub struct SessionWriter {
	store: Arc<SessionStore>,
}

impl SessionWriter {
	pub fn set_token(&self, token: &str) {
		self.store.set_token(token);
	}

	/// Clears the session. Returns whether a token was present.
	pub fn clear(&self, reason: ClearReason) -> bool {
		self.store.clear(reason)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error::ClientError;
	use crate::query::QueryKey;
	use tempfile::TempDir;

	#[test]
	fn writer_changes_are_visible_through_context() {
		let (ctx, writer) = SessionStore::open(LocalStorage::in_memory(), Arc::new(QueryCache::new()));
		assert!(!ctx.is_authenticated());

		writer.set_token("T");
		assert_eq!(ctx.token().as_deref(), Some("T"));

		assert!(writer.clear(ClearReason::Logout));
		assert_eq!(ctx.token(), None);
		assert!(!writer.clear(ClearReason::Logout));
	}

	#[test]
	fn empty_token_counts_as_logged_out() {
		let (ctx, writer) = SessionStore::open(LocalStorage::in_memory(), Arc::new(QueryCache::new()));
		writer.set_token("");
		assert!(!ctx.is_authenticated());
	}

	#[test]
	fn token_survives_reopen() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("storage.json");

		let (_, writer) = SessionStore::open(LocalStorage::load(path.clone()), Arc::new(QueryCache::new()));
		writer.set_token("persisted");

		let (ctx, _) = SessionStore::open(LocalStorage::load(path), Arc::new(QueryCache::new()));
		assert_eq!(ctx.token().as_deref(), Some("persisted"));
	}

	#[tokio::test]
	async fn token_changes_empty_the_query_cache() {
		let queries = Arc::new(QueryCache::new());
		let (_, writer) = SessionStore::open(LocalStorage::in_memory(), Arc::clone(&queries));
		let key = QueryKey::new(["repos", "p1"]);

		writer.set_token("alice");
		queries.fetch(key.clone(), || async { Ok::<_, ClientError>(1u32) }).await.unwrap();
		writer.clear(ClearReason::Logout);
		assert!(queries.peek::<u32>(&key).is_none());

		queries.fetch(key.clone(), || async { Ok::<_, ClientError>(2u32) }).await.unwrap();
		writer.set_token("bob");
		assert!(queries.peek::<u32>(&key).is_none());
	}
}
