//! Read-through query cache with in-flight request de-duplication.
//!
//! Entries are keyed by [`QueryKey`] and hold either a shared in-flight fetch
//! or a settled value. Concurrent [`QueryCache::fetch`] calls for one key
//! await the same future, so the backend sees a single request and every
//! caller receives the same `Arc`.
//!
//! Successes stay cached until [`QueryCache::invalidate`] or
//! [`QueryCache::clear`] removes them.
//! Failures are never cached. Each in-flight fetch carries a generation; when
//! it settles, its result is stored only if the entry still belongs to that
//! generation, so a fetch that was invalidated mid-flight cannot overwrite
//! fresher state.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::ClientError;

type QueryValue = Arc<dyn Any + Send + Sync>;
type SharedFetch = Shared<BoxFuture<'static, Result<QueryValue, ClientError>>>;

/// Hierarchical cache key, e.g. `["repos", "<project id>"]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryKey(Vec<String>);

impl QueryKey {
	pub fn new<I, S>(parts: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self(parts.into_iter().map(Into::into).collect())
	}

	pub fn parts(&self) -> &[String] {
		&self.0
	}

	pub fn starts_with(&self, prefix: &QueryKey) -> bool {
		self.0.starts_with(&prefix.0)
	}
}

impl std::fmt::Display for QueryKey {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "[{}]", self.0.join(", "))
	}
}

enum EntryState {
	Fetching(SharedFetch),
	Ready(QueryValue),
}

struct Entry {
	generation: u64,
	state: EntryState,
}

/// Host-wide query cache. Constructed only by [`SharedServices`](crate::SharedServices).
pub struct QueryCache {
	entries: Mutex<HashMap<QueryKey, Entry>>,
	generation: AtomicU64,
}

impl std::fmt::Debug for QueryCache {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("QueryCache").field("entries", &self.entries.lock().len()).finish()
	}
}

impl QueryCache {
	pub(crate) fn new() -> Self {
		Self {
			entries: Mutex::new(HashMap::new()),
			generation: AtomicU64::new(0),
		}
	}

	/// Returns the cached value for `key`, joining or starting a fetch as needed.
	pub async fn fetch<T, F, Fut>(&self, key: QueryKey, fetcher: F) -> Result<Arc<T>, ClientError>
	where
		T: Send + Sync + 'static,
		F: FnOnce() -> Fut + Send,
		Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
	{
		let (shared, generation) = {
			let mut entries = self.entries.lock();
			match entries.get(&key) {
				Some(Entry {
					state: EntryState::Ready(value),
					..
				}) => {
					debug!(target = "nebula.query", %key, "cache hit");
					return downcast(&key, Arc::clone(value));
				}
				Some(Entry {
					state: EntryState::Fetching(shared),
					generation,
				}) => {
					debug!(target = "nebula.query", %key, "joining in-flight fetch");
					(shared.clone(), *generation)
				}
				None => {
					let generation = self.generation.fetch_add(1, Ordering::SeqCst);
					let fut = fetcher();
					let shared = async move { fut.await.map(|value| Arc::new(value) as QueryValue) }.boxed().shared();
					debug!(target = "nebula.query", %key, generation, "starting fetch");
					entries.insert(
						key.clone(),
						Entry {
							generation,
							state: EntryState::Fetching(shared.clone()),
						},
					);
					(shared, generation)
				}
			}
		};

		let result = shared.await;
		self.settle(&key, generation, &result);
		downcast(&key, result?)
	}

	/// Returns the settled value for `key` without fetching.
	pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
		let entries = self.entries.lock();
		match entries.get(key) {
			Some(Entry {
				state: EntryState::Ready(value),
				..
			}) => Arc::clone(value).downcast::<T>().ok(),
			_ => None,
		}
	}

	pub fn is_fetching(&self, key: &QueryKey) -> bool {
		matches!(
			self.entries.lock().get(key),
			Some(Entry {
				state: EntryState::Fetching(_),
				..
			})
		)
	}

	/// Drops every entry whose key starts with `prefix`. Returns how many were removed.
	pub fn invalidate(&self, prefix: &QueryKey) -> usize {
		let mut entries = self.entries.lock();
		let before = entries.len();
		entries.retain(|key, _| !key.starts_with(prefix));
		let removed = before - entries.len();
		debug!(target = "nebula.query", %prefix, removed, "invalidated");
		removed
	}

	/// Drops every entry. In-flight fetches still resolve for their callers
	/// but no longer populate the cache.
	pub fn clear(&self) {
		let mut entries = self.entries.lock();
		if !entries.is_empty() {
			debug!(target = "nebula.query", removed = entries.len(), "cleared");
			entries.clear();
		}
	}

	fn settle(&self, key: &QueryKey, generation: u64, result: &Result<QueryValue, ClientError>) {
		let mut entries = self.entries.lock();
		let current = entries.get(key).map(|entry| entry.generation);
		if current != Some(generation) {
			return;
		}
		match result {
			Ok(value) => {
				if let Some(entry) = entries.get_mut(key) {
					if matches!(entry.state, EntryState::Fetching(_)) {
						entry.state = EntryState::Ready(Arc::clone(value));
					}
				}
			}
			Err(_) => {
				entries.remove(key);
			}
		}
	}
}

fn downcast<T: Send + Sync + 'static>(key: &QueryKey, value: QueryValue) -> Result<Arc<T>, ClientError> {
	value
		.downcast::<T>()
		.map_err(|_| ClientError::Decode(format!("cached value for {key} has an unexpected type")))
}
