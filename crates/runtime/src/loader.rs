//! On-demand loading of registered feature modules.
//!
//! A load resolves the descriptor, obtains the entry manifest (fetched once
//! per loader for remote entries), checks that the manifest exposes the
//! requested binding and declares exactly the host's shared dependency set,
//! and only then runs the module factory with the host's [`SharedServices`].
//!
//! Manifests and initialized bindings are cached for the loader's lifetime.
//! Concurrent loads of the same binding await one shared future. A failed
//! attempt is evicted so the next load starts over.

use std::collections::{BTreeSet, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use nebula_protocol::RemoteEntryManifest;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::ServicesError;
use crate::registry::{EntrySource, ModuleRegistry, RemoteModule, RemoteModuleDescriptor};
use crate::services::{SharedServices, shared_dependency_set};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModuleLoadError {
	#[error("Module '{name}' is not registered")]
	NotFound { name: String },

	#[error("Failed to fetch entry for '{name}' from {url}: {message}")]
	Fetch { name: String, url: String, message: String },

	#[error("Invalid entry manifest for '{name}': {message}")]
	InvalidManifest { name: String, message: String },

	#[error("Module '{name}' does not expose '{binding}'")]
	BindingNotExposed { name: String, binding: String },

	#[error("Module '{name}' shared dependencies differ from the host (missing: {missing:?}, unexpected: {unexpected:?})")]
	SharedMismatch {
		name: String,
		missing: Vec<String>,
		unexpected: Vec<String>,
	},

	#[error("Module '{name}' failed to initialize '{binding}': {message}")]
	Init { name: String, binding: String, message: String },
}

impl ModuleLoadError {
	/// Short machine-readable kind, used in logs and error envelopes.
	pub fn kind(&self) -> &'static str {
		match self {
			ModuleLoadError::NotFound { .. } => "not_found",
			ModuleLoadError::Fetch { .. } => "fetch",
			ModuleLoadError::InvalidManifest { .. } => "invalid_manifest",
			ModuleLoadError::BindingNotExposed { .. } => "binding_not_exposed",
			ModuleLoadError::SharedMismatch { .. } => "shared_mismatch",
			ModuleLoadError::Init { .. } => "init",
		}
	}
}

/// An initialized binding of a feature module.
#[derive(Clone)]
pub struct LoadedModule {
	pub name: String,
	pub binding: String,
	pub module: Arc<dyn RemoteModule>,
}

impl std::fmt::Debug for LoadedModule {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LoadedModule")
			.field("name", &self.name)
			.field("binding", &self.binding)
			.finish_non_exhaustive()
	}
}

type SharedManifest = Shared<BoxFuture<'static, Result<Arc<RemoteEntryManifest>, ModuleLoadError>>>;
type SharedBinding = Shared<BoxFuture<'static, Result<LoadedModule, ModuleLoadError>>>;
type BindingKey = (String, String);

struct LoaderInner {
	registry: ModuleRegistry,
	services: SharedServices,
	http: reqwest::Client,
	manifests: Mutex<HashMap<String, SharedManifest>>,
	bindings: Mutex<HashMap<BindingKey, SharedBinding>>,
}

/// Loads feature modules registered in a [`ModuleRegistry`]. Cheap to clone.
#[derive(Clone)]
pub struct ModuleLoader {
	inner: Arc<LoaderInner>,
}

impl std::fmt::Debug for ModuleLoader {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ModuleLoader")
			.field("registry", &self.inner.registry)
			.finish_non_exhaustive()
	}
}

impl ModuleLoader {
	pub fn new(registry: ModuleRegistry, services: SharedServices, timeout: Option<Duration>) -> Result<Self, ServicesError> {
		let mut builder = reqwest::Client::builder();
		if let Some(timeout) = timeout {
			builder = builder.timeout(timeout);
		}
		let http = builder.build().map_err(|e| ServicesError::HttpClient(e.to_string()))?;
		Ok(Self {
			inner: Arc::new(LoaderInner {
				registry,
				services,
				http,
				manifests: Mutex::new(HashMap::new()),
				bindings: Mutex::new(HashMap::new()),
			}),
		})
	}

	pub fn services(&self) -> &SharedServices {
		&self.inner.services
	}

	pub fn registry(&self) -> &ModuleRegistry {
		&self.inner.registry
	}

	/// True when `binding` of `name` has been initialized and is cached.
	pub fn is_loaded(&self, name: &str, binding: &str) -> bool {
		let key = (name.to_string(), binding.to_string());
		self.inner
			.bindings
			.lock()
			.get(&key)
			.and_then(|fut| fut.peek())
			.is_some_and(Result::is_ok)
	}

	/// Loads `binding` of module `name`. The returned future owns everything it
	/// needs, so it can be spawned and dropped independently of the loader.
	pub fn load(&self, name: &str, binding: &str) -> BoxFuture<'static, Result<LoadedModule, ModuleLoadError>> {
		let key: BindingKey = (name.to_string(), binding.to_string());
		let shared = {
			let mut bindings = self.inner.bindings.lock();
			match bindings.get(&key) {
				Some(existing) => existing.clone(),
				None => {
					let inner = Arc::clone(&self.inner);
					let (name, binding) = key.clone();
					let fut = async move { inner.initialize(&name, &binding).await }.boxed().shared();
					bindings.insert(key.clone(), fut.clone());
					fut
				}
			}
		};

		let inner = Arc::clone(&self.inner);
		async move {
			let result = shared.clone().await;
			if let Err(err) = &result {
				warn!(target = "nebula.loader", module = %key.0, binding = %key.1, kind = err.kind(), error = %err, "module load failed");
				evict(&inner.bindings, &key, &shared);
			}
			result
		}
		.boxed()
	}
}

impl LoaderInner {
	async fn initialize(self: Arc<Self>, name: &str, binding: &str) -> Result<LoadedModule, ModuleLoadError> {
		let descriptor = self
			.registry
			.resolve(name)
			.ok_or_else(|| ModuleLoadError::NotFound { name: name.to_string() })?;

		let manifest = self.manifest(descriptor).await?;
		verify_manifest(name, binding, &manifest)?;

		let factory = descriptor
			.exposed
			.get(binding)
			.ok_or_else(|| ModuleLoadError::BindingNotExposed {
				name: name.to_string(),
				binding: binding.to_string(),
			})?;

		let init_error = |message: String| ModuleLoadError::Init {
			name: name.to_string(),
			binding: binding.to_string(),
			message,
		};
		let module = match catch_unwind(AssertUnwindSafe(|| factory(&self.services))) {
			Ok(Ok(module)) => module,
			Ok(Err(message)) => return Err(init_error(message)),
			Err(panic) => return Err(init_error(panic_message(panic.as_ref()))),
		};

		info!(target = "nebula.loader", module = name, binding, version = manifest.version.as_deref().unwrap_or("-"), "module initialized");
		Ok(LoadedModule {
			name: name.to_string(),
			binding: binding.to_string(),
			module,
		})
	}

	async fn manifest(&self, descriptor: &RemoteModuleDescriptor) -> Result<Arc<RemoteEntryManifest>, ModuleLoadError> {
		let url = match &descriptor.entry {
			EntrySource::Bundled(manifest) => return Ok(Arc::new(manifest.clone())),
			EntrySource::Remote(url) => url.clone(),
		};

		let name = descriptor.logical_name.clone();
		let shared = {
			let mut manifests = self.manifests.lock();
			match manifests.get(&name) {
				Some(existing) => existing.clone(),
				None => {
					let fut = fetch_manifest(self.http.clone(), name.clone(), url).boxed().shared();
					manifests.insert(name.clone(), fut.clone());
					fut
				}
			}
		};

		let result = shared.clone().await;
		if result.is_err() {
			evict(&self.manifests, &name, &shared);
		}
		result
	}
}

async fn fetch_manifest(http: reqwest::Client, name: String, url: Url) -> Result<Arc<RemoteEntryManifest>, ModuleLoadError> {
	debug!(target = "nebula.loader", module = %name, %url, "fetching entry manifest");
	let fetch_error = |message: String| ModuleLoadError::Fetch {
		name: name.clone(),
		url: url.to_string(),
		message,
	};

	let response = http.get(url.clone()).send().await.map_err(|e| fetch_error(e.to_string()))?;
	let status = response.status();
	if !status.is_success() {
		return Err(fetch_error(format!("HTTP {}", status.as_u16())));
	}
	let body = response.text().await.map_err(|e| fetch_error(e.to_string()))?;

	let manifest: RemoteEntryManifest = serde_json::from_str(&body).map_err(|e| ModuleLoadError::InvalidManifest {
		name: name.clone(),
		message: e.to_string(),
	})?;
	Ok(Arc::new(manifest))
}

fn verify_manifest(name: &str, binding: &str, manifest: &RemoteEntryManifest) -> Result<(), ModuleLoadError> {
	if manifest.name != name {
		return Err(ModuleLoadError::InvalidManifest {
			name: name.to_string(),
			message: format!("manifest declares name '{}'", manifest.name),
		});
	}

	if !manifest.exposes(binding) {
		return Err(ModuleLoadError::BindingNotExposed {
			name: name.to_string(),
			binding: binding.to_string(),
		});
	}

	let host = shared_dependency_set();
	if manifest.shared != host {
		return Err(ModuleLoadError::SharedMismatch {
			name: name.to_string(),
			missing: difference(&host, &manifest.shared),
			unexpected: difference(&manifest.shared, &host),
		});
	}
	Ok(())
}

fn difference(a: &BTreeSet<String>, b: &BTreeSet<String>) -> Vec<String> {
	a.difference(b).cloned().collect()
}

/// Removes `key` only if it still maps to `failed`; a newer attempt stays.
fn evict<K, T>(map: &Mutex<HashMap<K, Shared<BoxFuture<'static, T>>>>, key: &K, failed: &Shared<BoxFuture<'static, T>>)
where
	K: std::hash::Hash + Eq,
	T: Clone,
{
	let mut map = map.lock();
	if map.get(key).is_some_and(|current| current.ptr_eq(failed)) {
		map.remove(key);
	}
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
	if let Some(s) = payload.downcast_ref::<&str>() {
		(*s).to_string()
	} else if let Some(s) = payload.downcast_ref::<String>() {
		s.clone()
	} else {
		"module panicked during initialization".to_string()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn manifest(shared: &[&str]) -> RemoteEntryManifest {
		RemoteEntryManifest {
			name: "codeRemote".into(),
			version: Some("1".into()),
			exposes: ["./CodeApp".to_string()].into_iter().collect(),
			shared: shared.iter().map(|s| s.to_string()).collect(),
		}
	}

	#[test]
	fn verify_accepts_matching_manifest() {
		let m = manifest(&crate::services::SHARED_DEPENDENCIES);
		assert_eq!(verify_manifest("codeRemote", "./CodeApp", &m), Ok(()));
	}

	#[test]
	fn verify_reports_shared_differences() {
		let m = manifest(&["api-client", "navigator", "session", "router"]);
		match verify_manifest("codeRemote", "./CodeApp", &m) {
			Err(ModuleLoadError::SharedMismatch { missing, unexpected, .. }) => {
				assert_eq!(missing, vec!["query-cache".to_string()]);
				assert_eq!(unexpected, vec!["router".to_string()]);
			}
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn verify_rejects_unexposed_binding_and_wrong_name() {
		let m = manifest(&crate::services::SHARED_DEPENDENCIES);
		assert!(matches!(
			verify_manifest("codeRemote", "./Other", &m),
			Err(ModuleLoadError::BindingNotExposed { .. })
		));
		assert!(matches!(
			verify_manifest("dataRemote", "./CodeApp", &m),
			Err(ModuleLoadError::InvalidManifest { .. })
		));
	}

	#[test]
	fn panic_payloads_become_messages() {
		let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
		assert_eq!(panic_message(payload.as_ref()), "boom");
		let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
		assert_eq!(panic_message(payload.as_ref()), "bang");
	}
}
