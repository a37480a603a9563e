//! Registry of remote feature modules.
//!
//! Modules are linked into the binary and registered at startup with a
//! [`RemoteModuleDescriptor`]. The descriptor names where the module's entry
//! manifest lives and which bindings it exposes; the
//! [`ModuleLoader`](crate::ModuleLoader) checks the manifest before any of the
//! module's code runs.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nebula_protocol::RemoteEntryManifest;
use thiserror::Error;
use url::Url;

use crate::services::SharedServices;
use crate::view::Component;

/// Entry point of an exposed binding. Receives the host's shared services.
pub type ModuleFactory = Arc<dyn Fn(&SharedServices) -> Result<Arc<dyn RemoteModule>, String> + Send + Sync>;

/// An initialized feature module.
pub trait RemoteModule: Send + Sync {
	fn name(&self) -> &str;

	/// Mounts the module for `route`. The module owns every path below its prefix.
	fn mount(&self, route: &ModuleRoute) -> Box<dyn Component>;
}

/// Where a module's entry manifest comes from.
#[derive(Debug, Clone)]
pub enum EntrySource {
	/// Fetched over HTTP on first load.
	Remote(Url),
	/// Shipped inside the binary.
	Bundled(RemoteEntryManifest),
}

impl fmt::Display for EntrySource {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EntrySource::Remote(url) => write!(f, "{url}"),
			EntrySource::Bundled(manifest) => write!(f, "bundled:{}", manifest.name),
		}
	}
}

#[derive(Clone)]
pub struct RemoteModuleDescriptor {
	pub logical_name: String,
	pub entry: EntrySource,
	pub exposed: BTreeMap<String, ModuleFactory>,
}

impl RemoteModuleDescriptor {
	pub fn new(logical_name: impl Into<String>, entry: EntrySource) -> Self {
		Self {
			logical_name: logical_name.into(),
			entry,
			exposed: BTreeMap::new(),
		}
	}

	pub fn expose<F>(mut self, binding: impl Into<String>, factory: F) -> Self
	where
		F: Fn(&SharedServices) -> Result<Arc<dyn RemoteModule>, String> + Send + Sync + 'static,
	{
		self.exposed.insert(binding.into(), Arc::new(factory));
		self
	}
}

impl fmt::Debug for RemoteModuleDescriptor {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("RemoteModuleDescriptor")
			.field("logical_name", &self.logical_name)
			.field("entry", &self.entry)
			.field("exposed", &self.exposed.keys().collect::<Vec<_>>())
			.finish()
	}
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
	#[error("module '{0}' is already registered")]
	Duplicate(String),
}

/// Logical name to descriptor map. Immutable once the loader is built.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
	modules: BTreeMap<String, RemoteModuleDescriptor>,
}

impl ModuleRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, descriptor: RemoteModuleDescriptor) -> Result<(), RegistryError> {
		if self.modules.contains_key(&descriptor.logical_name) {
			return Err(RegistryError::Duplicate(descriptor.logical_name));
		}
		self.modules.insert(descriptor.logical_name.clone(), descriptor);
		Ok(())
	}

	pub fn resolve(&self, name: &str) -> Option<&RemoteModuleDescriptor> {
		self.modules.get(name)
	}

	pub fn names(&self) -> impl Iterator<Item = &str> {
		self.modules.keys().map(String::as_str)
	}
}

/// The slice of the location a mounted module is responsible for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRoute {
	/// Reserved prefix owned by the module, e.g. `/repos`.
	pub base: String,
	/// Remainder below the prefix without a leading slash; empty at the root.
	pub sub_path: String,
}

impl ModuleRoute {
	pub fn new(base: impl Into<String>, sub_path: impl Into<String>) -> Self {
		Self {
			base: base.into(),
			sub_path: sub_path.into().trim_matches('/').to_string(),
		}
	}

	pub fn segments(&self) -> Vec<&str> {
		self.sub_path.split('/').filter(|s| !s.is_empty()).collect()
	}

	/// Absolute path of a location below the module's prefix.
	pub fn child(&self, path: &str) -> String {
		let base = self.base.trim_end_matches('/');
		let path = path.trim_start_matches('/');
		if path.is_empty() { base.to_string() } else { format!("{base}/{path}") }
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::BTreeSet;

	fn bundled(name: &str) -> EntrySource {
		EntrySource::Bundled(RemoteEntryManifest {
			name: name.into(),
			version: None,
			exposes: BTreeSet::new(),
			shared: BTreeSet::new(),
		})
	}

	#[test]
	fn duplicate_registration_is_rejected() {
		let mut registry = ModuleRegistry::new();
		registry.register(RemoteModuleDescriptor::new("codeRemote", bundled("codeRemote"))).unwrap();
		let err = registry
			.register(RemoteModuleDescriptor::new("codeRemote", bundled("codeRemote")))
			.unwrap_err();
		assert_eq!(err, RegistryError::Duplicate("codeRemote".into()));
		assert_eq!(registry.names().collect::<Vec<_>>(), vec!["codeRemote"]);
		assert!(registry.resolve("other").is_none());
	}

	#[test]
	fn route_segments_and_children() {
		let route = ModuleRoute::new("/repos", "/r1/");
		assert_eq!(route.segments(), vec!["r1"]);
		assert_eq!(route.child("r2"), "/repos/r2");
		assert_eq!(route.child(""), "/repos");

		let root = ModuleRoute::new("/repos", "");
		assert!(root.segments().is_empty());
	}
}
