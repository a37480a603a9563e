//! The Code feature module.
//!
//! Exposes [`APP_BINDING`] under the logical name [`MODULE_NAME`]. Once loaded
//! it owns every location below the shell's reserved prefix:
//!
//! * `<prefix>` renders the [`RepositoryBrowser`]
//! * `<prefix>/<id>` renders the [`IdeLauncher`] for repository `id`
//!
//! The module never builds its own client, session or cache. Everything comes
//! from the [`SharedServices`] the host passes to the factory.

pub mod api;
mod browser;
mod launcher;

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use nebula_protocol::RemoteEntryManifest;
use nebula_runtime::{
	Component, Element, EntrySource, ModuleRoute, RemoteModule, RemoteModuleDescriptor, SharedServices, UiEvent, View, shared_dependency_set,
};

pub use browser::{CREATE_BUTTON, DESCRIPTION_INPUT, NAME_INPUT, RepositoryBrowser};
pub use launcher::{IdeLauncher, LAUNCH_BUTTON, LaunchState, STOP_BUTTON};

pub const MODULE_NAME: &str = "codeRemote";
pub const APP_BINDING: &str = "./CodeApp";
pub const DEFAULT_PROJECT_ID: &str = "00000000-0000-0000-0000-000000000001";
pub const DEFAULT_PASSWORD_HINT: &str = "nebula";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeSettings {
	/// Project whose repositories are listed and created.
	pub project_id: String,
	/// Password shown next to the embedded IDE. Display only.
	pub password_hint: String,
}

impl Default for CodeSettings {
	fn default() -> Self {
		Self {
			project_id: DEFAULT_PROJECT_ID.into(),
			password_hint: DEFAULT_PASSWORD_HINT.into(),
		}
	}
}

/// The entry manifest this module publishes.
pub fn manifest() -> RemoteEntryManifest {
	RemoteEntryManifest {
		name: MODULE_NAME.into(),
		version: Some(env!("CARGO_PKG_VERSION").into()),
		exposes: [APP_BINDING.to_string()].into_iter().collect(),
		shared: shared_dependency_set(),
	}
}

/// Registry descriptor for this module. `entry` is usually
/// `EntrySource::Bundled(manifest())` or the URL the manifest is served from.
pub fn descriptor(settings: CodeSettings, entry: EntrySource) -> RemoteModuleDescriptor {
	RemoteModuleDescriptor::new(MODULE_NAME, entry).expose(APP_BINDING, move |services: &SharedServices| {
		let app = CodeApp::init(services, settings.clone())?;
		Ok(Arc::new(app) as Arc<dyn RemoteModule>)
	})
}

pub struct CodeApp {
	services: SharedServices,
	settings: CodeSettings,
}

impl CodeApp {
	pub fn init(services: &SharedServices, settings: CodeSettings) -> Result<Self, String> {
		if settings.project_id.trim().is_empty() {
			return Err("no project id configured".into());
		}
		Ok(Self {
			services: services.clone(),
			settings,
		})
	}
}

impl RemoteModule for CodeApp {
	fn name(&self) -> &str {
		MODULE_NAME
	}

	fn mount(&self, route: &ModuleRoute) -> Box<dyn Component> {
		match route.segments().as_slice() {
			[] => Box::new(RepositoryBrowser::new(
				self.services.clone(),
				route.clone(),
				self.settings.project_id.clone(),
			)),
			[id] => Box::new(IdeLauncher::new(
				self.services.clone(),
				id.to_string(),
				self.settings.password_hint.clone(),
			)),
			_ => Box::new(NotFound { route: route.clone() }),
		}
	}
}

/// Locations below the prefix that match no module route.
struct NotFound {
	route: ModuleRoute,
}

impl Component for NotFound {
	fn render(&mut self) -> View {
		View::new()
			.with(Element::heading("Not found"))
			.with(Element::text(format!("Nothing lives at {}", self.route.child(&self.route.sub_path))))
			.with(Element::link("Back to repositories", &self.route.child("")))
	}

	fn dispatch(&mut self, _event: &UiEvent) -> bool {
		false
	}

	fn settle(&mut self) -> BoxFuture<'_, ()> {
		async {}.boxed()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn manifest_declares_binding_and_host_shared_set() {
		let manifest = manifest();
		assert_eq!(manifest.name, MODULE_NAME);
		assert!(manifest.exposes(APP_BINDING));
		assert_eq!(manifest.shared, shared_dependency_set());
	}

	#[test]
	fn descriptor_exposes_app_binding() {
		let descriptor = descriptor(CodeSettings::default(), EntrySource::Bundled(manifest()));
		assert_eq!(descriptor.logical_name, MODULE_NAME);
		assert!(descriptor.exposed.contains_key(APP_BINDING));
	}
}
