use nebula_runtime::{ModuleRoute, normalize_path};

/// What a location resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
	Home,
	/// A location owned by a feature module.
	Module { name: String, binding: String, route: ModuleRoute },
	NotFound,
}

#[derive(Debug, Clone)]
struct ModuleMount {
	prefix: String,
	name: String,
	binding: String,
}

/// Top-level location table: `/` is home, each registered prefix and
/// everything below it belongs to one module binding.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
	mounts: Vec<ModuleMount>,
}

impl RouteTable {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn mount(mut self, prefix: &str, name: &str, binding: &str) -> Self {
		self.mounts.push(ModuleMount {
			prefix: normalize_path(prefix),
			name: name.into(),
			binding: binding.into(),
		});
		self
	}

	/// Prefix of the first mount serving `name`.
	pub fn prefix_of(&self, name: &str) -> Option<&str> {
		self.mounts.iter().find(|m| m.name == name).map(|m| m.prefix.as_str())
	}

	pub fn resolve(&self, location: &str) -> Route {
		let location = normalize_path(location);
		if location == "/" {
			return Route::Home;
		}
		for mount in &self.mounts {
			let rest = match location.strip_prefix(&mount.prefix) {
				Some("") => "",
				Some(rest) if rest.starts_with('/') => rest,
				_ => continue,
			};
			return Route::Module {
				name: mount.name.clone(),
				binding: mount.binding.clone(),
				route: ModuleRoute::new(mount.prefix.clone(), rest),
			};
		}
		Route::NotFound
	}
}
