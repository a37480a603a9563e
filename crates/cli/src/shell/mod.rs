//! The composition shell.
//!
//! Gates everything behind the session, renders the navigation chrome and
//! mounts feature modules at their reserved prefixes. Module content is loaded
//! lazily: until the binding resolves the content area shows a spinner while
//! the navigation stays interactive. Load failures stay inside the content
//! area.

mod auth;
mod chrome;
mod login;
mod routes;

use std::path::{Path, PathBuf};

use futures::FutureExt;
use nebula_code::{APP_BINDING, MODULE_NAME};
use nebula_runtime::{
	ClearReason, Component, Element, Intent, LoadedModule, LocalStorage, LoginError, ModuleLoadError, ModuleLoader, ModuleRegistry, ModuleRoute,
	Pending, ServicesConfig, SessionWriter, SharedServices, TokenIssuer, UiEvent, View,
};
use serde::Serialize;
use tracing::{debug, info, warn};

pub use auth::{AuthState, auth_state};
pub use chrome::LOGOUT_BUTTON;
pub use login::{LOGIN_BUTTON, LoginForm, PASSWORD_INPUT, USERNAME_INPUT};
pub use routes::{Route, RouteTable};

use crate::config::ShellConfig;
use crate::error::Result;

pub const RETRY_BUTTON: &str = "retry";

const SETTLE_ROUNDS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentStatus {
	Ready,
	/// A module binding is still loading.
	Suspended,
	ModuleLoadFailed,
	NotFound,
}

/// The content area below the navigation bar.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
	pub status: ContentStatus,
	#[serde(flatten)]
	pub view: View,
}

impl Content {
	fn new(status: ContentStatus, view: View) -> Self {
		Self { status, view }
	}
}

/// One rendered frame of the shell.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Screen {
	LoggedOut { location: String, login: View },
	LoggedIn { location: String, nav: View, content: Content },
}

impl Screen {
	pub fn auth_state(&self) -> AuthState {
		match self {
			Screen::LoggedOut { .. } => AuthState::LoggedOut,
			Screen::LoggedIn { .. } => AuthState::LoggedIn,
		}
	}

	pub fn location(&self) -> &str {
		match self {
			Screen::LoggedOut { location, .. } | Screen::LoggedIn { location, .. } => location,
		}
	}

	pub fn content(&self) -> Option<&Content> {
		match self {
			Screen::LoggedIn { content, .. } => Some(content),
			Screen::LoggedOut { .. } => None,
		}
	}
}

enum Mount {
	Empty,
	Loading {
		location: String,
		name: String,
		binding: String,
		route: ModuleRoute,
		task: Pending<Result<LoadedModule, ModuleLoadError>>,
	},
	Mounted {
		location: String,
		component: Box<dyn Component>,
	},
	Failed {
		location: String,
		error: ModuleLoadError,
	},
}

impl Mount {
	fn location(&self) -> Option<&str> {
		match self {
			Mount::Empty => None,
			Mount::Loading { location, .. } | Mount::Mounted { location, .. } | Mount::Failed { location, .. } => Some(location),
		}
	}
}

pub struct Shell {
	services: SharedServices,
	writer: SessionWriter,
	loader: ModuleLoader,
	issuer: TokenIssuer,
	routes: RouteTable,
	code_prefix: String,
	storage_path: Option<PathBuf>,
	login: Option<LoginForm>,
	mount: Mount,
}

impl Shell {
	pub fn new(services: SharedServices, writer: SessionWriter, loader: ModuleLoader, issuer: TokenIssuer, routes: RouteTable) -> Self {
		let code_prefix = routes.prefix_of(MODULE_NAME).unwrap_or("/").to_string();
		Self {
			services,
			writer,
			loader,
			issuer,
			routes,
			code_prefix,
			storage_path: None,
			login: None,
			mount: Mount::Empty,
		}
	}

	/// Builds the shared services, registers the code module and wires the routes.
	pub fn from_config(config: &ShellConfig, storage: LocalStorage) -> Result<Self> {
		let timeout = config.request_timeout();
		let storage_path = storage.path().map(Path::to_path_buf);
		let (services, writer) = SharedServices::new(ServicesConfig {
			api_base_url: config.api_url()?,
			request_timeout: timeout,
			storage,
			initial_location: "/".into(),
		})?;

		let mut registry = ModuleRegistry::new();
		registry.register(nebula_code::descriptor(config.code_settings(), config.code_entry()?))?;

		let loader = ModuleLoader::new(registry, services.clone(), timeout)?;
		let issuer = TokenIssuer::new(config.token_url()?, config.client_id.clone(), timeout)?;
		let routes = RouteTable::new().mount(&config.code_prefix()?, MODULE_NAME, APP_BINDING);

		Ok(Self {
			storage_path,
			..Self::new(services, writer, loader, issuer, routes)
		})
	}

	pub fn services(&self) -> &SharedServices {
		&self.services
	}

	pub fn loader(&self) -> &ModuleLoader {
		&self.loader
	}

	pub fn code_prefix(&self) -> &str {
		&self.code_prefix
	}

	/// Where the session is persisted; `None` for in-memory sessions.
	pub fn storage_path(&self) -> Option<&Path> {
		self.storage_path.as_deref()
	}

	pub fn auth_state(&self) -> AuthState {
		auth_state(self.services.session())
	}

	pub fn location(&self) -> String {
		self.services.navigator().location()
	}

	/// Error from the most recent login attempt, if it failed.
	pub fn login_error(&self) -> Option<&LoginError> {
		self.login.as_ref().and_then(LoginForm::error)
	}

	pub fn navigate(&mut self, path: &str) {
		self.services.navigator().push(path);
	}

	pub fn back(&mut self) -> bool {
		self.services.navigator().back()
	}

	/// Clears the session and unmounts module content. Returns whether a session existed.
	pub fn logout(&mut self) -> bool {
		self.mount = Mount::Empty;
		let cleared = self.writer.clear(ClearReason::Logout);
		info!(target = "nebula.shell", cleared, "logged out");
		cleared
	}

	pub fn render(&mut self) -> Screen {
		self.absorb_login();
		let location = self.location();
		match self.auth_state() {
			AuthState::LoggedOut => {
				self.mount = Mount::Empty;
				let issuer = &self.issuer;
				let login = self.login.get_or_insert_with(|| LoginForm::new(issuer.clone()));
				Screen::LoggedOut {
					location,
					login: login.render(),
				}
			}
			AuthState::LoggedIn => {
				self.login = None;
				let content = self.content(&location);
				Screen::LoggedIn {
					nav: chrome::navbar(&self.code_prefix),
					location,
					content,
				}
			}
		}
	}

	/// Routes an event to the login form, the chrome or the mounted module.
	pub fn dispatch(&mut self, event: &UiEvent) -> bool {
		if self.auth_state() == AuthState::LoggedOut {
			let issuer = &self.issuer;
			let login = self.login.get_or_insert_with(|| LoginForm::new(issuer.clone()));
			return login.dispatch(event);
		}

		if is_click(event, LOGOUT_BUTTON) {
			self.logout();
			return true;
		}
		if let Mount::Mounted { component, .. } = &mut self.mount {
			return component.dispatch(event);
		}
		if matches!(self.mount, Mount::Failed { .. }) && is_click(event, RETRY_BUTTON) {
			self.mount = Mount::Empty;
			return true;
		}
		false
	}

	/// Drives login, module loading and mounted content until nothing is in flight.
	pub async fn settle(&mut self) {
		for _ in 0..SETTLE_ROUNDS {
			let before = (self.auth_state(), self.location());
			self.render();

			if let Some(login) = self.login.as_mut().filter(|l| l.is_pending()) {
				login.settle().await;
				continue;
			}
			match &mut self.mount {
				Mount::Loading { task, .. } => {
					let result = task.settle().await;
					self.complete_load(result);
					continue;
				}
				Mount::Mounted { component, .. } => component.settle().await,
				Mount::Empty | Mount::Failed { .. } => {}
			}

			if (self.auth_state(), self.location()) == before {
				return;
			}
		}
		warn!(target = "nebula.shell", "shell did not settle");
	}

	fn absorb_login(&mut self) {
		let Some(token) = self.login.as_mut().and_then(LoginForm::take_token) else {
			return;
		};
		self.writer.set_token(&token);
		self.login = None;
		info!(target = "nebula.shell", location = %self.location(), "logged in");
	}

	fn content(&mut self, location: &str) -> Content {
		match self.routes.resolve(location) {
			Route::Home => {
				self.mount = Mount::Empty;
				Content::new(ContentStatus::Ready, chrome::home(&self.code_prefix))
			}
			Route::NotFound => {
				self.mount = Mount::Empty;
				Content::new(ContentStatus::NotFound, chrome::not_found(location))
			}
			Route::Module { name, binding, route } => {
				if self.mount.location() != Some(location) {
					self.start_mount(location, name, binding, route);
				}
				self.advance_mount();
				match &mut self.mount {
					Mount::Mounted { component, .. } => Content::new(ContentStatus::Ready, component.render()),
					Mount::Failed { error, .. } => Content::new(ContentStatus::ModuleLoadFailed, failure_view(error)),
					Mount::Loading { .. } | Mount::Empty => Content::new(ContentStatus::Suspended, View::new().with(Element::Spinner)),
				}
			}
		}
	}

	fn start_mount(&mut self, location: &str, name: String, binding: String, route: ModuleRoute) {
		// Dropping the previous mount aborts its in-flight work.
		self.mount = Mount::Empty;
		debug!(target = "nebula.shell", %location, module = %name, %binding, "mounting");

		let mut load = self.loader.load(&name, &binding);
		self.mount = match (&mut load).now_or_never() {
			Some(result) => finish_load(location.to_string(), &route, result),
			None => {
				let mut task = Pending::idle();
				task.spawn(load);
				Mount::Loading {
					location: location.to_string(),
					name,
					binding,
					route,
					task,
				}
			}
		};
	}

	fn advance_mount(&mut self) {
		let Mount::Loading { task, .. } = &mut self.mount else {
			return;
		};
		let result = match task.poll_settled() {
			Some(result) => Some(result),
			None if task.is_running() => return,
			None => None,
		};
		self.complete_load(result);
	}

	fn complete_load(&mut self, result: Option<Result<LoadedModule, ModuleLoadError>>) {
		let Mount::Loading {
			location,
			name,
			binding,
			route,
			..
		} = std::mem::replace(&mut self.mount, Mount::Empty)
		else {
			return;
		};
		let result = result.unwrap_or_else(|| {
			Err(ModuleLoadError::Init {
				name,
				binding,
				message: "module load was interrupted".into(),
			})
		});
		self.mount = finish_load(location, &route, result);
	}
}

fn finish_load(location: String, route: &ModuleRoute, result: Result<LoadedModule, ModuleLoadError>) -> Mount {
	match result {
		Ok(loaded) => {
			debug!(target = "nebula.shell", %location, module = %loaded.name, "mounted");
			Mount::Mounted {
				location,
				component: loaded.module.mount(route),
			}
		}
		Err(error) => {
			warn!(target = "nebula.shell", %location, kind = error.kind(), error = %error, "module unavailable");
			Mount::Failed { location, error }
		}
	}
}

fn failure_view(error: &ModuleLoadError) -> View {
	View::new()
		.with(Element::callout(Intent::Danger, Some("Module failed to load"), error.to_string()))
		.with(Element::button(RETRY_BUTTON, "Retry"))
}

fn is_click(event: &UiEvent, target: &str) -> bool {
	matches!(event, UiEvent::Click { id } if id == target)
}
