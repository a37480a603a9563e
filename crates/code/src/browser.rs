//! Repository browser: lists a project's repositories and creates new ones.

use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use nebula_protocol::Resource;
use nebula_runtime::{ClientError, Component, Element, Intent, ModuleRoute, Pending, SharedServices, UiEvent, View};
use tracing::{debug, info, warn};

use crate::api;

pub const NAME_INPUT: &str = "name";
pub const DESCRIPTION_INPUT: &str = "description";
pub const CREATE_BUTTON: &str = "create";
const OPEN_PREFIX: &str = "open:";
const LIST_INTERRUPTED: &str = "Loading repositories was interrupted";

type ListResult = Result<Arc<Vec<Resource>>, ClientError>;

pub struct RepositoryBrowser {
	services: SharedServices,
	route: ModuleRoute,
	project_id: String,
	name: String,
	description: String,
	ui_error: Option<String>,
	repos: Option<Arc<Vec<Resource>>>,
	load_error: Option<String>,
	list: Pending<ListResult>,
	create: Pending<Result<Resource, ClientError>>,
}

impl RepositoryBrowser {
	/// Mounts the browser and starts loading the list.
	pub fn new(services: SharedServices, route: ModuleRoute, project_id: String) -> Self {
		let mut browser = Self {
			services,
			route,
			project_id,
			name: String::new(),
			description: String::new(),
			ui_error: None,
			repos: None,
			load_error: None,
			list: Pending::idle(),
			create: Pending::idle(),
		};
		browser.refresh();
		browser
	}

	fn refresh(&mut self) {
		let services = self.services.clone();
		let project_id = self.project_id.clone();
		self.list.spawn(async move { api::cached_repos(&services, &project_id).await });
	}

	fn on_listed(&mut self, result: ListResult) {
		match result {
			Ok(repos) => {
				debug!(target = "nebula.code", project = %self.project_id, count = repos.len(), "repositories loaded");
				self.repos = Some(repos);
				self.load_error = None;
			}
			Err(err) => self.load_error = Some(err.to_string()),
		}
	}

	fn on_created(&mut self, result: Result<Resource, ClientError>) {
		match result {
			Ok(repo) => {
				info!(target = "nebula.code", id = %repo.id, name = %repo.name, "repository created");
				self.name.clear();
				self.description.clear();
				self.ui_error = None;
				self.services.queries().invalidate(&api::repos_prefix());
				self.refresh();
			}
			Err(err) => self.ui_error = Some(err.to_string()),
		}
	}

	fn submit(&mut self) {
		if self.create.is_running() {
			return;
		}
		if self.name.trim().is_empty() {
			self.ui_error = Some(api::EMPTY_NAME_MESSAGE.to_string());
			return;
		}
		self.ui_error = None;

		let api = self.services.api().clone();
		let project_id = self.project_id.clone();
		let name = self.name.clone();
		let description = self.description.clone();
		self.create
			.spawn(async move { api::create_repo(&api, &project_id, &name, Some(&description)).await });
	}

	fn fold_settled(&mut self) {
		if let Some(result) = self.create.poll_settled() {
			self.on_created(result);
		}
		if let Some(result) = self.list.poll_settled() {
			self.on_listed(result);
		}
		self.recover_lost_list();
	}

	/// A list task that ended without output (panicked) would otherwise leave
	/// the spinner up forever.
	fn recover_lost_list(&mut self) {
		if self.repos.is_none() && self.load_error.is_none() && !self.list.is_running() {
			warn!(target = "nebula.code", project = %self.project_id, "repository list task ended without a result");
			self.load_error = Some(LIST_INTERRUPTED.into());
		}
	}

	fn card(&self, repo: &Resource) -> Element {
		let description = repo
			.description
			.as_deref()
			.filter(|d| !d.is_empty())
			.unwrap_or("No description provided.");
		Element::Card {
			id: format!("{OPEN_PREFIX}{}", repo.id),
			title: repo.name.clone(),
			href: self.route.child(&repo.id),
			lines: vec![description.to_string(), format!("Branch: {}", repo.default_branch)],
		}
	}
}

impl Component for RepositoryBrowser {
	fn render(&mut self) -> View {
		self.fold_settled();

		if self.repos.is_none() && self.load_error.is_none() {
			return View::new().with(Element::Spinner);
		}

		let mut view = View::new();
		if let Some(message) = self.ui_error.as_ref().or(self.load_error.as_ref()) {
			view.push(Element::callout(Intent::Danger, Some("Error"), message.clone()));
		}

		view.push(Element::heading("Repositories"))
			.push(Element::input(NAME_INPUT, "New repository name...", &self.name))
			.push(Element::input(DESCRIPTION_INPUT, "Description (optional)", &self.description))
			.push(if self.create.is_running() {
				Element::busy_button(CREATE_BUTTON, "Create Repo")
			} else {
				Element::button(CREATE_BUTTON, "Create Repo")
			});

		match self.repos.as_deref().map(Vec::as_slice) {
			Some([]) => {
				view.push(Element::EmptyState {
					title: "No repositories".into(),
					message: "Create one to get started".into(),
				});
			}
			Some(repos) => {
				for repo in repos {
					view.push(self.card(repo));
				}
			}
			None => {}
		}
		view
	}

	fn dispatch(&mut self, event: &UiEvent) -> bool {
		match event {
			UiEvent::Input { id, value } if id == NAME_INPUT => self.name = value.clone(),
			UiEvent::Input { id, value } if id == DESCRIPTION_INPUT => self.description = value.clone(),
			UiEvent::Click { id } if id == CREATE_BUTTON => {
				self.fold_settled();
				self.submit();
			}
			UiEvent::Click { id } => match id.strip_prefix(OPEN_PREFIX) {
				Some(repo_id) => self.services.navigator().push(&self.route.child(repo_id)),
				None => return false,
			},
			_ => return false,
		}
		true
	}

	fn settle(&mut self) -> BoxFuture<'_, ()> {
		async move {
			loop {
				if let Some(result) = self.create.settle().await {
					self.on_created(result);
					continue;
				}
				if let Some(result) = self.list.settle().await {
					self.on_listed(result);
					continue;
				}
				break;
			}
			self.recover_lost_list();
		}
		.boxed()
	}
}
