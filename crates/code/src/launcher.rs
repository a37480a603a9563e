//! IDE launcher for one repository.
//!
//! `Idle -> Launching -> Ready -> Idle`. Stopping only detaches the embedded
//! session locally; the provisioning service reaps the container on its own.

use futures::FutureExt;
use futures::future::BoxFuture;
use nebula_protocol::LaunchResult;
use nebula_runtime::{ClientError, Component, Element, Intent, Pending, SharedServices, UiEvent, View};
use tracing::{info, warn};

use crate::api;

pub const LAUNCH_BUTTON: &str = "launch";
pub const STOP_BUTTON: &str = "stop";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchState {
	Idle,
	Launching,
	Ready { proxy_url: String, session: LaunchResult },
}

pub struct IdeLauncher {
	services: SharedServices,
	repo_id: String,
	password_hint: String,
	state: LaunchState,
	ui_error: Option<String>,
	launch: Pending<Result<LaunchResult, ClientError>>,
}

impl IdeLauncher {
	pub fn new(services: SharedServices, repo_id: String, password_hint: String) -> Self {
		Self {
			services,
			repo_id,
			password_hint,
			state: LaunchState::Idle,
			ui_error: None,
			launch: Pending::idle(),
		}
	}

	pub fn state(&self) -> &LaunchState {
		&self.state
	}

	fn start(&mut self) {
		if self.state != LaunchState::Idle {
			return;
		}
		self.state = LaunchState::Launching;
		let api = self.services.api().clone();
		let repo_id = self.repo_id.clone();
		self.launch.spawn(async move { api::launch_ide(&api, &repo_id).await });
	}

	fn stop(&mut self) {
		if let LaunchState::Ready { session, .. } = &self.state {
			info!(target = "nebula.code", repo = %self.repo_id, session = session.id.as_deref().unwrap_or("-"), "IDE session detached");
			self.state = LaunchState::Idle;
		}
	}

	fn on_launched(&mut self, result: Result<LaunchResult, ClientError>) {
		let outcome = result.and_then(|session| {
			let proxy_url = self.services.api().resolve_link(&session.proxy_url)?;
			Ok((proxy_url, session))
		});
		match outcome {
			Ok((proxy_url, session)) => {
				info!(target = "nebula.code", repo = %self.repo_id, %proxy_url, "IDE ready");
				self.state = LaunchState::Ready {
					proxy_url: proxy_url.to_string(),
					session,
				};
				self.ui_error = None;
			}
			Err(err) => {
				warn!(target = "nebula.code", repo = %self.repo_id, error = %err, "IDE launch failed");
				self.state = LaunchState::Idle;
				self.ui_error = Some(err.to_string());
			}
		}
	}

	fn fold_settled(&mut self) {
		if let Some(result) = self.launch.poll_settled() {
			self.on_launched(result);
		}
		self.recover_lost_launch();
	}

	/// A launch task that ended without output (panicked) leaves the view re-launchable.
	fn recover_lost_launch(&mut self) {
		if self.state == LaunchState::Launching && !self.launch.is_running() {
			self.state = LaunchState::Idle;
			self.ui_error = Some("Launch was interrupted".into());
		}
	}
}

impl Component for IdeLauncher {
	fn render(&mut self) -> View {
		self.fold_settled();

		let mut view = View::new();
		if let Some(message) = &self.ui_error {
			view.push(Element::callout(Intent::Danger, Some("Launch Failed"), message.clone()));
		}
		view.push(Element::heading("Code Server IDE Runtime"));

		match &self.state {
			LaunchState::Idle => {
				view.push(Element::button(LAUNCH_BUTTON, "Launch IDE Container"));
			}
			LaunchState::Launching => {
				view.push(Element::busy_button(LAUNCH_BUTTON, "Launch IDE Container"));
			}
			LaunchState::Ready { proxy_url, .. } => {
				view.push(Element::button(STOP_BUTTON, "Stop Session"))
					.push(Element::callout(
						Intent::Success,
						Some("IDE Ready"),
						format!("Use password {} to log in to the code-server.", self.password_hint),
					))
					.push(Element::Embed {
						src: proxy_url.clone(),
						title: "IDE".into(),
					});
			}
		}
		view
	}

	fn dispatch(&mut self, event: &UiEvent) -> bool {
		match event {
			UiEvent::Click { id } if id == LAUNCH_BUTTON => {
				self.fold_settled();
				self.start();
				true
			}
			UiEvent::Click { id } if id == STOP_BUTTON => {
				self.fold_settled();
				self.stop();
				true
			}
			_ => false,
		}
	}

	fn settle(&mut self) -> BoxFuture<'_, ()> {
		async move {
			if let Some(result) = self.launch.settle().await {
				self.on_launched(result);
			}
			self.recover_lost_launch();
		}
		.boxed()
	}
}
