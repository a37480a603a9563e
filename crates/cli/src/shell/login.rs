//! Username/password form shown while logged out.

use futures::FutureExt;
use futures::future::BoxFuture;
use nebula_runtime::{Component, Element, Intent, LoginError, Pending, TokenIssuer, UiEvent, View};
use tracing::debug;

pub const USERNAME_INPUT: &str = "username";
pub const PASSWORD_INPUT: &str = "password";
pub const LOGIN_BUTTON: &str = "login";

/// Runs at most one exchange at a time. An issued token is held until the
/// shell takes it; the form never writes the session itself.
pub struct LoginForm {
	issuer: TokenIssuer,
	username: String,
	password: String,
	error: Option<LoginError>,
	issued: Option<String>,
	exchange: Pending<Result<String, LoginError>>,
}

impl LoginForm {
	pub fn new(issuer: TokenIssuer) -> Self {
		Self {
			issuer,
			username: String::new(),
			password: String::new(),
			error: None,
			issued: None,
			exchange: Pending::idle(),
		}
	}

	pub fn error(&self) -> Option<&LoginError> {
		self.error.as_ref()
	}

	pub fn is_pending(&self) -> bool {
		self.exchange.is_running()
	}

	/// Takes a freshly issued token, if any.
	pub fn take_token(&mut self) -> Option<String> {
		self.fold_settled();
		self.issued.take()
	}

	fn submit(&mut self) {
		if self.exchange.is_running() {
			return;
		}
		self.error = None;
		let issuer = self.issuer.clone();
		let username = self.username.clone();
		let password = self.password.clone();
		debug!(target = "nebula.login", %username, "submitting credentials");
		self.exchange.spawn(async move { issuer.exchange(&username, &password).await });
	}

	fn on_exchanged(&mut self, result: Result<String, LoginError>) {
		match result {
			Ok(token) => {
				self.password.clear();
				self.issued = Some(token);
			}
			Err(err) => self.error = Some(err),
		}
	}

	fn fold_settled(&mut self) {
		if let Some(result) = self.exchange.poll_settled() {
			self.on_exchanged(result);
		}
	}
}

impl Component for LoginForm {
	fn render(&mut self) -> View {
		self.fold_settled();

		let mut view = View::new();
		view.push(Element::heading("Welcome to Nebula"));
		if let Some(err) = &self.error {
			view.push(Element::callout(Intent::Danger, None, err.to_string()));
		}
		view.push(Element::input(USERNAME_INPUT, "Username", &self.username))
			.push(Element::secret_input(PASSWORD_INPUT, "Password", &self.password));
		if self.exchange.is_running() {
			view.push(Element::busy_button(LOGIN_BUTTON, "Log In"));
		} else {
			view.push(Element::button(LOGIN_BUTTON, "Log In"));
		}
		view
	}

	fn dispatch(&mut self, event: &UiEvent) -> bool {
		match event {
			UiEvent::Input { id, value } if id == USERNAME_INPUT => {
				self.username = value.clone();
				true
			}
			UiEvent::Input { id, value } if id == PASSWORD_INPUT => {
				self.password = value.clone();
				true
			}
			UiEvent::Click { id } if id == LOGIN_BUTTON => {
				self.fold_settled();
				self.submit();
				true
			}
			_ => false,
		}
	}

	fn settle(&mut self) -> BoxFuture<'_, ()> {
		async move {
			if let Some(result) = self.exchange.settle().await {
				self.on_exchanged(result);
			}
		}
		.boxed()
	}
}

#[cfg(test)]
mod tests {
	use url::Url;

	use super::*;

	fn form() -> LoginForm {
		let issuer = TokenIssuer::new(Url::parse("http://127.0.0.1:9/token").unwrap(), "workspace", None).unwrap();
		LoginForm::new(issuer)
	}

	#[tokio::test]
	async fn empty_credentials_fail_without_a_token() {
		let mut form = form();
		form.dispatch(&UiEvent::click(LOGIN_BUTTON));
		form.settle().await;

		assert_eq!(form.error(), Some(&LoginError::MissingCredentials));
		assert!(form.take_token().is_none());
		assert!(form.render().contains_text("Please enter a username and password"));
	}

	#[test]
	fn password_renders_as_secret_input() {
		let mut form = form();
		form.dispatch(&UiEvent::input(PASSWORD_INPUT, "pw"));
		let view = form.render();
		assert!(view.elements.iter().any(|e| matches!(e, Element::Input { id, secret: true, .. } if id == PASSWORD_INPUT)));
		assert_eq!(view.input_value(PASSWORD_INPUT), Some("pw"));
	}
}
