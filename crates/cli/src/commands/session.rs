use nebula_runtime::UiEvent;

use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::output::{LoginData, LogoutData, ModuleStatus, StatusData};
use crate::shell::{AuthState, LOGIN_BUTTON, PASSWORD_INPUT, Shell, USERNAME_INPUT};

/// Logs in through the shell's login form. An existing session is replaced.
pub async fn login(shell: &mut Shell, username: &str, password: &str) -> Result<LoginData> {
	if shell.auth_state() == AuthState::LoggedIn {
		shell.logout();
	}

	shell.render();
	shell.dispatch(&UiEvent::input(USERNAME_INPUT, username));
	shell.dispatch(&UiEvent::input(PASSWORD_INPUT, password));
	shell.dispatch(&UiEvent::click(LOGIN_BUTTON));
	shell.settle().await;

	let screen = shell.render();
	match screen.auth_state() {
		AuthState::LoggedIn => Ok(LoginData {
			state: AuthState::LoggedIn,
			location: screen.location().to_string(),
		}),
		AuthState::LoggedOut => Err(shell.login_error().cloned().map(ShellError::from).unwrap_or(ShellError::NotLoggedIn)),
	}
}

pub fn logout(shell: &mut Shell) -> LogoutData {
	LogoutData { cleared: shell.logout() }
}

pub fn status(shell: &Shell, config: &ShellConfig) -> StatusData {
	let registry = shell.loader().registry();
	let modules = registry
		.names()
		.filter_map(|name| registry.resolve(name))
		.map(|descriptor| ModuleStatus {
			name: descriptor.logical_name.clone(),
			entry: descriptor.entry.to_string(),
			bindings: descriptor.exposed.keys().cloned().collect(),
		})
		.collect();

	StatusData {
		state: shell.auth_state(),
		location: shell.location(),
		api_url: shell.services().api().base_url().to_string(),
		token_url: config.token_url.clone(),
		storage: shell.storage_path().map(|p| p.display().to_string()),
		code_prefix: shell.code_prefix().to_string(),
		modules,
	}
}
