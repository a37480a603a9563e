use nebula_runtime::SessionContext;
use serde::Serialize;

/// What the shell shows at the top level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
	LoggedOut,
	LoggedIn,
}

/// Derived on every render from the session token; never stored.
pub fn auth_state(session: &SessionContext) -> AuthState {
	if session.is_authenticated() { AuthState::LoggedIn } else { AuthState::LoggedOut }
}
