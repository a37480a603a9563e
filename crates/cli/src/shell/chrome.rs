//! Shell-owned views: the navigation bar and the home page.

use nebula_runtime::{Element, View};

pub const LOGOUT_BUTTON: &str = "logout";

pub fn navbar(code_prefix: &str) -> View {
	View::new()
		.with(Element::heading("Nebula Workspace"))
		.with(Element::link("Home", "/"))
		.with(Element::link("Code", code_prefix))
		.with(Element::disabled_link("Datasets"))
		.with(Element::disabled_link("Builds"))
		.with(Element::button(LOGOUT_BUTTON, "Log Out"))
}

pub fn home(code_prefix: &str) -> View {
	View::new()
		.with(Element::heading("Welcome to Nebula Foundry"))
		.with(Element::text("Distributed Data Analytics Platform"))
		.with(Element::link("Open Code Workspace", code_prefix))
}

pub fn not_found(location: &str) -> View {
	View::new()
		.with(Element::heading("Page not found"))
		.with(Element::text(format!("Nothing lives at {location}")))
		.with(Element::link("Home", "/"))
}
