//! Client-side location and history shared by the shell and feature modules.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

#[derive(Debug)]
struct NavState {
	location: String,
	history: Vec<String>,
}

/// Shared router state. Cloning yields another handle to the same state.
#[derive(Debug, Clone)]
pub struct Navigator {
	state: Arc<Mutex<NavState>>,
}

impl Navigator {
	pub(crate) fn new(initial: &str) -> Self {
		Self {
			state: Arc::new(Mutex::new(NavState {
				location: normalize_path(initial),
				history: Vec::new(),
			})),
		}
	}

	pub fn location(&self) -> String {
		self.state.lock().location.clone()
	}

	/// Navigates to `path`, recording the previous location.
	pub fn push(&self, path: &str) {
		let target = normalize_path(path);
		let mut state = self.state.lock();
		if state.location == target {
			return;
		}
		let previous = std::mem::replace(&mut state.location, target);
		debug!(target = "nebula.nav", from = %previous, to = %state.location, "push");
		state.history.push(previous);
	}

	/// Navigates to `path` without recording history.
	pub fn replace(&self, path: &str) {
		let target = normalize_path(path);
		let mut state = self.state.lock();
		debug!(target = "nebula.nav", from = %state.location, to = %target, "replace");
		state.location = target;
	}

	/// Returns to the previous location. Returns false at the start of history.
	pub fn back(&self) -> bool {
		let mut state = self.state.lock();
		match state.history.pop() {
			Some(previous) => {
				state.location = previous;
				true
			}
			None => false,
		}
	}

	pub fn same_instance(&self, other: &Navigator) -> bool {
		Arc::ptr_eq(&self.state, &other.state)
	}
}

/// Normalizes a path: leading `/`, no trailing `/`, no empty segments.
pub fn normalize_path(path: &str) -> String {
	let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
	format!("/{}", segments.join("/"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_handles_slashes() {
		assert_eq!(normalize_path(""), "/");
		assert_eq!(normalize_path("repos/"), "/repos");
		assert_eq!(normalize_path("//repos//abc/"), "/repos/abc");
	}

	#[test]
	fn push_and_back_walk_history() {
		let nav = Navigator::new("/");
		nav.push("/repos");
		nav.push("/repos/r1");
		assert_eq!(nav.location(), "/repos/r1");
		assert!(nav.back());
		assert_eq!(nav.location(), "/repos");
		assert!(nav.back());
		assert!(!nav.back());
	}

	#[test]
	fn replace_does_not_record_history() {
		let nav = Navigator::new("/repos");
		nav.replace("/");
		assert_eq!(nav.location(), "/");
		assert!(!nav.back());
	}
}
