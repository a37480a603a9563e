//! Serializable view model produced by components.
//!
//! Components render into a flat list of [`Element`]s and react to
//! [`UiEvent`]s. The shell composes views from several components and the
//! output layer prints them; nothing here knows about terminals.

use futures::future::BoxFuture;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
	Info,
	Success,
	Warning,
	Danger,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
	Heading {
		text: String,
	},
	Text {
		text: String,
	},
	Callout {
		intent: Intent,
		#[serde(skip_serializing_if = "Option::is_none")]
		title: Option<String>,
		message: String,
	},
	Input {
		id: String,
		placeholder: String,
		value: String,
		#[serde(skip_serializing_if = "std::ops::Not::not")]
		secret: bool,
	},
	Button {
		id: String,
		label: String,
		#[serde(skip_serializing_if = "std::ops::Not::not")]
		busy: bool,
		#[serde(skip_serializing_if = "std::ops::Not::not")]
		disabled: bool,
	},
	Link {
		label: String,
		href: String,
		#[serde(skip_serializing_if = "std::ops::Not::not")]
		disabled: bool,
	},
	/// Clickable summary; clicking `id` opens `href`.
	Card {
		id: String,
		title: String,
		href: String,
		lines: Vec<String>,
	},
	EmptyState {
		title: String,
		message: String,
	},
	Spinner,
	/// Isolated nested browsing context pointing at `src`.
	Embed {
		src: String,
		title: String,
	},
}

impl Element {
	pub fn heading(text: impl Into<String>) -> Self {
		Element::Heading { text: text.into() }
	}

	pub fn text(text: impl Into<String>) -> Self {
		Element::Text { text: text.into() }
	}

	pub fn callout(intent: Intent, title: Option<&str>, message: impl Into<String>) -> Self {
		Element::Callout {
			intent,
			title: title.map(String::from),
			message: message.into(),
		}
	}

	pub fn input(id: &str, placeholder: &str, value: &str) -> Self {
		Element::Input {
			id: id.into(),
			placeholder: placeholder.into(),
			value: value.into(),
			secret: false,
		}
	}

	pub fn secret_input(id: &str, placeholder: &str, value: &str) -> Self {
		Element::Input {
			id: id.into(),
			placeholder: placeholder.into(),
			value: value.into(),
			secret: true,
		}
	}

	pub fn button(id: &str, label: &str) -> Self {
		Element::Button {
			id: id.into(),
			label: label.into(),
			busy: false,
			disabled: false,
		}
	}

	/// A button that shows progress and ignores clicks.
	pub fn busy_button(id: &str, label: &str) -> Self {
		Element::Button {
			id: id.into(),
			label: label.into(),
			busy: true,
			disabled: true,
		}
	}

	pub fn link(label: &str, href: &str) -> Self {
		Element::Link {
			label: label.into(),
			href: href.into(),
			disabled: false,
		}
	}

	pub fn disabled_link(label: &str) -> Self {
		Element::Link {
			label: label.into(),
			href: String::new(),
			disabled: true,
		}
	}
}

/// A rendered view: an ordered list of elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct View {
	pub elements: Vec<Element>,
}

impl View {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push(&mut self, element: Element) -> &mut Self {
		self.elements.push(element);
		self
	}

	pub fn with(mut self, element: Element) -> Self {
		self.elements.push(element);
		self
	}

	pub fn extend(&mut self, other: View) {
		self.elements.extend(other.elements);
	}

	pub fn is_loading(&self) -> bool {
		self.elements.iter().any(|e| matches!(e, Element::Spinner))
	}

	/// Messages of every callout in the view.
	pub fn callouts(&self) -> impl Iterator<Item = &str> {
		self.elements.iter().filter_map(|e| match e {
			Element::Callout { message, .. } => Some(message.as_str()),
			_ => None,
		})
	}

	pub fn button(&self, id: &str) -> Option<&Element> {
		self.elements.iter().find(|e| matches!(e, Element::Button { id: b, .. } if b == id))
	}

	pub fn input_value(&self, id: &str) -> Option<&str> {
		self.elements.iter().find_map(|e| match e {
			Element::Input { id: i, value, .. } if i == id => Some(value.as_str()),
			_ => None,
		})
	}

	pub fn cards(&self) -> impl Iterator<Item = (&str, &str)> {
		self.elements.iter().filter_map(|e| match e {
			Element::Card { title, href, .. } => Some((title.as_str(), href.as_str())),
			_ => None,
		})
	}

	pub fn embed(&self) -> Option<&str> {
		self.elements.iter().find_map(|e| match e {
			Element::Embed { src, .. } => Some(src.as_str()),
			_ => None,
		})
	}

	pub fn contains_text(&self, needle: &str) -> bool {
		self.elements.iter().any(|e| match e {
			Element::Heading { text } | Element::Text { text } => text.contains(needle),
			Element::Callout { title, message, .. } => message.contains(needle) || title.as_deref().is_some_and(|t| t.contains(needle)),
			Element::EmptyState { title, message } => title.contains(needle) || message.contains(needle),
			Element::Card { title, lines, .. } => title.contains(needle) || lines.iter().any(|l| l.contains(needle)),
			_ => false,
		})
	}
}

/// A user interaction delivered to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
	Input { id: String, value: String },
	Click { id: String },
}

impl UiEvent {
	pub fn input(id: impl Into<String>, value: impl Into<String>) -> Self {
		UiEvent::Input {
			id: id.into(),
			value: value.into(),
		}
	}

	pub fn click(id: impl Into<String>) -> Self {
		UiEvent::Click { id: id.into() }
	}
}

/// A mounted piece of UI.
///
/// Dropping a component unmounts it; implementations must abort their
/// in-flight work on drop so late results are never applied.
pub trait Component: Send {
	/// Renders the current state. Settled background work is folded in first.
	fn render(&mut self) -> View;

	/// Handles an event. Returns true when the event was addressed to this component.
	fn dispatch(&mut self, event: &UiEvent) -> bool;

	/// Resolves once every piece of in-flight work has settled.
	fn settle(&mut self) -> BoxFuture<'_, ()>;
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn elements_serialize_with_kind_tag() {
		let json = serde_json::to_value(Element::busy_button("launch", "Launching...")).unwrap();
		assert_eq!(json["kind"], "button");
		assert_eq!(json["busy"], true);

		let json = serde_json::to_value(Element::button("launch", "Launch IDE")).unwrap();
		assert!(json.get("busy").is_none());
	}

	#[test]
	fn view_queries_find_elements() {
		let view = View::new()
			.with(Element::input("name", "Repository name", "demo"))
			.with(Element::callout(Intent::Danger, None, "Name taken"))
			.with(Element::Card {
				id: "open:r1".into(),
				title: "demo".into(),
				href: "/repos/r1".into(),
				lines: vec!["Branch: main".into()],
			});

		assert_eq!(view.input_value("name"), Some("demo"));
		assert_eq!(view.callouts().collect::<Vec<_>>(), vec!["Name taken"]);
		assert_eq!(view.cards().next(), Some(("demo", "/repos/r1")));
		assert!(view.contains_text("Branch: main"));
		assert!(!view.is_loading());
	}
}
