//! Plain-text rendering of command data.
//!
//! Works on the serialized JSON so every payload prints the same way. Any
//! `elements` array is treated as a rendered view and drawn element by
//! element; other fields print as `key: value` lines.

use colored::Colorize;
use serde_json::Value;

/// Renders `value` as indented text lines.
pub fn render_lines(value: &Value, color: bool) -> Vec<String> {
	let mut out = Vec::new();
	render_value(value, 0, color, &mut out);
	out
}

fn render_value(value: &Value, depth: usize, color: bool, out: &mut Vec<String>) {
	let pad = "  ".repeat(depth);
	match value {
		Value::Object(map) => {
			for (key, field) in map {
				match field {
					Value::Array(items) if key == "elements" => {
						for item in items {
							render_element(item, depth, color, out);
						}
					}
					Value::Object(_) => {
						out.push(format!("{pad}{}:", paint_key(key, color)));
						render_value(field, depth + 1, color, out);
					}
					Value::Array(items) if items.iter().any(|i| i.is_object()) => {
						out.push(format!("{pad}{}:", paint_key(key, color)));
						for item in items {
							render_value(item, depth + 1, color, out);
							out.push(String::new());
						}
					}
					_ => out.push(format!("{pad}{}: {}", paint_key(key, color), scalar(field))),
				}
			}
		}
		Value::Array(items) => {
			for item in items {
				render_value(item, depth, color, out);
			}
		}
		other => out.push(format!("{pad}{}", scalar(other))),
	}
}

fn render_element(element: &Value, depth: usize, color: bool, out: &mut Vec<String>) {
	let pad = "  ".repeat(depth);

	let line = match str_field(element, "kind") {
		"heading" => {
			let text = str_field(element, "text");
			if color { text.bold().to_string() } else { format!("# {text}") }
		}
		"text" => str_field(element, "text").to_string(),
		"callout" => {
			let intent = str_field(element, "intent");
			let label = match element.get("title").and_then(Value::as_str) {
				Some(title) => format!("[{intent}] {title}: {}", str_field(element, "message")),
				None => format!("[{intent}] {}", str_field(element, "message")),
			};
			if !color {
				label
			} else {
				match intent {
					"danger" => label.red().to_string(),
					"warning" => label.yellow().to_string(),
					"success" => label.green().to_string(),
					_ => label.cyan().to_string(),
				}
			}
		}
		"input" => {
			let value = if bool_field(element, "secret") && !str_field(element, "value").is_empty() { "********" } else { str_field(element, "value") };
			format!("{} ({}): {value}", str_field(element, "placeholder"), str_field(element, "id"))
		}
		"button" => {
			let state = if bool_field(element, "busy") { " ..." } else { "" };
			format!("[{}] {}{state}", str_field(element, "id"), str_field(element, "label"))
		}
		"link" => {
			if bool_field(element, "disabled") {
				let label = format!("{} (unavailable)", str_field(element, "label"));
				if color { label.dimmed().to_string() } else { label }
			} else {
				format!("{} -> {}", str_field(element, "label"), str_field(element, "href"))
			}
		}
		"card" => {
			out.push(format!("{pad}* {} [{}] -> {}", str_field(element, "title"), str_field(element, "id"), str_field(element, "href")));
			if let Some(lines) = element.get("lines").and_then(Value::as_array) {
				for line in lines.iter().filter_map(Value::as_str) {
					out.push(format!("{pad}    {line}"));
				}
			}
			return;
		}
		"empty_state" => format!("({}) {}", str_field(element, "title"), str_field(element, "message")),
		"spinner" => {
			if color { "loading...".dimmed().to_string() } else { "loading...".to_string() }
		}
		"embed" => format!("<{}> {}", str_field(element, "title"), str_field(element, "src")),
		_ => scalar(element),
	};
	out.push(format!("{pad}{line}"));
}

fn str_field<'a>(element: &'a Value, name: &str) -> &'a str {
	element.get(name).and_then(Value::as_str).unwrap_or_default()
}

fn bool_field(element: &Value, name: &str) -> bool {
	element.get(name).and_then(Value::as_bool).unwrap_or(false)
}

fn paint_key(key: &str, color: bool) -> String {
	if color { key.dimmed().to_string() } else { key.to_string() }
}

fn scalar(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => "-".into(),
		other => other.to_string(),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn renders_view_elements() {
		let value = json!({
			"location": "/repos",
			"content": {
				"status": "ready",
				"elements": [
					{"kind": "heading", "text": "Repositories"},
					{"kind": "input", "id": "name", "placeholder": "Repository name", "value": ""},
					{"kind": "card", "id": "open:r1", "title": "demo", "href": "/repos/r1", "lines": ["Branch: main"]},
					{"kind": "link", "label": "Datasets", "href": "", "disabled": true}
				]
			}
		});

		let lines = render_lines(&value, false);
		assert!(lines.contains(&"location: /repos".to_string()));
		assert!(lines.contains(&"  status: ready".to_string()));
		assert!(lines.contains(&"  # Repositories".to_string()));
		assert!(lines.contains(&"  * demo [open:r1] -> /repos/r1".to_string()));
		assert!(lines.contains(&"      Branch: main".to_string()));
		assert!(lines.contains(&"  Datasets (unavailable)".to_string()));
	}

	#[test]
	fn masks_secret_inputs() {
		let value = json!({"elements": [{"kind": "input", "id": "password", "placeholder": "Password", "value": "hunter2", "secret": true}]});
		assert_eq!(render_lines(&value, false), vec!["Password (password): ********".to_string()]);
	}
}
