//! Line-oriented driver for the shell.
//!
//! Each line is one command; after every command the current frame is printed
//! as a result envelope. `wait` settles in-flight work before printing, every
//! other command prints whatever is visible immediately.

use std::time::Instant;

use nebula_runtime::UiEvent;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::error::Result;
use crate::output::{ErrorCode, OutputFormat, ResultBuilder, print_result};
use crate::shell::Shell;

const HELP: [&str; 9] = [
	"nav <path>            go to a location",
	"back                  return to the previous location",
	"input <id> <value>    type into an input",
	"click <id>            press a button or open a card",
	"wait                  let in-flight work finish",
	"render                print the current screen",
	"logout                end the session",
	"help                  show this list",
	"quit                  leave the shell",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
	Nav(String),
	Back,
	Input { id: String, value: String },
	Click(String),
	Wait,
	Render,
	Logout,
	Help,
	Quit,
}

impl ReplCommand {
	fn name(&self) -> &'static str {
		match self {
			ReplCommand::Nav(_) => "shell.nav",
			ReplCommand::Back => "shell.back",
			ReplCommand::Input { .. } => "shell.input",
			ReplCommand::Click(_) => "shell.click",
			ReplCommand::Wait => "shell.wait",
			ReplCommand::Render => "shell.render",
			ReplCommand::Logout => "shell.logout",
			ReplCommand::Help => "shell.help",
			ReplCommand::Quit => "shell.quit",
		}
	}
}

/// Parses one input line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
	let line = line.trim();
	if line.is_empty() || line.starts_with('#') {
		return Ok(None);
	}
	let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
	let rest = rest.trim();

	let command = match verb {
		"nav" | "go" => ReplCommand::Nav(required(rest, "nav <path>")?.to_string()),
		"back" => ReplCommand::Back,
		"input" | "type" => {
			let (id, value) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
			ReplCommand::Input {
				id: required(id, "input <id> <value>")?.to_string(),
				value: value.trim_start().to_string(),
			}
		}
		"click" => ReplCommand::Click(required(rest, "click <id>")?.to_string()),
		"wait" => ReplCommand::Wait,
		"render" | "show" => ReplCommand::Render,
		"logout" => ReplCommand::Logout,
		"help" | "?" => ReplCommand::Help,
		"quit" | "exit" => ReplCommand::Quit,
		other => return Err(format!("unknown command '{other}'; try 'help'")),
	};
	Ok(Some(command))
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str, String> {
	if value.is_empty() { Err(format!("usage: {usage}")) } else { Ok(value) }
}

/// Applies one command to the shell. Returns false when the session should end.
pub async fn apply(shell: &mut Shell, command: &ReplCommand) -> bool {
	match command {
		ReplCommand::Nav(path) => shell.navigate(path),
		ReplCommand::Back => {
			shell.back();
		}
		ReplCommand::Input { id, value } => {
			shell.dispatch(&UiEvent::input(id.as_str(), value.as_str()));
		}
		ReplCommand::Click(id) => {
			shell.dispatch(&UiEvent::click(id.as_str()));
		}
		ReplCommand::Wait => shell.settle().await,
		ReplCommand::Logout => {
			shell.logout();
		}
		ReplCommand::Render | ReplCommand::Help => {}
		ReplCommand::Quit => return false,
	}
	true
}

/// Reads commands from `reader` until end of input or `quit`.
pub async fn run_script<R>(shell: &mut Shell, reader: R, format: OutputFormat) -> Result<()>
where
	R: AsyncBufRead + Unpin,
{
	let mut lines = reader.lines();
	let frame = shell.render();
	print_result(&ResultBuilder::new("shell.render").data(frame).build(), format);

	while let Some(line) = lines.next_line().await? {
		let started = Instant::now();
		let command = match parse_line(&line) {
			Ok(Some(command)) => command,
			Ok(None) => continue,
			Err(message) => {
				let result = ResultBuilder::<()>::new("shell").started_at(started).error(ErrorCode::InvalidInput, message).build();
				print_result(&result, format);
				continue;
			}
		};
		debug!(target = "nebula.shell", ?command, "repl");

		if !apply(shell, &command).await {
			break;
		}
		if command == ReplCommand::Help {
			print_result(&ResultBuilder::new(command.name()).started_at(started).data(HELP).build(), format);
			continue;
		}
		let frame = shell.render();
		print_result(&ResultBuilder::new(command.name()).started_at(started).data(frame).build(), format);
	}
	Ok(())
}
