use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "nebula")]
#[command(about = "Nebula workspace shell - browse repositories and launch IDE sessions")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value = "toon")]
	pub format: OutputFormat,

	/// Config file (defaults to $XDG_CONFIG_HOME/nebula/workspace.json)
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Backend base URL, overrides config and NEBULA_API_URL
	#[arg(long, global = true, value_name = "URL")]
	pub api_url: Option<String>,

	/// Keep the session in memory only
	#[arg(long, global = true)]
	pub ephemeral: bool,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Exchange username and password for a session token
	Login {
		#[arg(short, long)]
		username: String,
		#[arg(short, long)]
		password: String,
	},

	/// Clear the stored session
	Logout,

	/// Show session state and configuration
	Status,

	/// Repository operations
	Repos {
		#[command(subcommand)]
		action: ReposAction,
	},

	/// Launch an IDE container for a repository
	Launch {
		/// Repository id
		id: String,
	},

	/// Render the screen at a location
	Render {
		#[arg(default_value = "/")]
		path: String,
	},

	/// Interactive shell reading commands from stdin
	Shell,
}

#[derive(Subcommand, Debug)]
pub enum ReposAction {
	/// List repositories of the configured project
	#[command(alias = "ls")]
	List,

	/// Create a repository
	Create {
		name: String,
		#[arg(short, long)]
		description: Option<String>,
	},
}

impl Commands {
	/// Dotted command name used in result envelopes.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Login { .. } => "login",
			Commands::Logout => "logout",
			Commands::Status => "status",
			Commands::Repos { action: ReposAction::List } => "repos.list",
			Commands::Repos {
				action: ReposAction::Create { .. },
			} => "repos.create",
			Commands::Launch { .. } => "launch",
			Commands::Render { .. } => "render",
			Commands::Shell => "shell",
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_global_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["nebula", "repos", "create", "demo", "-d", "First", "--format", "json", "-vv"]).unwrap();
		assert_eq!(cli.verbose, 2);
		assert_eq!(cli.format, OutputFormat::Json);
		assert_eq!(cli.command.name(), "repos.create");
		let Commands::Repos {
			action: ReposAction::Create { name, description },
		} = cli.command
		else {
			panic!("expected repos create");
		};
		assert_eq!(name, "demo");
		assert_eq!(description.as_deref(), Some("First"));
	}

	#[test]
	fn render_defaults_to_home() {
		let cli = Cli::try_parse_from(["nebula", "render"]).unwrap();
		assert!(matches!(cli.command, Commands::Render { path } if path == "/"));
	}
}
