//! Nebula workspace shell.
//!
//! Hosts the login gate, the navigation chrome and the lazily loaded feature
//! modules, and exposes them as a command-line tool.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod shell;

pub use config::ShellConfig;
pub use error::{Result, ShellError};
pub use shell::{AuthState, Content, ContentStatus, Screen, Shell};
