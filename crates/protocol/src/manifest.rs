//! Entry manifest published by a remote feature module.
//!
//! ```json
//! {
//!   "name": "codeRemote",
//!   "version": "0.4.0",
//!   "exposes": ["./CodeApp"],
//!   "shared": ["api-client", "navigator", "query-cache", "session"]
//! }
//! ```

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntryManifest {
	pub name: String,
	#[serde(default)]
	pub version: Option<String>,
	/// Export names the module makes loadable.
	#[serde(default)]
	pub exposes: BTreeSet<String>,
	/// Shared dependency identifiers the module expects the host to provide.
	#[serde(default)]
	pub shared: BTreeSet<String>,
}

impl RemoteEntryManifest {
	pub fn exposes(&self, binding: &str) -> bool {
		self.exposes.contains(binding)
	}
}
