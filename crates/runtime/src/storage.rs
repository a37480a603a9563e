//! Durable key-value storage surviving process restarts.
//!
//! Stores string entries in a single JSON file (`{"schema": 1, "entries": {..}}`).
//! Writes go straight through to disk. On unix the file is owner-only
//! (`0600`) since it holds the bearer token. A storage created without a path
//! keeps entries in memory only.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::StorageError;

const STORAGE_SCHEMA_VERSION: u32 = 1;

/// On-disk format for the storage file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageFile {
	pub schema: u32,
	#[serde(default)]
	pub entries: BTreeMap<String, String>,
}

impl Default for StorageFile {
	fn default() -> Self {
		Self {
			schema: STORAGE_SCHEMA_VERSION,
			entries: BTreeMap::new(),
		}
	}
}

#[derive(Debug, Default)]
pub struct LocalStorage {
	path: Option<PathBuf>,
	file: StorageFile,
}

impl LocalStorage {
	/// Loads storage from `path`. Missing or unreadable files start empty.
	pub fn load(path: PathBuf) -> Self {
		let file = match fs::read_to_string(&path) {
			Ok(content) => serde_json::from_str(&content).unwrap_or_else(|err| {
				warn!(target = "nebula.storage", path = %path.display(), error = %err, "ignoring corrupt storage file");
				StorageFile::default()
			}),
			Err(_) => StorageFile::default(),
		};
		Self { path: Some(path), file }
	}

	pub fn in_memory() -> Self {
		Self::default()
	}

	pub fn path(&self) -> Option<&Path> {
		self.path.as_deref()
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.file.entries.get(key).map(String::as_str)
	}

	pub fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
		self.file.entries.insert(key.to_string(), value.to_string());
		self.save()
	}

	/// Removes `key`. Returns whether an entry existed.
	pub fn remove(&mut self, key: &str) -> Result<bool, StorageError> {
		let existed = self.file.entries.remove(key).is_some();
		if existed {
			self.save()?;
		}
		Ok(existed)
	}

	fn save(&self) -> Result<(), StorageError> {
		let Some(path) = self.path() else {
			return Ok(());
		};
		let io_err = |source: std::io::Error| StorageError::Io {
			path: path.display().to_string(),
			source,
		};
		if let Some(parent) = path.parent() {
			if !parent.as_os_str().is_empty() {
				fs::create_dir_all(parent).map_err(io_err)?;
			}
		}
		let json = serde_json::to_string_pretty(&self.file)?;
		let mut options = fs::OpenOptions::new();
		options.write(true).create(true).truncate(true);
		#[cfg(unix)]
		{
			use std::os::unix::fs::OpenOptionsExt;
			options.mode(0o600);
		}
		let mut file = options.open(path).map_err(io_err)?;
		#[cfg(unix)]
		{
			use std::os::unix::fs::PermissionsExt;
			file.set_permissions(fs::Permissions::from_mode(0o600)).map_err(io_err)?;
		}
		file.write_all(json.as_bytes()).map_err(io_err)?;
		Ok(())
	}
}
