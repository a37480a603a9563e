//! Interactive IDE session provisioning (`POST /api/repos/<id>/ide/launch`).

use serde::{Deserialize, Serialize};

/// Result of a launch request. `proxy_url` is the only field the client
/// relies on; the rest is informational and may be absent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LaunchResult {
	pub proxy_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub repository_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub container_id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
}
