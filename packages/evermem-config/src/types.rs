use std::time::Duration;

use serde::Deserialize;

/// On-disk shape of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
	pub log_level: Option<String>,
	#[serde(default)]
	pub api: ApiFile,
	#[serde(default)]
	pub defaults: DefaultsFile,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiFile {
	pub api_key: Option<String>,
	pub base_url: Option<String>,
	pub api_version: Option<String>,
	pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DefaultsFile {
	pub user_id: Option<String>,
	pub group_id: Option<String>,
}

/// Fully resolved configuration, built once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
	pub api: Api,
	pub defaults: Defaults,
	pub log_level: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Api {
	/// `None` means local mode. Empty keys are normalized to `None`.
	pub api_key: Option<String>,
	/// Scheme-qualified, without a trailing slash.
	pub base_url: String,
	pub api_version: String,
	pub timeout: Duration,
}
impl Api {
	pub fn has_api_key(&self) -> bool {
		self.api_key.is_some()
	}

	pub fn memories_url(&self) -> String {
		format!("{}/api/{}/memories", self.base_url, self.api_version)
	}
}

/// Identifiers injected by the tools when the host leaves them out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Defaults {
	pub user_id: String,
	pub group_id: String,
}
