mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Api, ApiFile, Config, ConfigFile, Defaults, DefaultsFile};

use std::{env, fs, path::Path, time::Duration};

pub const ENV_API_KEY: &str = "EVERMEM_API_KEY";
pub const ENV_API_URL: &str = "EVERMEM_API_URL";
pub const ENV_API_VERSION: &str = "EVERMEM_API_VERSION";
pub const ENV_TIMEOUT_SECS: &str = "EVERMEM_TIMEOUT_SECS";
pub const ENV_USER_ID: &str = "EVERMEM_USER_ID";
pub const ENV_GROUP_ID: &str = "EVERMEM_GROUP_ID";
pub const ENV_LOG: &str = "EVERMEM_LOG";

pub const DEFAULT_CLOUD_URL: &str = "https://api.evermind.ai";
pub const DEFAULT_LOCAL_URL: &str = "http://localhost:1995";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_ID: &str = "windsurf_user";
pub const DEFAULT_GROUP_ID: &str = "windsurf_project";
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Loads the optional config file and resolves it against the process environment.
pub fn load(path: Option<&Path>) -> Result<Config> {
	let file = match path {
		Some(path) => read_file(path)?,
		None => ConfigFile::default(),
	};

	resolve(file, |key| env::var(key).ok())
}

pub fn read_file(path: &Path) -> Result<ConfigFile> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	toml::from_str(&raw).map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })
}

/// Resolves every field as explicit file value, then environment, then built-in default.
///
/// Blank values at any layer count as absent.
pub fn resolve<F>(file: ConfigFile, env: F) -> Result<Config>
where
	F: Fn(&str) -> Option<String>,
{
	let lookup =
		|explicit: Option<String>, key: &str| non_blank(explicit).or_else(|| non_blank(env(key)));
	let api_key = lookup(file.api.api_key, ENV_API_KEY);
	let explicit_url = non_blank(file.api.base_url);
	let env_url = non_blank(env(ENV_API_URL));
	let base_url =
		resolve_base_url(explicit_url.as_deref(), env_url.as_deref(), api_key.is_some());
	let api_version = lookup(file.api.api_version, ENV_API_VERSION)
		.unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
	let timeout_secs = match file.api.timeout_secs {
		Some(secs) => secs,
		None => match non_blank(env(ENV_TIMEOUT_SECS)) {
			Some(raw) => raw.trim().parse::<u64>().map_err(|_| Error::Validation {
				message: format!("{ENV_TIMEOUT_SECS} must be a whole number of seconds, got {raw}."),
			})?,
			None => DEFAULT_TIMEOUT_SECS,
		},
	};
	let user_id =
		lookup(file.defaults.user_id, ENV_USER_ID).unwrap_or_else(|| DEFAULT_USER_ID.to_string());
	let group_id = lookup(file.defaults.group_id, ENV_GROUP_ID)
		.unwrap_or_else(|| DEFAULT_GROUP_ID.to_string());
	let log_level =
		lookup(file.log_level, ENV_LOG).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
	let cfg = Config {
		api: Api { api_key, base_url, api_version, timeout: Duration::from_secs(timeout_secs) },
		defaults: Defaults { user_id, group_id },
		log_level,
	};

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.api.timeout.is_zero() {
		return Err(Error::Validation {
			message: "api.timeout_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.api.api_version.contains('/') {
		return Err(Error::Validation {
			message: "api.api_version must be a single path segment.".to_string(),
		});
	}

	for (label, value) in
		[("defaults.user_id", &cfg.defaults.user_id), ("defaults.group_id", &cfg.defaults.group_id)]
	{
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	Ok(())
}

/// Explicit URL, then `EVERMEM_API_URL`, then cloud when a key exists, else local.
pub fn resolve_base_url(explicit: Option<&str>, env_url: Option<&str>, has_api_key: bool) -> String {
	match explicit.or(env_url) {
		Some(raw) => normalize_base_url(raw),
		None if has_api_key => DEFAULT_CLOUD_URL.to_string(),
		None => DEFAULT_LOCAL_URL.to_string(),
	}
}

pub fn normalize_base_url(raw: &str) -> String {
	let trimmed = raw.trim().trim_end_matches('/');

	if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
		trimmed.to_string()
	} else {
		format!("http://{trimmed}")
	}
}

fn non_blank(value: Option<String>) -> Option<String> {
	value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}
