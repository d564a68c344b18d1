#![allow(dead_code)]

use std::time::Duration;

use serde_json::{Map, Value};

use evermem_client::EverMemClient;
use evermem_config::{Api, Defaults};
use evermem_mcp::tools::MemoryTools;

pub fn tools_for(base_url: &str, api_key: Option<&str>) -> MemoryTools {
	let client = EverMemClient::new(Api {
		api_key: api_key.map(str::to_string),
		base_url: base_url.to_string(),
		api_version: "v1".to_string(),
		timeout: Duration::from_secs(5),
	});

	MemoryTools::new(
		client,
		Defaults { user_id: "windsurf_user".to_string(), group_id: "windsurf_project".to_string() },
	)
}

pub fn params(value: Value) -> Map<String, Value> {
	match value {
		Value::Object(map) => map,
		other => panic!("Tool params must be an object, got {other}."),
	}
}
