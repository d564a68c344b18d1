use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::{
	error::{Error, Result},
	format,
};
use evermem_client::{
	AddMemory, DeleteMemories, EverMemClient, GetMemories, MetaOutcome, SearchMemories,
	models::DEFAULT_MEMORY_TYPE,
};
use evermem_config::{Config, Defaults};

pub const MAX_SEARCH_TOP_K: u32 = 20;
pub const MAX_GET_LIMIT: u32 = 50;
pub const DEFAULT_SEARCH_TOP_K: u32 = 5;
pub const DEFAULT_GET_LIMIT: u32 = 10;
pub const DEFAULT_RETRIEVE_METHOD: &str = "keyword";

#[derive(Debug, Deserialize)]
pub struct StoreMemoryArgs {
	pub content: String,
	#[serde(default = "default_role")]
	pub role: String,
	pub sender: Option<String>,
	pub group_id: Option<String>,
	#[serde(default)]
	pub flush: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchMemoryArgs {
	pub query: String,
	pub user_id: Option<String>,
	pub group_id: Option<String>,
	#[serde(default = "default_retrieve_method")]
	pub retrieve_method: String,
	#[serde(default = "default_search_top_k")]
	pub top_k: u32,
	pub memory_types: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct GetMemoriesArgs {
	pub user_id: Option<String>,
	#[serde(default = "default_memory_type")]
	pub memory_type: String,
	pub group_id: Option<String>,
	#[serde(default = "default_get_limit")]
	pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct DeleteMemoryArgs {
	pub user_id: Option<String>,
	pub group_id: Option<String>,
	pub memory_type: Option<String>,
}

/// The four memory tools, independent of the MCP transport.
///
/// Every method returns display text. Failures are rendered as `Failed to ...: <detail>` and
/// logged; nothing propagates to the caller.
#[derive(Clone, Debug)]
pub struct MemoryTools {
	client: EverMemClient,
	defaults: Defaults,
}
impl MemoryTools {
	pub fn new(client: EverMemClient, defaults: Defaults) -> Self {
		Self { client, defaults }
	}

	pub fn from_config(config: &Config) -> Self {
		Self::new(EverMemClient::new(config.api.clone()), config.defaults.clone())
	}

	pub fn defaults(&self) -> &Defaults {
		&self.defaults
	}

	pub async fn store_memory(&self, params: Map<String, Value>) -> String {
		render("store memory", self.try_store_memory(params).await)
	}

	pub async fn search_memory(&self, params: Map<String, Value>) -> String {
		render("search memory", self.try_search_memory(params).await)
	}

	pub async fn get_memories(&self, params: Map<String, Value>) -> String {
		render("get memories", self.try_get_memories(params).await)
	}

	pub async fn delete_memory(&self, params: Map<String, Value>) -> String {
		render("delete memory", self.try_delete_memory(params).await)
	}

	async fn try_store_memory(&self, params: Map<String, Value>) -> Result<String> {
		let args: StoreMemoryArgs = parse_args(params)?;

		if args.content.trim().is_empty() {
			return Err(Error::InvalidArgument("content must be non-empty.".to_string()));
		}

		let sender = or_default(args.sender, &self.defaults.user_id);
		let group_id = or_default(args.group_id, &self.defaults.group_id);

		match self.client.ensure_conversation_meta(&group_id).await {
			MetaOutcome::Created => tracing::debug!(%group_id, "Conversation meta created."),
			MetaOutcome::AlreadyExists =>
				tracing::debug!(%group_id, "Conversation meta already exists."),
			MetaOutcome::Failed(err) => tracing::warn!(
				%group_id,
				error = %err,
				"Conversation meta was not saved. Storing the memory anyway."
			),
		}

		let request = AddMemory {
			group_id: Some(group_id),
			sender_name: Some(sender.clone()),
			role: args.role,
			flush: args.flush,
			..AddMemory::new(args.content, sender)
		};
		let response = self.client.add_memory(request).await?;

		Ok(format!(
			"Memory stored successfully.\n- Status: {}\n- Message: {}\n- Request ID: {}",
			response_field(&response, "status").unwrap_or_else(|| "unknown".to_string()),
			response_field(&response, "message").unwrap_or_default(),
			response_field(&response, "request_id").unwrap_or_default(),
		))
	}

	async fn try_search_memory(&self, params: Map<String, Value>) -> Result<String> {
		let args: SearchMemoryArgs = parse_args(params)?;
		let request = SearchMemories {
			group_id: args.group_id,
			retrieve_method: args.retrieve_method,
			top_k: clamp_top_k(args.top_k),
			memory_types: args.memory_types.unwrap_or_default(),
			..SearchMemories::new(args.query, or_default(args.user_id, &self.defaults.user_id))
		};
		let response = self.client.search_memories(request).await?;

		Ok(format::format_search_results(&response))
	}

	async fn try_get_memories(&self, params: Map<String, Value>) -> Result<String> {
		let args: GetMemoriesArgs = parse_args(params)?;
		let request = GetMemories {
			memory_type: args.memory_type,
			group_id: args.group_id,
			limit: clamp_limit(args.limit),
			..GetMemories::new(or_default(args.user_id, &self.defaults.user_id))
		};
		let response = self.client.get_memories(request).await?;

		Ok(format::format_get_results(&response))
	}

	async fn try_delete_memory(&self, params: Map<String, Value>) -> Result<String> {
		let args: DeleteMemoryArgs = parse_args(params)?;
		let request = DeleteMemories {
			group_id: args.group_id,
			memory_type: args.memory_type,
			..DeleteMemories::new(or_default(args.user_id, &self.defaults.user_id))
		};
		let response = self.client.delete_memories(request).await?;

		Ok(format!(
			"Delete completed.\n- Status: {}\n- Message: {}",
			response_field(&response, "status").unwrap_or_else(|| "unknown".to_string()),
			response_field(&response, "message").unwrap_or_default(),
		))
	}
}

pub fn clamp_top_k(top_k: u32) -> u32 {
	top_k.min(MAX_SEARCH_TOP_K)
}

pub fn clamp_limit(limit: u32) -> u32 {
	limit.min(MAX_GET_LIMIT)
}

fn render(action: &str, result: Result<String>) -> String {
	match result {
		Ok(text) => text,
		Err(err) => {
			tracing::error!(error = %err, "Failed to {action}.");

			format!("Failed to {action}: {err}")
		},
	}
}

fn parse_args<T>(params: Map<String, Value>) -> Result<T>
where
	T: DeserializeOwned,
{
	Ok(serde_json::from_value(Value::Object(params))?)
}

fn or_default(value: Option<String>, default: &str) -> String {
	value.filter(|text| !text.trim().is_empty()).unwrap_or_else(|| default.to_string())
}

fn response_field(response: &Value, key: &str) -> Option<String> {
	match response.get(key)? {
		Value::Null => None,
		Value::String(text) => Some(text.clone()),
		other => Some(other.to_string()),
	}
}

fn default_role() -> String {
	"user".to_string()
}

fn default_retrieve_method() -> String {
	DEFAULT_RETRIEVE_METHOD.to_string()
}

fn default_search_top_k() -> u32 {
	DEFAULT_SEARCH_TOP_K
}

fn default_memory_type() -> String {
	DEFAULT_MEMORY_TYPE.to_string()
}

fn default_get_limit() -> u32 {
	DEFAULT_GET_LIMIT
}
