use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use crate::Result;

pub const DEFAULT_SCENE: &str = "assistant";
pub const DEFAULT_ROLE: &str = "user";
pub const DEFAULT_GROUP_NAME: &str = "MCP Memory Group";
pub const DEFAULT_RETRIEVE_METHOD: &str = "hybrid";
pub const DEFAULT_MEMORY_TYPE: &str = "episodic_memory";
pub const DEFAULT_SEARCH_TOP_K: u32 = 10;
pub const DEFAULT_GET_LIMIT: u32 = 20;

const META_VERSION: &str = "1.0.0";
const MESSAGE_ID_PREFIX: &str = "msg_";
const MESSAGE_ID_HEX_LEN: usize = 12;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
	pub full_name: String,
	pub role: String,
	#[serde(default)]
	pub extra: Map<String, Value>,
}

/// Per-role participants registered for a group when the caller supplies none.
pub fn default_user_details() -> BTreeMap<String, UserDetail> {
	BTreeMap::from([
		(
			"User".to_string(),
			UserDetail { full_name: "User".to_string(), role: "user".to_string(), extra: Map::new() },
		),
		(
			"Assistant".to_string(),
			UserDetail {
				full_name: "AI Assistant".to_string(),
				role: "assistant".to_string(),
				extra: Map::new(),
			},
		),
	])
}

#[derive(Clone, Debug)]
pub struct SaveConversationMeta {
	pub group_id: String,
	pub scene: String,
	pub group_name: String,
	pub user_details: Option<BTreeMap<String, UserDetail>>,
}
impl SaveConversationMeta {
	pub fn new(group_id: impl Into<String>) -> Self {
		Self {
			group_id: group_id.into(),
			scene: DEFAULT_SCENE.to_string(),
			group_name: DEFAULT_GROUP_NAME.to_string(),
			user_details: None,
		}
	}

	pub fn into_payload(self, now: OffsetDateTime) -> Result<ConversationMeta> {
		let description = format!("MCP Memory - {} scene", self.scene);
		let tags = vec!["mcp".to_string(), self.scene.clone()];

		Ok(ConversationMeta {
			version: META_VERSION.to_string(),
			scene: self.scene,
			scene_desc: Map::new(),
			name: self.group_name,
			description,
			group_id: self.group_id,
			created_at: now.format(&Rfc3339)?,
			default_timezone: "UTC".to_string(),
			user_details: self.user_details.unwrap_or_else(default_user_details),
			tags,
		})
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct ConversationMeta {
	pub version: String,
	pub scene: String,
	pub scene_desc: Map<String, Value>,
	pub name: String,
	pub description: String,
	pub group_id: String,
	pub created_at: String,
	pub default_timezone: String,
	pub user_details: BTreeMap<String, UserDetail>,
	pub tags: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct AddMemory {
	pub content: String,
	pub sender: String,
	pub group_id: Option<String>,
	pub sender_name: Option<String>,
	pub role: String,
	pub scene: String,
	pub message_id: Option<String>,
	pub flush: bool,
}
impl AddMemory {
	pub fn new(content: impl Into<String>, sender: impl Into<String>) -> Self {
		Self {
			content: content.into(),
			sender: sender.into(),
			group_id: None,
			sender_name: None,
			role: DEFAULT_ROLE.to_string(),
			scene: DEFAULT_SCENE.to_string(),
			message_id: None,
			flush: false,
		}
	}

	pub fn into_message(self, now: OffsetDateTime) -> Result<MemoryMessage> {
		let group_id =
			non_empty(self.group_id).unwrap_or_else(|| derive_group_id(&self.sender));
		let sender_name = non_empty(self.sender_name).unwrap_or_else(|| self.sender.clone());
		let message_id = non_empty(self.message_id).unwrap_or_else(generate_message_id);

		Ok(MemoryMessage {
			message_id,
			create_time: now.format(&Rfc3339)?,
			sender: self.sender,
			sender_name,
			group_id,
			content: self.content,
			role: self.role,
			kind: "text".to_string(),
			scene: self.scene,
			flush: self.flush,
		})
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct MemoryMessage {
	pub message_id: String,
	pub create_time: String,
	pub sender: String,
	pub sender_name: String,
	pub group_id: String,
	pub content: String,
	pub role: String,
	#[serde(rename = "type")]
	pub kind: String,
	pub scene: String,
	#[serde(skip_serializing_if = "is_false")]
	pub flush: bool,
}

#[derive(Clone, Debug, Serialize)]
pub struct SearchMemories {
	pub user_id: String,
	pub query: String,
	pub retrieve_method: String,
	pub top_k: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_id: Option<String>,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	pub memory_types: Vec<String>,
}
impl SearchMemories {
	pub fn new(query: impl Into<String>, user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			query: query.into(),
			retrieve_method: DEFAULT_RETRIEVE_METHOD.to_string(),
			top_k: DEFAULT_SEARCH_TOP_K,
			group_id: None,
			memory_types: Vec::new(),
		}
	}

	/// Drops blank optional filters so both transports send the same field set.
	pub fn normalized(mut self) -> Self {
		self.group_id = non_empty(self.group_id);
		self.memory_types.retain(|kind| !kind.trim().is_empty());

		self
	}

	/// Query-string form used by the local transport. `memory_types` repeats per entry.
	pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = vec![
			("user_id", self.user_id.clone()),
			("query", self.query.clone()),
			("retrieve_method", self.retrieve_method.clone()),
			("top_k", self.top_k.to_string()),
		];

		if let Some(group_id) = &self.group_id {
			pairs.push(("group_id", group_id.clone()));
		}

		pairs.extend(self.memory_types.iter().map(|kind| ("memory_types", kind.clone())));

		pairs
	}
}

#[derive(Clone, Debug)]
pub struct GetMemories {
	pub user_id: String,
	pub memory_type: String,
	pub group_id: Option<String>,
	pub limit: u32,
}
impl GetMemories {
	pub fn new(user_id: impl Into<String>) -> Self {
		Self {
			user_id: user_id.into(),
			memory_type: DEFAULT_MEMORY_TYPE.to_string(),
			group_id: None,
			limit: DEFAULT_GET_LIMIT,
		}
	}

	pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
		let mut pairs = vec![
			("user_id", self.user_id.clone()),
			("memory_type", self.memory_type.clone()),
			("limit", self.limit.to_string()),
		];

		if let Some(group_id) = self.group_id.as_deref().filter(|id| !id.trim().is_empty()) {
			pairs.push(("group_id", group_id.to_string()));
		}

		pairs
	}
}

#[derive(Clone, Debug, Serialize)]
pub struct DeleteMemories {
	pub user_id: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub group_id: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub memory_type: Option<String>,
}
impl DeleteMemories {
	pub fn new(user_id: impl Into<String>) -> Self {
		Self { user_id: user_id.into(), group_id: None, memory_type: None }
	}

	pub fn normalized(mut self) -> Self {
		self.group_id = non_empty(self.group_id);
		self.memory_type = non_empty(self.memory_type);

		self
	}
}

pub fn derive_group_id(sender: &str) -> String {
	format!("{sender}_group")
}

/// `msg_` followed by 12 lowercase hex characters taken from a random v4 UUID.
pub fn generate_message_id() -> String {
	let hex = Uuid::new_v4().simple().to_string();

	format!("{MESSAGE_ID_PREFIX}{}", &hex[..MESSAGE_ID_HEX_LEN])
}

fn non_empty(value: Option<String>) -> Option<String> {
	value.filter(|text| !text.trim().is_empty())
}

fn is_false(value: &bool) -> bool {
	!*value
}
