use std::sync::Arc;

use color_eyre::Result;
use rmcp::{
	ErrorData, ServerHandler, ServiceExt,
	handler::server::router::tool::ToolRouter,
	model::{CallToolResult, Content, JsonObject, ServerCapabilities, ServerInfo},
	transport::stdio,
};

use crate::tools::{MAX_GET_LIMIT, MAX_SEARCH_TOP_K, MemoryTools};

pub const TOOL_STORE_MEMORY: &str = "store_memory";
pub const TOOL_SEARCH_MEMORY: &str = "search_memory";
pub const TOOL_GET_MEMORIES: &str = "get_memories";
pub const TOOL_DELETE_MEMORY: &str = "delete_memory";

const INSTRUCTIONS: &str = "EverMemOS long-term memory. Call search_memory before answering questions that may depend on earlier sessions (preferences, conventions, decisions, deployment steps). Call store_memory when the user shares something worth remembering across sessions. Use get_memories to browse without a query and delete_memory only when the user asks to forget. Every tool returns plain text; failures start with \"Failed to\".";

#[derive(Clone)]
pub struct EverMemMcp {
	tools: Arc<MemoryTools>,
	tool_router: ToolRouter<Self>,
}
impl EverMemMcp {
	pub fn new(tools: MemoryTools) -> Self {
		Self { tools: Arc::new(tools), tool_router: Self::tool_router() }
	}

	pub fn tool_names(&self) -> Vec<String> {
		self.tool_router.list_all().into_iter().map(|tool| tool.name.to_string()).collect()
	}

	pub fn tool_schema(&self, name: &str) -> Option<Arc<JsonObject>> {
		self.tool_router
			.list_all()
			.into_iter()
			.find(|tool| tool.name == name)
			.map(|tool| tool.input_schema)
	}
}

#[rmcp::tool_router]
impl EverMemMcp {
	#[rmcp::tool(
		name = "store_memory",
		description = "Save a conversation message into EverMemOS long-term memory. Use it when the user shares information worth remembering across sessions: project preferences, coding conventions, architecture decisions, deployment procedures, personal preferences.",
		input_schema = store_memory_schema()
	)]
	async fn store_memory(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		Ok(text_result(self.tools.store_memory(params).await))
	}

	#[rmcp::tool(
		name = "search_memory",
		description = "Search EverMemOS for memories relevant to a natural language query. Use it to recall project setup details, user preferences, previous decisions, coding patterns or deployment steps.",
		input_schema = search_memory_schema()
	)]
	async fn search_memory(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		Ok(text_result(self.tools.search_memory(params).await))
	}

	#[rmcp::tool(
		name = "get_memories",
		description = "Browse stored memories for a user by memory type, without a search query.",
		input_schema = get_memories_schema()
	)]
	async fn get_memories(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		Ok(text_result(self.tools.get_memories(params).await))
	}

	#[rmcp::tool(
		name = "delete_memory",
		description = "Soft-delete memories for a user, optionally narrowed to a group or memory type. Use it only when the user explicitly asks to forget something.",
		input_schema = delete_memory_schema()
	)]
	async fn delete_memory(&self, params: JsonObject) -> Result<CallToolResult, ErrorData> {
		Ok(text_result(self.tools.delete_memory(params).await))
	}
}

#[rmcp::tool_handler]
impl ServerHandler for EverMemMcp {
	fn get_info(&self) -> ServerInfo {
		ServerInfo {
			instructions: Some(INSTRUCTIONS.to_string()),
			capabilities: ServerCapabilities::builder().enable_tools().build(),
			..Default::default()
		}
	}
}

/// Serves the tools over stdin/stdout until the host closes the stream.
pub async fn serve_stdio(tools: MemoryTools) -> Result<()> {
	tracing::info!("MCP server starting with stdio transport.");

	let service = EverMemMcp::new(tools)
		.serve(stdio())
		.await
		.inspect_err(|err| tracing::error!(error = %err, "MCP server failed to start."))?;
	let reason = service.waiting().await?;

	tracing::info!(?reason, "MCP server stopped.");

	Ok(())
}

fn text_result(text: String) -> CallToolResult {
	CallToolResult::success(vec![Content::text(text)])
}

fn store_memory_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["content"],
		"properties": {
			"content": {
				"type": "string",
				"description": "The message content to remember. Be specific and include key details."
			},
			"role": {
				"type": "string",
				"enum": ["user", "assistant"],
				"default": "user",
				"description": "Who sent this message: user for human messages, assistant for AI responses."
			},
			"sender": {
				"type": ["string", "null"],
				"description": "User ID owning the memory. Defaults to EVERMEM_USER_ID."
			},
			"group_id": {
				"type": ["string", "null"],
				"description": "Project or group identifier. Defaults to EVERMEM_GROUP_ID."
			},
			"flush": {
				"type": "boolean",
				"default": false,
				"description": "Force immediate memory extraction instead of waiting for a conversation boundary."
			}
		}
	}))
}

fn search_memory_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"required": ["query"],
		"properties": {
			"query": {
				"type": "string",
				"description": "Natural language description of what to recall."
			},
			"user_id": {
				"type": ["string", "null"],
				"description": "User ID to search. Defaults to EVERMEM_USER_ID."
			},
			"group_id": {
				"type": ["string", "null"],
				"description": "Optional project or group filter."
			},
			"retrieve_method": {
				"type": "string",
				"enum": ["keyword", "vector", "hybrid", "rrf", "agentic"],
				"default": "keyword",
				"description": "keyword (BM25), vector (semantic), hybrid (keyword + vector + rerank), rrf (fusion) or agentic (LLM-guided multi-round)."
			},
			"top_k": {
				"type": "integer",
				"minimum": 1,
				"maximum": MAX_SEARCH_TOP_K,
				"default": 5,
				"description": "Maximum number of results. Values above the maximum are capped."
			},
			"memory_types": {
				"type": ["array", "null"],
				"items": { "type": "string", "enum": ["episodic_memory", "foresight", "event_log"] },
				"description": "Optional memory types to search."
			}
		}
	}))
}

fn get_memories_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"user_id": {
				"type": ["string", "null"],
				"description": "User ID to browse. Defaults to EVERMEM_USER_ID."
			},
			"memory_type": {
				"type": "string",
				"enum": ["episodic_memory", "foresight", "event_log", "profile"],
				"default": "episodic_memory",
				"description": "episodic_memory (conversation summaries), foresight (predicted future needs), event_log (atomic facts) or profile (user profile)."
			},
			"group_id": {
				"type": ["string", "null"],
				"description": "Optional project or group filter."
			},
			"limit": {
				"type": "integer",
				"minimum": 1,
				"maximum": MAX_GET_LIMIT,
				"default": 10,
				"description": "Maximum number of results. Values above the maximum are capped."
			}
		}
	}))
}

fn delete_memory_schema() -> Arc<JsonObject> {
	Arc::new(rmcp::object!({
		"type": "object",
		"additionalProperties": false,
		"properties": {
			"user_id": {
				"type": ["string", "null"],
				"description": "User ID whose memories are deleted. Defaults to EVERMEM_USER_ID."
			},
			"group_id": {
				"type": ["string", "null"],
				"description": "Only delete memories in this group."
			},
			"memory_type": {
				"type": ["string", "null"],
				"enum": ["episodic_memory", "foresight", "event_log", null],
				"description": "Only delete memories of this type."
			}
		}
	}))
}
