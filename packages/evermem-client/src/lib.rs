//! HTTP client for the EverMemOS memory API.
//!
//! Every call builds its own connection with the configured timeout and returns the decoded JSON
//! body untouched; shaping the response for display is the caller's job.

mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{
	AddMemory, ConversationMeta, DeleteMemories, GetMemories, MemoryMessage, SaveConversationMeta,
	SearchMemories, UserDetail,
};

use reqwest::{
	Client, RequestBuilder,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue},
};
use serde_json::Value;
use time::OffsetDateTime;

use evermem_config::Api;

const ENDPOINT_META: &str = "POST /memories/conversation-meta";
const ENDPOINT_ADD: &str = "POST /memories";
const ENDPOINT_SEARCH_POST: &str = "POST /memories/search";
const ENDPOINT_SEARCH_GET: &str = "GET /memories/search";
const ENDPOINT_GET: &str = "GET /memories";
const ENDPOINT_DELETE: &str = "DELETE /memories";

/// How the search endpoint is called.
///
/// Keyed off API-key presence: the cloud deployment expects a JSON body, the local one query
/// parameters. Authentication and transport are coupled here and nowhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchTransport {
	PostJson,
	GetQuery,
}

/// Result of the create-if-absent conversation meta step.
#[derive(Debug)]
pub enum MetaOutcome {
	Created,
	AlreadyExists,
	Failed(Error),
}

#[derive(Clone, Debug)]
pub struct EverMemClient {
	api: Api,
}
impl EverMemClient {
	pub fn new(api: Api) -> Self {
		tracing::info!(
			base_url = %api.base_url,
			api_version = %api.api_version,
			cloud = api.has_api_key(),
			"EverMemOS client initialized."
		);

		Self { api }
	}

	pub fn api(&self) -> &Api {
		&self.api
	}

	pub fn search_transport(&self) -> SearchTransport {
		if self.api.has_api_key() { SearchTransport::PostJson } else { SearchTransport::GetQuery }
	}

	pub async fn save_conversation_meta(&self, request: SaveConversationMeta) -> Result<Value> {
		let url = format!("{}/conversation-meta", self.api.memories_url());
		let payload = request.into_payload(OffsetDateTime::now_utc())?;
		let builder = self.http(ENDPOINT_META)?.post(url).json(&payload);

		self.send(ENDPOINT_META, builder).await
	}

	/// Registers default meta for `group_id`, classifying "already there" rejections.
	pub async fn ensure_conversation_meta(&self, group_id: &str) -> MetaOutcome {
		match self.save_conversation_meta(SaveConversationMeta::new(group_id)).await {
			Ok(_) => MetaOutcome::Created,
			Err(err) if err.is_already_exists() => MetaOutcome::AlreadyExists,
			Err(err) => MetaOutcome::Failed(err),
		}
	}

	pub async fn add_memory(&self, request: AddMemory) -> Result<Value> {
		let message = request.into_message(OffsetDateTime::now_utc())?;
		let builder = self.http(ENDPOINT_ADD)?.post(self.api.memories_url()).json(&message);

		tracing::debug!(
			message_id = %message.message_id,
			group_id = %message.group_id,
			flush = message.flush,
			"Storing memory."
		);

		self.send(ENDPOINT_ADD, builder).await
	}

	pub async fn search_memories(&self, request: SearchMemories) -> Result<Value> {
		let request = request.normalized();
		let url = format!("{}/search", self.api.memories_url());

		match self.search_transport() {
			SearchTransport::PostJson => {
				let builder = self.http(ENDPOINT_SEARCH_POST)?.post(url).json(&request);

				self.send(ENDPOINT_SEARCH_POST, builder).await
			},
			SearchTransport::GetQuery => {
				let builder =
					self.http(ENDPOINT_SEARCH_GET)?.get(url).query(&request.query_pairs());

				self.send(ENDPOINT_SEARCH_GET, builder).await
			},
		}
	}

	pub async fn get_memories(&self, request: GetMemories) -> Result<Value> {
		let builder =
			self.http(ENDPOINT_GET)?.get(self.api.memories_url()).query(&request.query_pairs());

		self.send(ENDPOINT_GET, builder).await
	}

	/// Soft delete. What "deleted" means is decided by the remote service.
	pub async fn delete_memories(&self, request: DeleteMemories) -> Result<Value> {
		let request = request.normalized();
		let builder = self.http(ENDPOINT_DELETE)?.delete(self.api.memories_url()).json(&request);

		self.send(ENDPOINT_DELETE, builder).await
	}

	fn headers(&self) -> Result<HeaderMap> {
		let mut headers = HeaderMap::new();

		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		if let Some(api_key) = &self.api.api_key {
			headers.insert(AUTHORIZATION, format!("Bearer {api_key}").parse()?);
		}

		Ok(headers)
	}

	// One client per call: the connection never outlives the request.
	fn http(&self, endpoint: &'static str) -> Result<Client> {
		Client::builder()
			.timeout(self.api.timeout)
			.pool_max_idle_per_host(0)
			.build()
			.map_err(|source| Error::Transport { endpoint, source })
	}

	async fn send(&self, endpoint: &'static str, builder: RequestBuilder) -> Result<Value> {
		tracing::debug!(endpoint, "Calling EverMemOS.");

		let response = builder
			.headers(self.headers()?)
			.send()
			.await
			.map_err(|source| Error::Transport { endpoint, source })?;
		let status = response.status();
		let body = response.text().await.map_err(|source| Error::Transport { endpoint, source })?;

		if !status.is_success() {
			return Err(Error::Status { endpoint, status: status.as_u16(), body });
		}
		if body.trim().is_empty() {
			return Ok(Value::Null);
		}

		serde_json::from_str(&body).map_err(|source| Error::Decode { endpoint, source })
	}
}
