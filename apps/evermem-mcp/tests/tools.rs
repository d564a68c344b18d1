mod common;

use serde_json::json;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{body_partial_json, method, path, query_param},
};

use common::{params, tools_for};

#[tokio::test]
async fn store_memory_applies_defaults_and_reports_status() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/v1/memories/conversation-meta"))
		.and(body_partial_json(json!({ "group_id": "windsurf_project" })))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "ok" })))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/api/v1/memories"))
		.and(body_partial_json(json!({
			"sender": "windsurf_user",
			"sender_name": "windsurf_user",
			"group_id": "windsurf_project",
			"role": "assistant",
			"content": "Deploys go through Docker.",
		})))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"status": "ok",
			"message": "Extraction queued",
			"request_id": "req-42",
		})))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text = tools
		.store_memory(params(json!({ "content": "Deploys go through Docker.", "role": "assistant" })))
		.await;

	assert_eq!(
		text,
		"Memory stored successfully.\n- Status: ok\n- Message: Extraction queued\n- Request ID: req-42"
	);
}

#[tokio::test]
async fn store_memory_proceeds_when_meta_step_fails() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/v1/memories/conversation-meta"))
		.respond_with(ResponseTemplate::new(500).set_body_string("meta store down"))
		.expect(1)
		.mount(&server)
		.await;
	Mock::given(method("POST"))
		.and(path("/api/v1/memories"))
		.and(body_partial_json(json!({ "sender": "alice", "group_id": "proj1", "flush": true })))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "request_id": "r" })))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text = tools
		.store_memory(params(json!({
			"content": "Uses Postgres.",
			"sender": "alice",
			"group_id": "proj1",
			"flush": true,
		})))
		.await;

	assert!(text.starts_with("Memory stored successfully."), "{text}");
	assert!(text.contains("- Status: unknown"), "{text}");
}

#[tokio::test]
async fn store_memory_failure_is_rendered_as_text() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/v1/memories"))
		.respond_with(ResponseTemplate::new(422).set_body_string("content too long"))
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text = tools.store_memory(params(json!({ "content": "x" }))).await;

	assert!(text.starts_with("Failed to store memory:"), "{text}");
	assert!(text.contains("422") && text.contains("content too long"), "{text}");
}

#[tokio::test]
async fn invalid_arguments_are_rendered_as_text() {
	let tools = tools_for("http://127.0.0.1:9", None);
	let missing = tools.store_memory(params(json!({ "role": "user" }))).await;
	let blank = tools.store_memory(params(json!({ "content": "   " }))).await;
	let mistyped = tools.search_memory(params(json!({ "query": "q", "top_k": "many" }))).await;

	assert!(missing.starts_with("Failed to store memory: invalid arguments"), "{missing}");
	assert!(blank.contains("content must be non-empty."), "{blank}");
	assert!(mistyped.starts_with("Failed to search memory: invalid arguments"), "{mistyped}");
}

#[tokio::test]
async fn search_memory_clamps_top_k_and_formats_results() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/api/v1/memories/search"))
		.and(query_param("user_id", "windsurf_user"))
		.and(query_param("retrieve_method", "keyword"))
		.and(query_param("top_k", "20"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"result": {
				"memories": [{
					"memory_type": "episodic_memory",
					"summary": "likes Python",
					"timestamp": "2024-01-01T00:00:00Z",
				}],
				"scores": [0.87],
				"total_count": 1,
			}
		})))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text = tools.search_memory(params(json!({ "query": "language", "top_k": 500 }))).await;

	assert!(text.contains("[relevance: 0.87]"), "{text}");
	assert!(text.contains("likes Python"), "{text}");
}

#[tokio::test]
async fn cloud_search_posts_clamped_body() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/api/v1/memories/search"))
		.and(body_partial_json(json!({ "top_k": 20, "query": "docker" })))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({ "memories": [] })))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), Some("sk-cloud"));
	let text = tools.search_memory(params(json!({ "query": "docker", "top_k": 25 }))).await;

	assert_eq!(text, "No relevant memories found.");
}

#[tokio::test]
async fn get_memories_clamps_limit_and_formats_groups() {
	let server = MockServer::start().await;

	Mock::given(method("GET"))
		.and(path("/api/v1/memories"))
		.and(query_param("limit", "50"))
		.and(query_param("memory_type", "event_log"))
		.and(query_param("group_id", "proj1"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"result": { "memories": [{ "proj1": [{ "episode": "deployed via Docker" }] }] }
		})))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text = tools
		.get_memories(params(json!({
			"memory_type": "event_log",
			"group_id": "proj1",
			"limit": 99,
		})))
		.await;

	assert!(text.starts_with("Retrieved 1 memories:"), "{text}");
	assert!(text.contains("── Group: proj1 ──"), "{text}");
	assert!(text.contains("deployed via Docker"), "{text}");
}

#[tokio::test]
async fn delete_memory_reports_status() {
	let server = MockServer::start().await;

	Mock::given(method("DELETE"))
		.and(path("/api/v1/memories"))
		.and(body_partial_json(json!({ "user_id": "alice", "memory_type": "foresight" })))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"status": "ok",
			"message": "3 memories deleted",
		})))
		.expect(1)
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let text =
		tools.delete_memory(params(json!({ "user_id": "alice", "memory_type": "foresight" }))).await;

	assert_eq!(text, "Delete completed.\n- Status: ok\n- Message: 3 memories deleted");
}

#[tokio::test]
async fn every_tool_renders_http_failures_as_text() {
	let server = MockServer::start().await;

	Mock::given(wiremock::matchers::any())
		.respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
		.mount(&server)
		.await;

	let tools = tools_for(&server.uri(), None);
	let outputs: Vec<(String, &str)> = vec![
		(tools.store_memory(params(json!({ "content": "c" }))).await, "Failed to store memory"),
		(tools.search_memory(params(json!({ "query": "q" }))).await, "Failed to search memory"),
		(tools.get_memories(params(json!({}))).await, "Failed to get memories"),
		(tools.delete_memory(params(json!({}))).await, "Failed to delete memory"),
	];

	for (text, prefix) in outputs {
		assert!(text.starts_with(prefix), "{text}");
		assert!(text.contains("internal failure"), "{text}");
	}
}

#[tokio::test]
async fn unreachable_service_is_rendered_as_text() {
	let tools = tools_for("http://127.0.0.1:9", None);
	let text = tools.get_memories(params(json!({}))).await;

	assert!(text.starts_with("Failed to get memories: GET /memories request failed"), "{text}");
}
