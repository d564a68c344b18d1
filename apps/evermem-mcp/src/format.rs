//! Renders EverMemOS search and list responses as plain text for the host model.
//!
//! Responses come in two shapes that are not announced by the API: a memory entry is either a
//! single record or a mapping from group id to a list of records. Each entry is classified once
//! into [`MemoryEntry`], and scores are aligned against the parallel `scores` array by position
//! (flat) or by group key and position (grouped). Anything missing or mistyped renders as empty or
//! zero instead of failing.

use serde_json::{Map, Value};

pub const NO_SEARCH_RESULTS: &str = "No relevant memories found.";
pub const NO_GET_RESULTS: &str = "No memories found for this user.";
pub const NO_CONTENT: &str = "(no content)";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryRecord {
	pub memory_type: Option<String>,
	pub summary: Option<String>,
	pub timestamp: Option<String>,
	pub episode: Option<String>,
}
impl MemoryRecord {
	pub fn from_value(value: &Value) -> Self {
		let Some(object) = value.as_object() else { return Self::default() };

		Self {
			memory_type: text_field(object, "memory_type"),
			summary: text_field(object, "summary"),
			timestamp: text_field(object, "timestamp"),
			episode: text_field(object, "episode"),
		}
	}

	pub fn content(&self) -> &str {
		self.episode.as_deref().or(self.summary.as_deref()).unwrap_or(NO_CONTENT)
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryGroup {
	pub group_id: String,
	pub records: Vec<MemoryRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryEntry {
	Flat(MemoryRecord),
	Grouped(Vec<MemoryGroup>),
}
impl MemoryEntry {
	/// An object with at least one array value is a group mapping; everything else is a record.
	pub fn classify(value: &Value) -> Self {
		match value.as_object() {
			Some(object) if object.values().any(Value::is_array) => Self::Grouped(
				object
					.iter()
					.map(|(group_id, records)| MemoryGroup {
						group_id: group_id.clone(),
						records: match records {
							Value::Array(items) =>
								items.iter().map(MemoryRecord::from_value).collect(),
							single => vec![MemoryRecord::from_value(single)],
						},
					})
					.collect(),
			),
			_ => Self::Flat(MemoryRecord::from_value(value)),
		}
	}
}

pub fn format_search_results(data: &Value) -> String {
	let result = unwrap_result(data);
	let memories = array_field(result, "memories");

	if memories.is_empty() {
		return NO_SEARCH_RESULTS.to_string();
	}

	let scores = array_field(result, "scores");
	let total = result.get("total_count").and_then(Value::as_u64).unwrap_or(memories.len() as u64);
	let mut lines = vec![format!("Found {total} relevant memories:\n")];

	for (index, memory) in memories.iter().enumerate() {
		render_entry(&mut lines, &MemoryEntry::classify(memory), |group, position| match group {
			Some(group_id) => grouped_score(scores, index, group_id, position),
			None => flat_score(scores, index),
		});
	}

	lines.join("\n")
}

pub fn format_get_results(data: &Value) -> String {
	let result = unwrap_result(data);
	let memories = array_field(result, "memories");

	if memories.is_empty() {
		return NO_GET_RESULTS.to_string();
	}

	let mut lines = vec![format!("Retrieved {} memories:\n", memories.len())];

	for memory in memories {
		render_entry(&mut lines, &MemoryEntry::classify(memory), |_, _| 0.0);
	}

	lines.join("\n")
}

pub fn format_record(record: &MemoryRecord, score: f64) -> String {
	let mut parts = Vec::new();

	if score != 0.0 {
		parts.push(format!("[relevance: {score:.2}]"));
	}
	if let Some(timestamp) = &record.timestamp {
		parts.push(format!("({timestamp})"));
	}
	if let Some(memory_type) = &record.memory_type {
		parts.push(format!("[{memory_type}]"));
	}

	format!("• {}\n  {}\n", parts.join(" "), record.content())
}

fn render_entry<F>(lines: &mut Vec<String>, entry: &MemoryEntry, score: F)
where
	F: Fn(Option<&str>, usize) -> f64,
{
	match entry {
		MemoryEntry::Flat(record) => lines.push(format_record(record, score(None, 0))),
		MemoryEntry::Grouped(groups) =>
			for group in groups {
				lines.push(format!("── Group: {} ──", group.group_id));

				for (position, record) in group.records.iter().enumerate() {
					lines.push(format_record(record, score(Some(group.group_id.as_str()), position)));
				}
			},
	}
}

fn unwrap_result(data: &Value) -> &Value {
	data.get("result").filter(|result| result.is_object()).unwrap_or(data)
}

fn array_field<'a>(value: &'a Value, key: &str) -> &'a [Value] {
	value.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or_default()
}

fn flat_score(scores: &[Value], index: usize) -> f64 {
	scores.get(index).and_then(Value::as_f64).unwrap_or(0.0)
}

fn grouped_score(scores: &[Value], index: usize, group_id: &str, position: usize) -> f64 {
	scores
		.get(index)
		.and_then(Value::as_object)
		.and_then(|by_group| by_group.get(group_id))
		.and_then(Value::as_array)
		.and_then(|list| list.get(position))
		.and_then(Value::as_f64)
		.unwrap_or(0.0)
}

fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
	match object.get(key)? {
		Value::Null => None,
		Value::String(text) if text.is_empty() => None,
		Value::String(text) => Some(text.clone()),
		other => Some(other.to_string()),
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn empty_search_result_reports_none_found() {
		let text = format_search_results(&json!({ "result": { "memories": [], "scores": [] } }));

		assert_eq!(text, NO_SEARCH_RESULTS);
	}

	#[test]
	fn empty_get_result_reports_none_found() {
		assert_eq!(format_get_results(&json!({ "memories": [] })), NO_GET_RESULTS);
		assert_eq!(format_get_results(&Value::Null), NO_GET_RESULTS);
	}

	#[test]
	fn flat_memory_renders_score_timestamp_type_and_summary() {
		let data = json!({
			"result": {
				"memories": [{
					"memory_type": "episodic_memory",
					"summary": "likes Python",
					"timestamp": "2024-01-01T00:00:00Z",
				}],
				"scores": [0.87],
				"total_count": 1,
			}
		});
		let text = format_search_results(&data);

		assert!(text.starts_with("Found 1 relevant memories:\n"), "{text}");
		assert!(text.contains("[relevance: 0.87]"), "{text}");
		assert!(text.contains("(2024-01-01T00:00:00Z)"), "{text}");
		assert!(text.contains("[episodic_memory]"), "{text}");
		assert!(text.contains("  likes Python"), "{text}");
	}

	#[test]
	fn grouped_memory_without_score_defaults_to_zero() {
		let data = json!({ "memories": [{ "proj1": [{ "episode": "deployed via Docker" }] }] });
		let text = format_search_results(&data);

		assert!(text.contains("── Group: proj1 ──"), "{text}");
		assert!(text.contains("deployed via Docker"), "{text}");
		assert!(!text.contains("relevance"), "{text}");
	}

	#[test]
	fn grouped_scores_align_by_group_key_and_position() {
		let data = json!({
			"memories": [{ "proj1": [{ "summary": "first" }, { "summary": "second" }] }],
			"scores": [{ "proj1": [0.5, 0.25] }],
		});
		let text = format_search_results(&data);

		assert!(text.contains("• [relevance: 0.50]\n  first"), "{text}");
		assert!(text.contains("• [relevance: 0.25]\n  second"), "{text}");
	}

	#[test]
	fn mismatched_score_shapes_default_to_zero() {
		let data = json!({
			"memories": [{ "summary": "flat" }, { "g": [{ "summary": "grouped" }] }],
			"scores": [{ "unexpected": true }, 0.9],
		});
		let text = format_search_results(&data);

		assert!(!text.contains("relevance"), "{text}");
		assert!(text.starts_with("Found 2 relevant memories:"), "{text}");
	}

	#[test]
	fn episode_wins_over_summary_and_missing_content_uses_placeholder() {
		let with_both = MemoryRecord::from_value(&json!({ "episode": "e", "summary": "s" }));
		let with_none = MemoryRecord::from_value(&json!({ "memory_type": "foresight" }));

		assert_eq!(with_both.content(), "e");
		assert_eq!(format_record(&with_none, 0.0), "• [foresight]\n  (no content)\n");
	}

	#[test]
	fn classifies_flat_and_grouped_entries_once() {
		let flat = MemoryEntry::classify(&json!({ "summary": "s", "score": 1 }));
		let grouped =
			MemoryEntry::classify(&json!({ "a": [{ "summary": "x" }], "b": { "summary": "y" } }));

		assert!(matches!(flat, MemoryEntry::Flat(_)));

		let MemoryEntry::Grouped(groups) = grouped else { panic!("Expected grouped entry.") };

		assert_eq!(groups.len(), 2);
		assert_eq!(groups[1].records[0].summary.as_deref(), Some("y"));
	}

	#[test]
	fn get_results_render_groups_without_scores() {
		let data = json!({
			"result": {
				"memories": [
					{ "proj1": [{ "summary": "uses Redis", "memory_type": "event_log" }] },
					{ "summary": "prefers Postgres" }
				]
			}
		});
		let text = format_get_results(&data);

		assert!(text.starts_with("Retrieved 2 memories:\n"), "{text}");
		assert!(text.contains("── Group: proj1 ──"), "{text}");
		assert!(text.contains("• [event_log]\n  uses Redis"), "{text}");
		assert!(text.contains("prefers Postgres"), "{text}");
		assert!(!text.contains("relevance"), "{text}");
	}
}
