use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::score::coerce_score_or_zero;

/// Position of a node in the authored order. Terminality is never stored:
/// a node with no choices is an end node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Start,
    #[default]
    Normal,
}

/// Media attached to a node, e.g. `{"type": "image", "url": "/asset.jpg"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Media {
    #[serde(rename = "type")]
    pub media_type: String,
    pub url: String,
}

impl Media {
    pub fn is_image(&self) -> bool {
        self.media_type == "image"
    }
}

/// A labeled edge to another node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub target_node_id: String,
    /// Points awarded when taken, always within `0..=100`.
    pub score: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// One step of the scenario, with every optional field filled in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub content: String,
    pub media: Option<Media>,
    pub left_image_url: String,
    pub right_image_url: String,
    /// Render the content on top of the image instead of beside it.
    pub overlay_text: bool,
    pub hint: String,
    pub transcript_url: String,
    pub choices: Vec<Choice>,
}

impl Node {
    /// Build a typed node from a stored record.
    ///
    /// Never fails. Records written by older editors may lack fields or carry
    /// them with the wrong type; those fall back to defaults. `key` is the id
    /// the record is stored under and is used when the record has no `id`.
    pub fn normalize(key: &str, raw: &Value) -> Node {
        let empty = Map::new();
        let record = match raw.as_object() {
            Some(obj) => obj,
            None => {
                debug!("Stored node {key} is not an object, using defaults");
                &empty
            }
        };

        let media = record.get("media").and_then(Value::as_object).map(|m| Media {
            media_type: string_field(m, "type"),
            url: string_field(m, "url"),
        });

        let left_image_url = match record.get("left_image_url").and_then(Value::as_str) {
            Some(url) => url.to_string(),
            None => media
                .as_ref()
                .filter(|m| m.is_image())
                .map(|m| m.url.clone())
                .unwrap_or_default(),
        };

        let kind = match record.get("type").and_then(Value::as_str) {
            Some("start") => NodeKind::Start,
            _ => NodeKind::Normal,
        };

        let choices = match record.get("choices") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| {
                    let choice = item.as_object();
                    if choice.is_none() {
                        debug!("Dropping malformed choice in node {key}: {item}");
                    }
                    choice.map(normalize_choice)
                })
                .collect(),
            _ => Vec::new(),
        };

        Node {
            id: record
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or(key)
                .to_string(),
            kind,
            content: string_field(record, "content"),
            media,
            left_image_url,
            right_image_url: string_field(record, "right_image_url"),
            overlay_text: record.get("overlay_text").is_some_and(truthy),
            hint: string_field(record, "hint"),
            transcript_url: string_field(record, "transcript_url"),
            choices,
        }
    }

    /// End nodes have no outgoing choices.
    pub fn is_terminal(&self) -> bool {
        self.choices.is_empty()
    }

    pub fn choice(&self, index: usize) -> Option<&Choice> {
        self.choices.get(index)
    }
}

fn normalize_choice(record: &Map<String, Value>) -> Choice {
    Choice {
        text: string_field(record, "text"),
        target_node_id: string_field(record, "target_node_id"),
        score: record
            .get("score")
            .map(coerce_score_or_zero)
            .unwrap_or(0),
        feedback: optional_string(record, "feedback"),
        hint: optional_string(record, "hint"),
    }
}

fn string_field(record: &Map<String, Value>, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn optional_string(record: &Map<String, Value>, key: &str) -> Option<String> {
    record.get(key).and_then(Value::as_str).map(str::to_string)
}

/// Loose truthiness for flags stored by older editors.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_legacy_node_gets_defaults() {
        let raw = json!({
            "id": "n1",
            "content": "<p>Hi</p>",
            "media": {"type": "image", "url": "/a.png"},
            "choices": [{"text": "Next", "target_node_id": "n2"}]
        });
        let node = Node::normalize("n1", &raw);
        assert!(!node.overlay_text);
        assert_eq!(node.left_image_url, "/a.png");
        assert_eq!(node.right_image_url, "");
        assert_eq!(node.kind, NodeKind::Normal);
        assert_eq!(node.choices[0].score, 0);
        assert!(!node.is_terminal());
    }

    #[test]
    fn test_left_image_only_falls_back_for_images() {
        let raw = json!({"media": {"type": "video", "url": "/v.mp4"}});
        let node = Node::normalize("v", &raw);
        assert_eq!(node.left_image_url, "");
        assert_eq!(node.id, "v");
    }

    #[test]
    fn test_explicit_left_image_is_kept() {
        let raw = json!({
            "media": {"type": "image", "url": "/a.png"},
            "left_image_url": ""
        });
        assert_eq!(Node::normalize("x", &raw).left_image_url, "");
    }

    #[test]
    fn test_invalid_scores_become_zero() {
        let raw = json!({
            "choices": [
                {"text": "a", "target_node_id": "b", "score": true},
                {"text": "b", "target_node_id": "b", "score": "75"},
                {"text": "c", "target_node_id": "b", "score": 12.5},
                "not a choice"
            ]
        });
        let node = Node::normalize("n", &raw);
        let scores: Vec<u32> = node.choices.iter().map(|c| c.score).collect();
        assert_eq!(scores, vec![0, 75, 0]);
    }

    #[test]
    fn test_wrong_types_fall_back() {
        let raw = json!({"content": 5, "choices": "none", "overlay_text": 1});
        let node = Node::normalize("k", &raw);
        assert_eq!(node.content, "");
        assert!(node.is_terminal());
        assert!(node.overlay_text);

        let node = Node::normalize("k", &json!("garbage"));
        assert_eq!(node.id, "k");
        assert!(node.media.is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "id": "n1",
            "type": "start",
            "content": "Hello",
            "media": {"type": "image", "url": "/a.png"},
            "hint": "look left",
            "choices": [
                {"text": "Go", "target_node_id": "n2", "score": "40", "feedback": "ok"}
            ]
        });
        let once = Node::normalize("n1", &raw);
        let again = Node::normalize("n1", &serde_json::to_value(&once).unwrap());
        assert_eq!(once, again);
        assert_eq!(again.choices[0].feedback.as_deref(), Some("ok"));
    }
}
