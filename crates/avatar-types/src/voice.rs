//! Voice catalog types.
//!
//! The upstream voice API has changed its response shape over time: some
//! deployments return a bare array, others wrap the list under `data`,
//! `voices` or `results`, and items carry either `id` or `voice_id`. The
//! helpers here accept all of them and reduce items to a [`VoiceOption`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Keys the upstream has used to wrap the voice list.
const WRAPPER_KEYS: &[&str] = &["data", "voices", "results"];

/// A selectable voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceOption {
    /// Upstream voice id. Never empty.
    pub id: String,
    /// Display name, falling back to the id.
    pub name: String,
}

impl VoiceOption {
    /// Builds an option from one upstream item.
    ///
    /// Returns `None` when the item carries no usable id.
    pub fn from_upstream(item: &Value) -> Option<Self> {
        let id = item
            .get("id")
            .and_then(scalar_to_string)
            .or_else(|| item.get("voice_id").and_then(scalar_to_string))
            .unwrap_or_default();
        if id.is_empty() {
            return None;
        }

        let name = item
            .get("name")
            .and_then(scalar_to_string)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| id.clone());

        Some(Self { id, name })
    }
}

/// Body of `GET /api/list-voices`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceListResponse {
    pub data: Vec<VoiceOption>,
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Pulls the list of raw items out of an upstream body.
///
/// Unknown shapes yield an empty list rather than an error.
pub fn extract_voice_items(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => WRAPPER_KEYS
            .iter()
            .find_map(|key| match map.remove(*key) {
                Some(Value::Array(items)) => Some(items),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Normalizes raw upstream items, dropping those without an id.
pub fn normalize_voices(items: &[Value]) -> Vec<VoiceOption> {
    items.iter().filter_map(VoiceOption::from_upstream).collect()
}
