//! Client side of the kiosk's `/api/list-voices` route.

use crate::error::VoiceError;
use avatar_types::{extract_voice_items, normalize_voices, VoiceOption};
use reqwest::Client;
use serde_json::Value;

/// Fetches the voice list from a kiosk server and normalizes it.
///
/// A body carrying an `error` field is reported as [`VoiceError::Listing`]
/// with that message, whatever the status code.
pub async fn fetch_voice_options(http: &Client, url: &str) -> Result<Vec<VoiceOption>, VoiceError> {
    let response = http.get(url).send().await?;
    let status = response.status();
    let body = response.text().await?;

    let value: Value = match serde_json::from_str(&body) {
        Ok(value) => value,
        Err(_) if !status.is_success() => {
            let reason = status.canonical_reason().unwrap_or("request failed");
            return Err(VoiceError::Listing(reason.to_string()));
        }
        Err(e) => return Err(VoiceError::Decode(e)),
    };

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return Err(VoiceError::Listing(message.to_string()));
    }
    if !status.is_success() {
        let reason = status.canonical_reason().unwrap_or("request failed");
        return Err(VoiceError::Listing(reason.to_string()));
    }

    Ok(normalize_voices(&extract_voice_items(value)))
}
