use crate::config::UpstreamConfig;
use crate::error::VoiceError;
use avatar_types::{extract_voice_items, normalize_voices, VoiceOption};
use reqwest::{Client, Response};
use serde_json::Value;

const API_KEY_HEADER: &str = "X-API-KEY";

/// Client for the upstream voice list.
#[derive(Debug, Clone)]
pub struct VoiceCatalogClient {
    config: UpstreamConfig,
    http: Client,
}

impl VoiceCatalogClient {
    pub fn new(config: UpstreamConfig) -> Result<Self, VoiceError> {
        if config.page_size == 0 || config.max_pages == 0 {
            return Err(VoiceError::Config(
                "page_size and max_pages must be positive".to_string(),
            ));
        }
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        Ok(Self { config, http })
    }

    pub fn is_configured(&self) -> bool {
        !self.config.api_key.is_empty()
    }

    pub fn config(&self) -> &UpstreamConfig {
        &self.config
    }

    /// Fetches every voice the upstream knows about.
    ///
    /// Pages of `page_size` are requested until a short page comes back. If
    /// the very first paged request fails, the unpaged endpoint is tried once
    /// and its answer is taken as the whole list. A failure on any later page
    /// is returned as is; no partial list is produced.
    pub async fn list_voices(&self) -> Result<Vec<VoiceOption>, VoiceError> {
        let page_size = self.config.page_size;
        let mut voices = Vec::new();
        let mut offset = 0;

        for page in 0..self.config.max_pages {
            let response = self.request(Some(offset)).await?;

            if !response.status().is_success() {
                if offset > 0 {
                    return Err(upstream_error(response).await);
                }

                tracing::warn!(
                    status = response.status().as_u16(),
                    "paged voice listing failed, retrying without pagination"
                );
                let fallback = self.request(None).await?;
                if !fallback.status().is_success() {
                    return Err(upstream_error(fallback).await);
                }
                let items = decode_items(fallback).await?;
                voices.extend(normalize_voices(&items));
                return Ok(voices);
            }

            let items = decode_items(response).await?;
            voices.extend(normalize_voices(&items));

            if items.len() < page_size {
                tracing::debug!(pages = page + 1, count = voices.len(), "listed voices");
                return Ok(voices);
            }
            offset += page_size;
        }

        tracing::warn!(
            max_pages = self.config.max_pages,
            count = voices.len(),
            "voice listing stopped at page limit"
        );
        Ok(voices)
    }

    async fn request(&self, offset: Option<usize>) -> Result<Response, VoiceError> {
        let mut request = self
            .http
            .get(self.config.voices_url())
            .header(API_KEY_HEADER, &self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json");

        if let Some(offset) = offset {
            request = request.query(&[("limit", self.config.page_size), ("offset", offset)]);
        }

        Ok(request.send().await?)
    }
}

async fn decode_items(response: Response) -> Result<Vec<Value>, VoiceError> {
    let body = response.text().await?;
    let value: Value = serde_json::from_str(&body)?;
    Ok(extract_voice_items(value))
}

/// Converts a failed upstream response into an error carrying its status and
/// body.
async fn upstream_error(response: Response) -> VoiceError {
    let status = response.status().as_u16();
    match response.text().await {
        Ok(body) => VoiceError::Upstream { status, body },
        Err(e) => VoiceError::Http(e),
    }
}
