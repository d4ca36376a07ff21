use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.liveavatar.com";

/// Page size requested from the upstream voice list.
pub const DEFAULT_PAGE_SIZE: usize = 100;

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_max_pages() -> usize {
    100
}

fn default_timeout_seconds() -> u64 {
    30
}

/// Connection settings for the upstream LiveAvatar API.
#[derive(Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default, skip_serializing)]
    pub api_key: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Upper bound on paged requests per listing. Default: 100.
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    #[serde(default = "default_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key: String::new(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            request_timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .field("max_pages", &self.max_pages)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl UpstreamConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// The collection endpoint, without paging parameters.
    pub fn voices_url(&self) -> String {
        format!("{}/v1/voices", self.api_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}
