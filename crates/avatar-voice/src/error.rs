use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    /// The upstream answered with a non-success status.
    #[error("LiveAvatar API error ({status}): {body}")]
    Upstream { status: u16, body: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid JSON from voice API: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error message reported by the kiosk's own voice list route.
    #[error("{0}")]
    Listing(String),
}
