//! Voice catalog access for the avatar kiosk.
//!
//! The upstream LiveAvatar API lists voices page by page. [`VoiceCatalogClient`]
//! gathers every page into one list, falling back once to the unpaged
//! endpoint when the deployment rejects paging parameters. The kiosk server
//! exposes the result at `/api/list-voices`; [`fetch_voice_options`] is the
//! client side of that route.

pub mod catalog;
pub mod config;
pub mod error;
pub mod fetch;

pub use catalog::VoiceCatalogClient;
pub use config::{UpstreamConfig, DEFAULT_API_URL, DEFAULT_PAGE_SIZE};
pub use error::VoiceError;
pub use fetch::fetch_voice_options;
