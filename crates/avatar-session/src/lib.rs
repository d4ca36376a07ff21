//! Client-side session orchestration for the avatar kiosk.
//!
//! The avatar SDK, the embedding application and the display are reached
//! through the traits in [`sdk`]. Everything the kiosk owns itself lives
//! here: the persisted configuration ([`store`]), the session countdown
//! ([`countdown`]), the settings form's voice picker ([`picker`]),
//! background images ([`image`]) and per-app profiles ([`profile`]).
//! [`SessionController`] ties them together.

pub mod controller;
pub mod countdown;
pub mod error;
pub mod image;
pub mod picker;
pub mod profile;
pub mod sdk;
pub mod store;

pub use controller::{SessionController, SessionDeps};
pub use countdown::Countdown;
pub use error::{SdkError, SessionError};
pub use picker::{VoiceListState, VoicePicker, VoiceSelection};
pub use profile::{load_profile, ProfileError, SessionProfile};
pub use sdk::{AvatarSdk, DisplaySurface, Headless, SessionHost};
pub use store::{
    load_session_config, MemorySettingsStore, SettingKey, SettingsStore, SqliteSettingsStore,
    StoreError,
};
