//! Seams to the collaborators the controller does not own: the avatar SDK,
//! the host application and the display surface.

use crate::error::SdkError;
use async_trait::async_trait;
use avatar_types::{ConnectionQuality, RestartConfig, SessionState, VoiceChatStatus};

/// The avatar SDK's session, voice chat and text chat surface.
///
/// The SDK owns the session state machine; the controller only reads it and
/// is told about transitions through [`crate::SessionController::observe`].
#[async_trait]
pub trait AvatarSdk: Send + Sync {
    async fn start_session(&self) -> Result<(), SdkError>;
    async fn stop_session(&self) -> Result<(), SdkError>;
    fn session_state(&self) -> SessionState;
    fn connection_quality(&self) -> ConnectionQuality;
    fn is_stream_ready(&self) -> bool;
    /// Binds the SDK's media stream to the kiosk's video element.
    fn attach_element(&self);

    async fn start_voice_chat(&self) -> Result<(), SdkError>;
    fn stop_voice_chat(&self);
    fn mute(&self);
    fn unmute(&self);
    fn voice_chat(&self) -> VoiceChatStatus;

    async fn send_message(&self, text: &str) -> Result<(), SdkError>;
    /// Makes the avatar speak `text` verbatim (custom mode).
    async fn repeat(&self, text: &str) -> Result<(), SdkError>;
}

/// Callbacks into the application embedding the controller.
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// The SDK session reached `Disconnected`.
    fn session_stopped(&self);

    /// Start a fresh session with `config`. Called only after the previous
    /// session has been torn down.
    async fn restart_session(&self, config: RestartConfig);
}

/// Fullscreen control over the video container.
#[async_trait]
pub trait DisplaySurface: Send + Sync {
    fn is_fullscreen(&self) -> bool;
    async fn request_fullscreen(&self) -> Result<(), SdkError>;
    async fn exit_fullscreen(&self) -> Result<(), SdkError>;
}

/// Display for hosts without a fullscreen capable surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct Headless;

#[async_trait]
impl DisplaySurface for Headless {
    fn is_fullscreen(&self) -> bool {
        false
    }

    async fn request_fullscreen(&self) -> Result<(), SdkError> {
        Err(SdkError("fullscreen is not supported by this display".to_string()))
    }

    async fn exit_fullscreen(&self) -> Result<(), SdkError> {
        Ok(())
    }
}
