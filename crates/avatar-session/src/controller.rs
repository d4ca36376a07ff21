//! The session controller.
//!
//! [`SessionController`] sits between the avatar SDK and the kiosk UI. It
//! owns the local [`SessionConfig`], mirrors the persisted fields into a
//! [`SettingsStore`], runs the session countdown and turns user intents
//! (start voice chat, stop chat, select preset, ...) into ordered SDK and
//! host calls.
//!
//! The SDK owns the session state machine. The controller learns about
//! transitions through [`SessionController::observe`] or by the host calling
//! [`SessionController::handle_state_change`] directly.

use crate::countdown::Countdown;
use crate::error::SessionError;
use crate::image;
use crate::profile::SessionProfile;
use crate::sdk::{AvatarSdk, DisplaySurface, SessionHost};
use crate::store::{load_session_config, SettingKey, SettingsStore};
use avatar_types::{
    find_preset, AvatarPreset, ConnectionQuality, SessionConfig, SessionMode, SessionState,
    TimerState, VoiceChatStatus,
};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Collaborators handed to the controller at construction.
pub struct SessionDeps {
    pub sdk: Arc<dyn AvatarSdk>,
    pub host: Arc<dyn SessionHost>,
    pub display: Arc<dyn DisplaySurface>,
    pub store: Arc<dyn SettingsStore>,
}

pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    mode: SessionMode,
    restart_on_expiry: bool,
    presets: Vec<AvatarPreset>,
    sdk: Arc<dyn AvatarSdk>,
    host: Arc<dyn SessionHost>,
    display: Arc<dyn DisplaySurface>,
    store: Arc<dyn SettingsStore>,
    /// Background tasks go here, so SDK callbacks may arrive on any thread.
    runtime: Handle,
    state: Mutex<ControllerState>,
    shutdown: CancellationToken,
}

struct ControllerState {
    config: SessionConfig,
    /// Last state seen from the SDK.
    session_state: SessionState,
    countdown: Option<Countdown>,
    /// Bumped for every countdown started; a stale expiry is ignored.
    countdown_generation: u64,
    /// The video element has been handed to the SDK for the current live
    /// session.
    stream_attached: bool,
    preset_loading: bool,
}

impl SessionController {
    /// Builds a controller, reading the persisted configuration once.
    ///
    /// Must be called from within a tokio runtime; the controller keeps a
    /// handle to it for the observer and the countdown.
    pub fn new(deps: SessionDeps, profile: SessionProfile) -> Result<Self, SessionError> {
        let runtime = Handle::try_current()?;
        let config = load_session_config(deps.store.as_ref(), &profile.defaults)?;
        let session_state = deps.sdk.session_state();
        tracing::debug!(
            mode = ?profile.mode,
            avatar_id = %config.avatar_id,
            context_id = %config.context_id,
            "session controller created"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                mode: profile.mode,
                restart_on_expiry: profile.restart_on_expiry,
                presets: profile.presets,
                sdk: deps.sdk,
                host: deps.host,
                display: deps.display,
                store: deps.store,
                runtime,
                state: Mutex::new(ControllerState {
                    config,
                    session_state,
                    countdown: None,
                    countdown_generation: 0,
                    stream_attached: false,
                    preset_loading: false,
                }),
                shutdown: CancellationToken::new(),
            }),
        })
    }

    /// Follows SDK state transitions until the controller is torn down.
    ///
    /// The current value of `states` is applied immediately.
    pub fn observe(&self, mut states: watch::Receiver<SessionState>) {
        let current = *states.borrow_and_update();
        self.inner.handle_state_change(current);

        let inner = Arc::downgrade(&self.inner);
        let shutdown = self.inner.shutdown.clone();
        self.inner.runtime.spawn(async move {
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    changed = states.changed() => {
                        if changed.is_err() {
                            tracing::debug!("session state channel closed");
                            break;
                        }
                        let next = *states.borrow_and_update();
                        match inner.upgrade() {
                            Some(inner) => inner.handle_state_change(next),
                            None => break,
                        }
                    }
                }
            }
        });
    }

    /// Applies one SDK state transition. Safe to call from any thread.
    pub fn handle_state_change(&self, next: SessionState) {
        self.inner.handle_state_change(next);
    }

    /// The SDK reports its media stream is ready. Attaches the video element
    /// if the session is connecting or connected.
    pub fn on_stream_ready(&self) {
        self.inner.attach_stream_if_ready();
    }

    /// Starts the SDK session without voice chat.
    pub async fn start_session(&self) -> Result<(), SessionError> {
        if self.inner.sdk.session_state() == SessionState::Inactive {
            self.inner.sdk.start_session().await?;
        }
        Ok(())
    }

    /// Toggles voice chat, starting the SDK session first when needed.
    ///
    /// Ignored while a preset selection is in flight.
    pub async fn start_voice_chat(&self) -> Result<(), SessionError> {
        if self.is_preset_loading() {
            tracing::debug!("preset loading, ignoring voice chat request");
            return Ok(());
        }

        let sdk = &self.inner.sdk;
        if sdk.voice_chat().active {
            sdk.stop_voice_chat();
            return Ok(());
        }
        if sdk.session_state() == SessionState::Inactive {
            sdk.start_session().await?;
        }
        sdk.start_voice_chat().await?;
        Ok(())
    }

    /// Switches to `preset`, persisting its ids, tearing down any live
    /// session and asking the host for a new one.
    ///
    /// A second selection while one is in flight is ignored.
    pub async fn select_preset(&self, preset: &AvatarPreset) -> Result<(), SessionError> {
        let Some(_loading) = PresetLoading::begin(&self.inner) else {
            tracing::debug!(preset = %preset.name, "preset already loading, ignoring selection");
            return Ok(());
        };

        self.inner.persist_preset(preset)?;
        let restart = {
            let mut state = self.inner.lock();
            state.config.avatar_id = preset.avatar_id.clone();
            state.config.context_id = preset.context_id.clone();
            state.config.restart_config()
        };
        tracing::info!(preset = %preset.name, avatar_id = %preset.avatar_id, "selected avatar preset");

        let sdk = &self.inner.sdk;
        if sdk.session_state() != SessionState::Inactive {
            if sdk.voice_chat().active {
                sdk.stop_voice_chat();
            }
            sdk.stop_session().await?;
        }
        self.inner.host.restart_session(restart).await;
        Ok(())
    }

    /// Ends the current session and asks the host to start a fresh one with
    /// the current configuration.
    pub async fn stop_chat(&self) -> Result<(), SessionError> {
        let sdk = &self.inner.sdk;
        if sdk.voice_chat().active {
            sdk.stop_voice_chat();
        }
        sdk.stop_session().await?;

        let display = &self.inner.display;
        if display.is_fullscreen() {
            if let Err(e) = display.exit_fullscreen().await {
                tracing::warn!(error = %e, "failed to exit fullscreen");
            }
        }

        let restart = self.inner.lock().config.restart_config();
        self.inner.host.restart_session(restart).await;
        Ok(())
    }

    /// Enters or leaves fullscreen. Failures are logged, never returned.
    pub async fn toggle_fullscreen(&self) {
        let display = &self.inner.display;
        let result = if display.is_fullscreen() {
            display.exit_fullscreen().await
        } else {
            display.request_fullscreen().await
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "fullscreen toggle failed");
        }
    }

    /// Sends a text message to the avatar. Blank input is ignored.
    pub async fn send_message(&self, text: &str) -> Result<(), SessionError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.inner.sdk.send_message(text).await?;
        Ok(())
    }

    /// Makes the avatar speak `text` verbatim. Custom mode only.
    pub async fn repeat(&self, text: &str) -> Result<(), SessionError> {
        if self.inner.mode != SessionMode::Custom {
            return Err(SessionError::Unsupported {
                action: "repeat",
                mode: self.inner.mode,
            });
        }
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.inner.sdk.repeat(text).await?;
        Ok(())
    }

    /// Flips the microphone. Ignored while voice chat is still loading.
    pub fn toggle_mute(&self) {
        let sdk = &self.inner.sdk;
        let voice = sdk.voice_chat();
        if voice.loading {
            tracing::debug!("voice chat loading, ignoring mute toggle");
            return;
        }
        if voice.muted {
            sdk.unmute();
        } else {
            sdk.mute();
        }
    }

    /// Sets the avatar override. Empty restores the default on next load.
    pub fn set_avatar_id(&self, avatar_id: &str) -> Result<(), SessionError> {
        self.inner.store.set_or_clear(SettingKey::AvatarId, avatar_id)?;
        self.inner.lock().config.avatar_id = avatar_id.to_string();
        Ok(())
    }

    /// Sets the context id. Empty restores the default on next load.
    pub fn set_context_id(&self, context_id: &str) -> Result<(), SessionError> {
        self.inner.store.set_or_clear(SettingKey::ContextId, context_id)?;
        self.inner.lock().config.context_id = context_id.to_string();
        Ok(())
    }

    pub fn set_language(&self, language: &str) -> Result<(), SessionError> {
        self.inner.store.set_or_clear(SettingKey::Language, language)?;
        self.inner.lock().config.language = language.to_string();
        Ok(())
    }

    pub fn set_emotion(&self, emotion: &str) -> Result<(), SessionError> {
        self.inner.store.set_or_clear(SettingKey::Emotion, emotion)?;
        self.inner.lock().config.emotion = emotion.to_string();
        Ok(())
    }

    /// Voice choice is kept in memory only.
    pub fn set_voice_id(&self, voice_id: &str) {
        self.inner.lock().config.voice_id = voice_id.to_string();
    }

    /// Sets the session duration. Zero disables the timer.
    ///
    /// A countdown that is already running keeps its original length.
    pub fn set_timer_duration(&self, minutes: Option<u32>) {
        self.inner.lock().config.timer_duration_minutes = minutes.filter(|m| *m > 0);
    }

    /// Sets or clears the background image.
    pub fn set_background_image(&self, image: Option<&str>) -> Result<(), SessionError> {
        let image = image.filter(|value| !value.is_empty());
        match image {
            Some(value) => self.inner.store.set(SettingKey::BackgroundImage, value)?,
            None => self.inner.store.clear(SettingKey::BackgroundImage)?,
        }
        self.inner.lock().config.background_image = image.map(str::to_string);
        Ok(())
    }

    /// Reads a local image file and stores it as the background.
    pub async fn load_background_image(&self, path: &Path) -> Result<(), SessionError> {
        let data_url = image::read_data_url(path).await?;
        tracing::debug!(path = %path.display(), bytes = data_url.len(), "loaded background image");
        self.set_background_image(Some(&data_url))
    }

    pub fn config(&self) -> SessionConfig {
        self.inner.lock().config.clone()
    }

    pub fn timer_state(&self) -> TimerState {
        let state = self.inner.lock();
        TimerState {
            duration_minutes: state.config.timer_duration_minutes,
            remaining_seconds: state.countdown.as_ref().map(Countdown::remaining_seconds),
        }
    }

    /// The last state delivered by the SDK.
    pub fn session_state(&self) -> SessionState {
        self.inner.lock().session_state
    }

    /// Connection quality worth showing: only while connected and known.
    pub fn connection_quality(&self) -> Option<ConnectionQuality> {
        if self.session_state() != SessionState::Connected {
            return None;
        }
        match self.inner.sdk.connection_quality() {
            ConnectionQuality::Unknown => None,
            quality => Some(quality),
        }
    }

    pub fn voice_chat(&self) -> VoiceChatStatus {
        self.inner.sdk.voice_chat()
    }

    /// The video element may be attached once the stream is ready and the
    /// session is connecting or connected.
    pub fn stream_attachable(&self) -> bool {
        self.inner.sdk.is_stream_ready() && self.session_state().is_live()
    }

    /// The preset whose ids match the current configuration.
    pub fn selected_preset(&self) -> Option<AvatarPreset> {
        let state = self.inner.lock();
        find_preset(
            &self.inner.presets,
            &state.config.avatar_id,
            &state.config.context_id,
        )
        .cloned()
    }

    pub fn presets(&self) -> &[AvatarPreset] {
        &self.inner.presets
    }

    pub fn mode(&self) -> SessionMode {
        self.inner.mode
    }

    pub fn is_preset_loading(&self) -> bool {
        self.inner.lock().preset_loading
    }

    /// Stops the observer and any running countdown. Later state changes and
    /// expiries are ignored.
    pub fn teardown(&self) {
        self.inner.teardown();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.inner.teardown();
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn handle_state_change(self: &Arc<Self>, next: SessionState) {
        if self.shutdown.is_cancelled() {
            return;
        }

        let entered_disconnected = {
            let mut state = self.lock();
            let previous = std::mem::replace(&mut state.session_state, next);
            if !next.is_live() {
                state.stream_attached = false;
            }

            match next {
                SessionState::Connected => self.start_countdown(&mut state),
                SessionState::Disconnected | SessionState::Inactive => {
                    if state.countdown.take().is_some() {
                        tracing::debug!(state = ?next, "session left connected, countdown cancelled");
                    }
                }
                SessionState::Connecting => {}
            }

            next == SessionState::Disconnected && previous != SessionState::Disconnected
        };

        if entered_disconnected {
            tracing::info!("avatar session stopped");
            self.host.session_stopped();
        }
        if next.is_live() {
            self.attach_stream_if_ready();
        }
    }

    /// Hands the video element to the SDK once per live session.
    fn attach_stream_if_ready(&self) {
        if self.shutdown.is_cancelled() || !self.sdk.is_stream_ready() {
            return;
        }
        {
            let mut state = self.lock();
            if state.stream_attached || !state.session_state.is_live() {
                return;
            }
            state.stream_attached = true;
        }
        tracing::debug!("attaching avatar video element");
        self.sdk.attach_element();
    }

    /// Writes both preset ids or neither. If the second write fails the
    /// first is put back.
    fn persist_preset(&self, preset: &AvatarPreset) -> Result<(), SessionError> {
        let previous_avatar = self.store.get(SettingKey::AvatarId)?;
        self.store.set_or_clear(SettingKey::AvatarId, &preset.avatar_id)?;

        if let Err(e) = self.store.set_or_clear(SettingKey::ContextId, &preset.context_id) {
            let restore = previous_avatar.as_deref().unwrap_or("");
            if let Err(rollback) = self.store.set_or_clear(SettingKey::AvatarId, restore) {
                tracing::error!(error = %rollback, "failed to restore avatar id after preset write failed");
            }
            return Err(e.into());
        }
        Ok(())
    }

    fn start_countdown(self: &Arc<Self>, state: &mut ControllerState) {
        if state.countdown.is_some() {
            return;
        }
        let Some(minutes) = state.config.timer_duration_minutes.filter(|m| *m > 0) else {
            return;
        };

        state.countdown_generation += 1;
        let generation = state.countdown_generation;
        let seconds = u64::from(minutes) * 60;
        let inner = Arc::downgrade(self);
        state.countdown = Some(Countdown::start(&self.runtime, seconds, move || async move {
            if let Some(inner) = inner.upgrade() {
                inner.expire(generation).await;
            }
        }));
        tracing::info!(seconds, "session countdown started");
    }

    async fn expire(&self, generation: u64) {
        let restart = {
            let mut state = self.lock();
            let current = state.countdown.is_some() && state.countdown_generation == generation;
            if current && !self.shutdown.is_cancelled() {
                state.countdown = None;
                Some(state.config.restart_config())
            } else {
                None
            }
        };
        let Some(restart) = restart else {
            return;
        };

        tracing::info!("session time limit reached, stopping session");
        if let Err(e) = self.sdk.stop_session().await {
            tracing::warn!(error = %e, "failed to stop expired session");
            return;
        }
        if self.restart_on_expiry && !self.shutdown.is_cancelled() {
            self.host.restart_session(restart).await;
        }
    }

    fn teardown(&self) {
        self.shutdown.cancel();
        if self.lock().countdown.take().is_some() {
            tracing::debug!("countdown cancelled on teardown");
        }
    }
}

/// Holds the preset-loading flag for the duration of a selection.
struct PresetLoading<'a> {
    inner: &'a Inner,
}

impl<'a> PresetLoading<'a> {
    fn begin(inner: &'a Inner) -> Option<Self> {
        let mut state = inner.lock();
        if state.preset_loading {
            return None;
        }
        state.preset_loading = true;
        Some(Self { inner })
    }
}

impl Drop for PresetLoading<'_> {
    fn drop(&mut self) {
        self.inner.lock().preset_loading = false;
    }
}
