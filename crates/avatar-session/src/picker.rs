//! Voice picker state for the settings form.

use avatar_types::VoiceOption;
use avatar_voice::{fetch_voice_options, VoiceError};
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

/// What the settings form renders for the voice list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceListState {
    pub loading: bool,
    pub voices: Vec<VoiceOption>,
    /// Inline error text; never blocks the rest of the form.
    pub error: Option<String>,
}

/// How the current voice id relates to the loaded list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VoiceSelection {
    /// No voice chosen; the SDK default is used.
    None,
    Listed(VoiceOption),
    Custom(String),
}

/// Loads the voice list once per settings form and tracks the result.
///
/// After [`VoicePicker::teardown`] (or drop) an in-flight load is abandoned
/// and its result discarded.
#[derive(Debug, Default)]
pub struct VoicePicker {
    state: Mutex<VoiceListState>,
    cancel: CancellationToken,
}

impl VoicePicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetches the list from the kiosk server's `/api/list-voices` route.
    pub async fn load_from(&self, http: &reqwest::Client, url: &str) {
        self.load(fetch_voice_options(http, url)).await;
    }

    /// Runs `fetch` and records its outcome unless the picker was torn down.
    pub async fn load<F>(&self, fetch: F)
    where
        F: Future<Output = Result<Vec<VoiceOption>, VoiceError>>,
    {
        if self.cancel.is_cancelled() {
            return;
        }
        self.update(|state| {
            state.loading = true;
            state.error = None;
        });

        let result = tokio::select! {
            _ = self.cancel.cancelled() => {
                tracing::debug!("voice picker torn down, discarding voice list");
                return;
            }
            result = fetch => result,
        };

        match result {
            Ok(voices) => {
                tracing::debug!(count = voices.len(), "loaded voice list");
                self.update(|state| {
                    state.loading = false;
                    state.voices = voices;
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load voice list");
                self.update(|state| {
                    state.loading = false;
                    state.voices.clear();
                    state.error = Some(e.to_string());
                });
            }
        }
    }

    pub fn state(&self) -> VoiceListState {
        self.lock().clone()
    }

    pub fn teardown(&self) {
        self.cancel.cancel();
    }

    /// Classifies `voice_id` against the loaded list.
    pub fn selection(&self, voice_id: &str, use_custom: bool) -> VoiceSelection {
        if use_custom {
            return VoiceSelection::Custom(voice_id.to_string());
        }
        if voice_id.is_empty() {
            return VoiceSelection::None;
        }
        let state = self.lock();
        match state.voices.iter().find(|v| v.id == voice_id) {
            Some(voice) => VoiceSelection::Listed(voice.clone()),
            None => VoiceSelection::Custom(voice_id.to_string()),
        }
    }

    /// The free-text voice id input is shown when custom is chosen or there
    /// is nothing to pick from.
    pub fn shows_custom_input(&self, use_custom: bool) -> bool {
        use_custom || self.lock().voices.is_empty()
    }

    fn update(&self, f: impl FnOnce(&mut VoiceListState)) {
        if self.cancel.is_cancelled() {
            return;
        }
        f(&mut self.lock());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VoiceListState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for VoicePicker {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn voice(id: &str, name: &str) -> VoiceOption {
        VoiceOption {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn load_records_voices() {
        let picker = VoicePicker::new();
        picker
            .load(async { Ok(vec![voice("v1", "Ava"), voice("v2", "Ben")]) })
            .await;

        let state = picker.state();
        assert!(!state.loading);
        assert_eq!(state.voices.len(), 2);
        assert_eq!(state.error, None);
    }

    #[tokio::test]
    async fn load_error_is_inline_text() {
        let picker = VoicePicker::new();
        picker
            .load(async { Err(VoiceError::Listing("Failed to fetch voices".to_string())) })
            .await;

        let state = picker.state();
        assert!(!state.loading);
        assert!(state.voices.is_empty());
        assert_eq!(state.error.as_deref(), Some("Failed to fetch voices"));
        assert!(picker.shows_custom_input(false));
    }

    #[tokio::test]
    async fn result_after_teardown_is_discarded() {
        let picker = Arc::new(VoicePicker::new());
        let (tx, rx) = tokio::sync::oneshot::channel::<Vec<VoiceOption>>();

        let loading = Arc::clone(&picker);
        let task = tokio::spawn(async move {
            loading
                .load(async move { Ok(rx.await.unwrap_or_default()) })
                .await;
        });

        tokio::task::yield_now().await;
        picker.teardown();
        let _ = tx.send(vec![voice("late", "Late")]);
        task.await.unwrap();

        assert!(picker.state().voices.is_empty());
        assert_eq!(picker.state().error, None);
    }

    #[tokio::test]
    async fn selection_classifies_voice_ids() {
        let picker = VoicePicker::new();
        picker.load(async { Ok(vec![voice("v1", "Ava")]) }).await;

        assert_eq!(picker.selection("", false), VoiceSelection::None);
        assert_eq!(picker.selection("v1", false), VoiceSelection::Listed(voice("v1", "Ava")));
        assert_eq!(picker.selection("zzz", false), VoiceSelection::Custom("zzz".to_string()));
        assert_eq!(picker.selection("v1", true), VoiceSelection::Custom("v1".to_string()));
        assert!(!picker.shows_custom_input(false));
        assert!(picker.shows_custom_input(true));
    }
}
