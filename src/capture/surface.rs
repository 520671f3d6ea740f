use super::preview::PreviewStore;
use super::speech::{SpeechRecognizer, TranscriptFragment};
use super::state::{reduce, CaptureEvent, CaptureState, Effect};
use crate::ai::{fetch_outcome, RecommendationService};
use crate::media::MediaAttachment;
use crate::models::RequestOutcome;
use std::sync::Arc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info};

/// Interactive mood capture: owns the input state and runs the reducer's
/// effects against the injected capabilities.
pub struct MoodCapture {
    state: CaptureState,
    recommender: Arc<dyn RecommendationService>,
    recognizer: Box<dyn SpeechRecognizer>,
    previews: Box<dyn PreviewStore>,
    transcript: Option<UnboundedReceiver<TranscriptFragment>>,
}

impl MoodCapture {
    pub fn new(
        recommender: Arc<dyn RecommendationService>,
        recognizer: Box<dyn SpeechRecognizer>,
        previews: Box<dyn PreviewStore>,
    ) -> Self {
        Self {
            state: CaptureState::default(),
            recommender,
            recognizer,
            previews,
            transcript: None,
        }
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    fn dispatch(&mut self, event: CaptureEvent) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (next, effects) = reduce(state, event);
        self.state = next;

        let mut pending = Vec::new();
        for effect in effects {
            match effect {
                Effect::ReleasePreview(handle) => self.previews.revoke(&handle),
                Effect::Submit(_) => pending.push(effect),
            }
        }
        pending
    }

    pub fn edit_text(&mut self, text: impl Into<String>) {
        self.dispatch(CaptureEvent::TextEdited(text.into()));
    }

    pub fn clear_text(&mut self) {
        self.dispatch(CaptureEvent::TextCleared);
    }

    /// Attach media, replacing (and releasing) any previous attachment.
    pub fn attach(&mut self, attachment: MediaAttachment) {
        let preview = self.previews.create(&attachment);
        self.dispatch(CaptureEvent::MediaSelected {
            attachment,
            preview,
        });
    }

    pub fn clear_media(&mut self) {
        self.dispatch(CaptureEvent::MediaCleared);
    }

    pub fn is_listening(&self) -> bool {
        self.state.listening
    }

    /// Start a voice session, or stop the current one.
    pub fn toggle_listening(&mut self) {
        if self.state.listening {
            self.stop_listening();
        } else {
            self.start_listening();
        }
    }

    fn start_listening(&mut self) {
        match self.recognizer.start() {
            Ok(rx) => {
                info!("Voice capture started");
                self.transcript = Some(rx);
                self.dispatch(CaptureEvent::ListeningStarted);
            }
            Err(e) => {
                tracing::warn!("Voice capture unavailable: {}", e);
                self.dispatch(CaptureEvent::ListeningFailed(e.to_string()));
            }
        }
    }

    fn stop_listening(&mut self) {
        self.recognizer.stop();
        // Finals already produced by the engine still belong to the text.
        self.poll_transcript();
        self.transcript = None;
        self.dispatch(CaptureEvent::ListeningStopped);
        info!("Voice capture stopped");
    }

    /// Apply every fragment that has already arrived, without waiting.
    /// Returns the number of fragments applied.
    pub fn poll_transcript(&mut self) -> usize {
        let mut applied = 0;
        loop {
            let next = match self.transcript.as_mut() {
                Some(rx) => rx.try_recv(),
                None => return applied,
            };
            match next {
                Ok(fragment) => {
                    self.dispatch(CaptureEvent::Transcript(fragment));
                    applied += 1;
                }
                Err(TryRecvError::Empty) => return applied,
                Err(TryRecvError::Disconnected) => {
                    self.end_session();
                    return applied;
                }
            }
        }
    }

    /// Wait for the next fragment. Returns `false` once the session has ended.
    pub async fn next_transcript(&mut self) -> bool {
        let next = match self.transcript.as_mut() {
            Some(rx) => rx.recv().await,
            None => return false,
        };
        match next {
            Some(fragment) => {
                self.dispatch(CaptureEvent::Transcript(fragment));
                true
            }
            None => {
                self.end_session();
                false
            }
        }
    }

    // The engine closed a one-shot session by itself.
    fn end_session(&mut self) {
        debug!("Voice session ended");
        self.transcript = None;
        if self.state.listening {
            self.dispatch(CaptureEvent::ListeningStopped);
        }
    }

    /// Submit the current input. Returns the outcome when a request was made;
    /// `None` when submission is disabled or rejected locally.
    pub async fn submit(&mut self) -> Option<RequestOutcome> {
        let pending = self.dispatch(CaptureEvent::SubmitRequested);

        let input = pending.into_iter().find_map(|effect| match effect {
            Effect::Submit(input) => Some(input),
            Effect::ReleasePreview(_) => None,
        })?;

        info!(
            "Submitting mood (text: {} chars, media: {})",
            input.text.len(),
            input
                .media_type()
                .map(|category| category.as_str())
                .unwrap_or("none")
        );

        let outcome = fetch_outcome(
            self.recommender.as_ref(),
            &input.text,
            input.media.as_ref(),
        )
        .await;

        if outcome.is_success() {
            info!("Submission succeeded");
        }
        self.dispatch(CaptureEvent::SubmissionFinished(outcome.clone()));
        Some(outcome)
    }

    /// Stop any voice session and release the live preview.
    pub fn shutdown(&mut self) {
        if self.state.listening || self.transcript.is_some() {
            self.recognizer.stop();
            self.transcript = None;
            self.dispatch(CaptureEvent::ListeningStopped);
        }
        if self.state.input.preview.is_some() {
            self.dispatch(CaptureEvent::MediaCleared);
        }
    }
}

impl Drop for MoodCapture {
    fn drop(&mut self) {
        self.shutdown();
    }
}
