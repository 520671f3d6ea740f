//! Mood capture state and its reducer
//!
//! Every user action and async completion is a [`CaptureEvent`]. [`reduce`]
//! maps `(state, event)` to the next state plus the side effects the
//! controller must run. It performs no IO.

use super::preview::PreviewHandle;
use super::speech::TranscriptFragment;
use crate::ai::mime::MediaCategory;
use crate::media::{MediaAttachment, MAX_MEDIA_BYTES};
use crate::models::{RecommendationResponse, RequestOutcome};
use crate::Error;

/// What the user has entered so far.
#[derive(Debug, Clone, Default)]
pub struct MoodInput {
    pub text: String,
    pub media: Option<MediaAttachment>,
    pub preview: Option<PreviewHandle>,
}

impl MoodInput {
    pub fn media_type(&self) -> Option<MediaCategory> {
        self.media.as_ref().map(MediaAttachment::category)
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.media.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CaptureState {
    pub input: MoodInput,
    pub listening: bool,
    pub submitting: bool,
    /// Latest interim transcript, shown while listening and never committed.
    pub interim: Option<String>,
    pub result: Option<RecommendationResponse>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureStatus {
    Idle,
    Listening,
    Submitting,
    IdleWithResult,
    IdleWithError,
}

impl CaptureState {
    pub fn status(&self) -> CaptureStatus {
        if self.submitting {
            CaptureStatus::Submitting
        } else if self.listening {
            CaptureStatus::Listening
        } else if self.error.is_some() {
            CaptureStatus::IdleWithError
        } else if self.result.is_some() {
            CaptureStatus::IdleWithResult
        } else {
            CaptureStatus::Idle
        }
    }

    /// Submit is enabled only with some input and nothing in flight.
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.input.is_empty()
    }
}

#[derive(Debug, Clone)]
pub enum CaptureEvent {
    TextEdited(String),
    TextCleared,
    MediaSelected {
        attachment: MediaAttachment,
        preview: PreviewHandle,
    },
    MediaCleared,
    ListeningStarted,
    ListeningStopped,
    ListeningFailed(String),
    Transcript(TranscriptFragment),
    SubmitRequested,
    SubmissionFinished(RequestOutcome),
}

#[derive(Debug, Clone)]
pub enum Effect {
    ReleasePreview(PreviewHandle),
    Submit(MoodInput),
}

pub fn reduce(mut state: CaptureState, event: CaptureEvent) -> (CaptureState, Vec<Effect>) {
    let mut effects = Vec::new();

    match event {
        CaptureEvent::TextEdited(text) => {
            if !state.submitting {
                state.input.text = text;
            }
        }
        CaptureEvent::TextCleared => {
            if !state.submitting {
                state.input.text.clear();
            }
        }
        CaptureEvent::MediaSelected {
            attachment,
            preview,
        } => {
            if state.submitting {
                // The form is locked; drop the new handle instead of adopting it.
                effects.push(Effect::ReleasePreview(preview));
            } else {
                if let Some(previous) = state.input.preview.take() {
                    effects.push(Effect::ReleasePreview(previous));
                }
                state.input.media = Some(attachment);
                state.input.preview = Some(preview);
            }
        }
        CaptureEvent::MediaCleared => {
            if !state.submitting {
                if let Some(previous) = state.input.preview.take() {
                    effects.push(Effect::ReleasePreview(previous));
                }
                state.input.media = None;
            }
        }
        CaptureEvent::ListeningStarted => {
            state.listening = true;
            state.interim = None;
        }
        CaptureEvent::ListeningStopped => {
            state.listening = false;
            state.interim = None;
        }
        CaptureEvent::ListeningFailed(message) => {
            state.listening = false;
            state.interim = None;
            state.error = Some(message);
        }
        CaptureEvent::Transcript(fragment) => {
            if fragment.is_final {
                append_transcript(&mut state.input.text, &fragment.text);
                state.interim = None;
            } else if state.listening {
                state.interim = Some(fragment.text);
            }
        }
        CaptureEvent::SubmitRequested => {
            if state.can_submit() {
                state.result = None;
                state.error = None;

                match state.input.media.as_ref().filter(|m| m.exceeds_limit()) {
                    Some(media) => {
                        let err = Error::OversizedMedia {
                            size: media.size(),
                            limit: MAX_MEDIA_BYTES,
                        };
                        tracing::warn!("Rejected submission locally: {}", err);
                        state.error = Some(err.to_string());
                    }
                    None => {
                        state.submitting = true;
                        effects.push(Effect::Submit(state.input.clone()));
                    }
                }
            }
        }
        CaptureEvent::SubmissionFinished(outcome) => {
            state.submitting = false;
            match outcome {
                RequestOutcome::Success(response) => {
                    state.result = Some(response);
                    state.error = None;
                }
                RequestOutcome::Failure { message, .. } => {
                    state.result = None;
                    state.error = Some(message);
                }
            }
        }
    }

    (state, effects)
}

fn append_transcript(text: &mut String, fragment: &str) {
    let fragment = fragment.trim();
    if fragment.is_empty() {
        return;
    }
    if !text.is_empty() {
        text.push(' ');
    }
    text.push_str(fragment);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::preview::{ObjectUrlStore, PreviewStore};
    use crate::models::FailureReason;
    use pretty_assertions::assert_eq;

    fn image(name: &str) -> MediaAttachment {
        MediaAttachment::from_bytes(name, "image/png", vec![0x89u8, 0x50, 0x4E, 0x47]).unwrap()
    }

    fn video(name: &str) -> MediaAttachment {
        MediaAttachment::from_bytes(name, "video/mp4", vec![0u8; 8]).unwrap()
    }

    fn preview() -> PreviewHandle {
        ObjectUrlStore::new().create(&image("preview.png"))
    }

    fn apply(state: CaptureState, events: Vec<CaptureEvent>) -> (CaptureState, Vec<Effect>) {
        let mut effects = Vec::new();
        let mut state = state;
        for event in events {
            let (next, mut produced) = reduce(state, event);
            state = next;
            effects.append(&mut produced);
        }
        (state, effects)
    }

    #[test]
    fn test_submit_is_noop_on_empty_input() {
        let (state, effects) = reduce(CaptureState::default(), CaptureEvent::SubmitRequested);
        assert!(effects.is_empty());
        assert!(!state.submitting);
        assert_eq!(state.status(), CaptureStatus::Idle);

        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("   ".to_string()),
                CaptureEvent::SubmitRequested,
            ],
        );
        assert!(effects.is_empty());
        assert!(!state.can_submit());
    }

    #[test]
    fn test_submit_emits_effect_and_blocks_overlap() {
        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("cozy rainy afternoon".to_string()),
                CaptureEvent::SubmitRequested,
                CaptureEvent::SubmitRequested,
            ],
        );

        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::Submit(input) => assert_eq!(input.text, "cozy rainy afternoon"),
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(state.status(), CaptureStatus::Submitting);
    }

    #[test]
    fn test_media_only_submission_is_allowed() {
        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::MediaSelected {
                    attachment: image("view.png"),
                    preview: preview(),
                },
                CaptureEvent::SubmitRequested,
            ],
        );
        assert!(state.submitting);
        assert!(matches!(effects.last(), Some(Effect::Submit(_))));
    }

    #[test]
    fn test_oversized_media_rejected_locally() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.mp4");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_MEDIA_BYTES + 1).unwrap();
        let attachment = tokio_test::block_on(MediaAttachment::from_path(&path)).unwrap();

        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("keep me".to_string()),
                CaptureEvent::MediaSelected {
                    attachment,
                    preview: preview(),
                },
                CaptureEvent::SubmitRequested,
            ],
        );

        assert!(effects.iter().all(|e| !matches!(e, Effect::Submit(_))));
        assert!(!state.submitting);
        assert!(state.error.as_deref().unwrap().contains("File too large"));
        assert_eq!(state.status(), CaptureStatus::IdleWithError);
        assert_eq!(state.input.text, "keep me");
        assert!(state.input.media.is_some());
    }

    #[test]
    fn test_media_at_exact_limit_is_submitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exact.mp4");
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_MEDIA_BYTES).unwrap();
        let attachment = tokio_test::block_on(MediaAttachment::from_path(&path)).unwrap();

        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::MediaSelected {
                    attachment,
                    preview: preview(),
                },
                CaptureEvent::SubmitRequested,
            ],
        );

        assert!(state.submitting);
        assert!(state.error.is_none());
        assert!(matches!(effects.last(), Some(Effect::Submit(_))));
    }

    #[test]
    fn test_replacing_video_with_image_releases_old_preview() {
        let old_preview = preview();
        let new_preview = preview();

        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::MediaSelected {
                    attachment: video("clip.mp4"),
                    preview: old_preview.clone(),
                },
                CaptureEvent::MediaSelected {
                    attachment: image("view.png"),
                    preview: new_preview.clone(),
                },
            ],
        );

        assert_eq!(effects.len(), 1);
        match &effects[0] {
            Effect::ReleasePreview(handle) => assert_eq!(handle, &old_preview),
            other => panic!("unexpected effect {:?}", other),
        }
        assert_eq!(state.input.media_type(), Some(MediaCategory::Image));
        assert_eq!(state.input.preview, Some(new_preview));
        assert_eq!(state.input.media.as_ref().unwrap().name(), "view.png");
    }

    #[test]
    fn test_clearing_media_releases_preview() {
        let handle = preview();
        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::MediaSelected {
                    attachment: image("view.png"),
                    preview: handle.clone(),
                },
                CaptureEvent::MediaCleared,
            ],
        );

        assert!(matches!(&effects[..], [Effect::ReleasePreview(h)] if h == &handle));
        assert!(state.input.media.is_none());
        assert!(state.input.preview.is_none());
        assert_eq!(state.input.media_type(), None);
    }

    #[test]
    fn test_only_final_fragments_are_committed_in_order() {
        let (state, _) = apply(
            CaptureState {
                input: MoodInput {
                    text: "feeling".to_string(),
                    ..MoodInput::default()
                },
                ..CaptureState::default()
            },
            vec![
                CaptureEvent::ListeningStarted,
                CaptureEvent::Transcript(TranscriptFragment::interim("slee")),
                CaptureEvent::Transcript(TranscriptFragment::finalized("sleepy")),
                CaptureEvent::Transcript(TranscriptFragment::interim("and war")),
                CaptureEvent::Transcript(TranscriptFragment::finalized("and warm")),
                CaptureEvent::Transcript(TranscriptFragment::interim("but")),
            ],
        );

        assert_eq!(state.input.text, "feeling sleepy and warm");
        assert_eq!(state.interim.as_deref(), Some("but"));

        let (state, _) = reduce(state, CaptureEvent::ListeningStopped);
        assert_eq!(state.input.text, "feeling sleepy and warm");
        assert_eq!(state.interim, None);
        assert_eq!(state.status(), CaptureStatus::Idle);
    }

    #[test]
    fn test_first_final_fragment_has_no_leading_space() {
        let (state, _) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::ListeningStarted,
                CaptureEvent::Transcript(TranscriptFragment::finalized("hello")),
            ],
        );
        assert_eq!(state.input.text, "hello");
    }

    #[test]
    fn test_failure_preserves_input_and_clears_submitting() {
        let (state, _) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("rainy".to_string()),
                CaptureEvent::SubmitRequested,
                CaptureEvent::SubmissionFinished(RequestOutcome::Failure {
                    reason: FailureReason::MalformedResponse,
                    message: "Malformed response: not json".to_string(),
                }),
            ],
        );

        assert!(!state.submitting);
        assert!(state.result.is_none());
        assert_eq!(state.error.as_deref(), Some("Malformed response: not json"));
        assert_eq!(state.input.text, "rainy");
        assert_eq!(state.status(), CaptureStatus::IdleWithError);
    }

    #[test]
    fn test_new_submission_clears_previous_result() {
        let response = crate::ai::MockRecommendationClient::sample_response("x", 2);
        let (state, _) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("x".to_string()),
                CaptureEvent::SubmitRequested,
                CaptureEvent::SubmissionFinished(RequestOutcome::Success(response)),
            ],
        );
        assert_eq!(state.status(), CaptureStatus::IdleWithResult);

        let (state, _) = reduce(state, CaptureEvent::SubmitRequested);
        assert!(state.result.is_none());
        assert!(state.submitting);
    }

    #[test]
    fn test_edits_ignored_while_submitting() {
        let (state, effects) = apply(
            CaptureState::default(),
            vec![
                CaptureEvent::TextEdited("first".to_string()),
                CaptureEvent::SubmitRequested,
                CaptureEvent::TextEdited("second".to_string()),
                CaptureEvent::MediaSelected {
                    attachment: image("late.png"),
                    preview: preview(),
                },
            ],
        );

        assert_eq!(state.input.text, "first");
        assert!(state.input.media.is_none());
        assert!(matches!(effects.last(), Some(Effect::ReleasePreview(_))));
    }

    #[test]
    fn test_listening_failure_sets_error() {
        let (state, _) = reduce(
            CaptureState::default(),
            CaptureEvent::ListeningFailed("Voice input unavailable".to_string()),
        );
        assert!(!state.listening);
        assert_eq!(state.status(), CaptureStatus::IdleWithError);
    }
}
