//! Mood capture surface
//!
//! Holds everything the user has entered (text, live transcription, an
//! attached image or video) and gates submission to the recommendation
//! service.

pub mod preview;
pub mod speech;
pub mod state;
pub mod surface;

pub use preview::{ObjectUrlStore, PreviewHandle, PreviewStore};
pub use speech::{ScriptedRecognizer, SpeechRecognizer, TranscriptFragment, UnavailableRecognizer};
pub use state::{reduce, CaptureEvent, CaptureState, CaptureStatus, Effect, MoodInput};
pub use surface::MoodCapture;
