//! Speech-to-text capability
//!
//! Recognition engines are external. The capture surface only needs to start
//! a one-shot session, receive its fragments, and stop it.

use crate::{Error, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// A piece of transcribed speech. Interim fragments may still change and are
/// for display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFragment {
    pub text: String,
    pub is_final: bool,
}

impl TranscriptFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// One session per `start`. The channel closes when the engine ends the
/// session on its own; `stop` ends it early.
pub trait SpeechRecognizer: Send {
    fn start(&mut self) -> Result<UnboundedReceiver<TranscriptFragment>>;
    fn stop(&mut self);
}

/// Recognizer for hosts without a speech engine.
#[derive(Debug, Default)]
pub struct UnavailableRecognizer;

impl SpeechRecognizer for UnavailableRecognizer {
    fn start(&mut self) -> Result<UnboundedReceiver<TranscriptFragment>> {
        Err(Error::TranscriptionUnavailable(
            "no speech recognition engine is available on this system".to_string(),
        ))
    }

    fn stop(&mut self) {}
}

/// Replays a fixed list of fragments for every session.
#[derive(Clone)]
pub struct ScriptedRecognizer {
    script: Vec<TranscriptFragment>,
    hold_open: bool,
    sender: Option<UnboundedSender<TranscriptFragment>>,
    starts: Arc<AtomicUsize>,
    stops: Arc<AtomicUsize>,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<TranscriptFragment>) -> Self {
        Self {
            script,
            hold_open: false,
            sender: None,
            starts: Arc::new(AtomicUsize::new(0)),
            stops: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Keep the session open after the script until `stop` is called.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    pub fn start_count(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.load(Ordering::SeqCst)
    }
}

impl SpeechRecognizer for ScriptedRecognizer {
    fn start(&mut self) -> Result<UnboundedReceiver<TranscriptFragment>> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        for fragment in &self.script {
            // Receiver is alive: it is returned below.
            let _ = tx.send(fragment.clone());
        }
        if self.hold_open {
            self.sender = Some(tx);
        }
        Ok(rx)
    }

    fn stop(&mut self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
        self.sender = None;
    }
}
