use crate::media::MediaAttachment;
use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Transient display reference for an attachment, valid until revoked.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewHandle(String);

impl PreviewHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues and revokes preview handles. Every created handle must be revoked
/// exactly once.
pub trait PreviewStore: Send + Sync {
    fn create(&self, attachment: &MediaAttachment) -> PreviewHandle;
    fn revoke(&self, handle: &PreviewHandle);
}

/// In-process registry of `blob:` style preview URLs.
#[derive(Clone, Default)]
pub struct ObjectUrlStore {
    live: Arc<Mutex<HashSet<PreviewHandle>>>,
}

impl ObjectUrlStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap().len()
    }

    pub fn is_live(&self, handle: &PreviewHandle) -> bool {
        self.live.lock().unwrap().contains(handle)
    }
}

impl PreviewStore for ObjectUrlStore {
    fn create(&self, attachment: &MediaAttachment) -> PreviewHandle {
        let handle = PreviewHandle(format!("blob:moodmatch/{}", Uuid::new_v4()));
        tracing::debug!("Created preview {} for {}", handle, attachment.name());
        self.live.lock().unwrap().insert(handle.clone());
        handle
    }

    fn revoke(&self, handle: &PreviewHandle) {
        if self.live.lock().unwrap().remove(handle) {
            tracing::debug!("Revoked preview {}", handle);
        } else {
            tracing::warn!("Preview {} was already revoked", handle);
        }
    }
}
