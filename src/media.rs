//! User-selected media attachments and their transport encoding
//!
//! An attachment is a handle to bytes (a file on disk or an in-memory
//! buffer) plus its declared mime type. Encoding reads the bytes and
//! produces the base64 inline part sent to the model.

use crate::ai::mime::{detect_media_mime, mime_from_extension, MediaCategory};
use crate::{Error, Result};
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncReadExt;

/// Largest attachment accepted for submission (20 MiB).
pub const MAX_MEDIA_BYTES: u64 = 20 * 1024 * 1024;

const SNIFF_LEN: u64 = 16;

#[derive(Debug, Clone)]
pub enum MediaSource {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

#[derive(Debug, Clone)]
pub struct MediaAttachment {
    name: String,
    mime_type: String,
    category: MediaCategory,
    size: u64,
    source: MediaSource,
}

/// Base64 payload plus the original mime type, built fresh per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMediaPart {
    pub data: String,
    pub mime_type: String,
}

impl EncodedMediaPart {
    pub fn decode(&self) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.data)
            .map_err(|e| Error::MediaRead(format!("Invalid base64 payload: {}", e)))
    }
}

impl MediaAttachment {
    /// Wrap an in-memory buffer with a declared mime type.
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Result<Self> {
        let name = name.into();
        let mime_type = mime_type.into();
        let bytes: Arc<[u8]> = bytes.into();
        let category = Self::category_for(&name, &mime_type)?;

        Ok(Self {
            name,
            mime_type,
            category,
            size: bytes.len() as u64,
            source: MediaSource::Memory(bytes),
        })
    }

    /// Attach a file on disk. The mime type comes from the extension, or from
    /// the leading bytes when the extension is unknown.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            Error::MediaRead(format!("{}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(Error::MediaRead(format!(
                "{} is not a regular file",
                path.display()
            )));
        }

        let mime_type = match mime_from_extension(path) {
            Some(mime) => mime,
            None => {
                let head = read_head(path).await?;
                detect_media_mime(&head).ok_or_else(|| {
                    Error::UnsupportedMedia(format!(
                        "{} is not a recognised image or video",
                        path.display()
                    ))
                })?
            }
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let category = Self::category_for(&name, mime_type)?;

        tracing::debug!(
            "Attached {} ({}, {} bytes)",
            name,
            mime_type,
            metadata.len()
        );

        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            category,
            size: metadata.len(),
            source: MediaSource::File(path.to_path_buf()),
        })
    }

    fn category_for(name: &str, mime_type: &str) -> Result<MediaCategory> {
        MediaCategory::from_mime(mime_type).ok_or_else(|| {
            Error::UnsupportedMedia(format!(
                "{} has type '{}'; only images and videos are supported",
                name, mime_type
            ))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn category(&self) -> MediaCategory {
        self.category
    }

    /// Size in bytes as known when the attachment was selected.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn source(&self) -> &MediaSource {
        &self.source
    }

    pub fn exceeds_limit(&self) -> bool {
        self.size > MAX_MEDIA_BYTES
    }

    /// Read the attachment and encode it for an inline-data request part.
    ///
    /// The size limit is applied again to what is actually read, since a
    /// file can change on disk after it was attached.
    pub async fn encode(&self) -> Result<EncodedMediaPart> {
        let data = match &self.source {
            MediaSource::File(path) => {
                let read_error = |e: std::io::Error| {
                    tracing::error!("Failed to read media {}: {}", path.display(), e);
                    Error::MediaRead(format!("{}: {}", self.name, e))
                };

                let current = tokio::fs::metadata(path).await.map_err(read_error)?;
                ensure_within_limit(current.len())?;

                let bytes = tokio::fs::read(path).await.map_err(read_error)?;
                ensure_within_limit(bytes.len() as u64)?;
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
            MediaSource::Memory(bytes) => {
                ensure_within_limit(bytes.len() as u64)?;
                base64::engine::general_purpose::STANDARD.encode(bytes)
            }
        };

        Ok(EncodedMediaPart {
            data,
            mime_type: self.mime_type.clone(),
        })
    }
}

fn ensure_within_limit(size: u64) -> Result<()> {
    if size > MAX_MEDIA_BYTES {
        return Err(Error::OversizedMedia {
            size,
            limit: MAX_MEDIA_BYTES,
        });
    }
    Ok(())
}

async fn read_head(path: &Path) -> Result<Vec<u8>> {
    let file = tokio::fs::File::open(path)
        .await
        .map_err(|e| Error::MediaRead(format!("{}: {}", path.display(), e)))?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN)
        .read_to_end(&mut head)
        .await
        .map_err(|e| Error::MediaRead(format!("{}: {}", path.display(), e)))?;
    Ok(head)
}
