use std::path::Path;

/// Coarse media kind derived from a mime-type prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Video,
}

impl MediaCategory {
    /// `image/*` and `video/*` only; anything else is not an attachable mood.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let lower = mime_type.trim().to_ascii_lowercase();
        if lower.starts_with("image/") {
            Some(MediaCategory::Image)
        } else if lower.starts_with("video/") {
            Some(MediaCategory::Video)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaCategory::Image => "image",
            MediaCategory::Video => "video",
        }
    }
}

pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "mp4" | "m4v" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        _ => return None,
    };
    Some(mime)
}

/// Sniff a mime type from leading bytes. Returns `None` when unrecognized.
pub fn detect_media_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x41, 0x56, 0x49, 0x20, ..] => Some("video/x-msvideo"),
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("video/webm"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, b'q', b't', ..] => Some("video/quicktime"),
        [_, _, _, _, 0x66, 0x74, 0x79, 0x70, ..] => Some("video/mp4"),
        _ => {
            tracing::warn!(
                "Unrecognized media format (first 4 bytes: {:02X?})",
                &bytes[..bytes.len().min(4)]
            );
            None
        }
    }
}
