//! Attachment helpers
//!
//! Naming and classification of files sent as `file` messages. The file
//! itself lives in object storage; the message only carries its public URL.

/// Bucket used for chat attachments unless configured otherwise
pub const DEFAULT_ATTACHMENTS_BUCKET: &str = "chat-files";

const DISPLAY_NAME_MAX: usize = 20;
const DISPLAY_NAME_KEEP: usize = 17;
const FALLBACK_DISPLAY_NAME: &str = "File attachment";

/// Coarse kind of an attachment, derived from its file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Image,
    Pdf,
    Document,
    Audio,
    Video,
    Generic,
}

impl AttachmentKind {
    /// Classify an attachment URL or file name by extension (case-insensitive)
    pub fn from_url(url: &str) -> Self {
        let path = url.split(['?', '#']).next().unwrap_or(url).to_lowercase();
        let extension = match path.rsplit_once('.') {
            Some((_, ext)) if !ext.contains('/') => ext,
            _ => return AttachmentKind::Generic,
        };

        match extension {
            "jpg" | "jpeg" | "png" | "gif" => AttachmentKind::Image,
            "pdf" => AttachmentKind::Pdf,
            "doc" | "docx" | "txt" => AttachmentKind::Document,
            "mp3" | "wav" | "ogg" => AttachmentKind::Audio,
            "mp4" | "3gp" | "avi" => AttachmentKind::Video,
            _ => AttachmentKind::Generic,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Image => "image",
            AttachmentKind::Pdf => "pdf",
            AttachmentKind::Document => "document",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Video => "video",
            AttachmentKind::Generic => "generic",
        }
    }
}

/// Storage object name for an uploaded file: `file_<millis>_<original>`
///
/// Path separators in the original name are replaced so the object never
/// lands in a nested folder by accident.
pub fn attachment_file_name(original: &str, now_millis: i64) -> String {
    let sanitized: String = original
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let name = if sanitized.is_empty() { "attachment" } else { sanitized.as_str() };
    format!("file_{}_{}", now_millis, name)
}

/// Short label for an attachment URL
///
/// Uses the last path segment, truncated to 17 characters plus `...` when it
/// is longer than 20 characters.
pub fn attachment_display_name(url: &str) -> String {
    let path = match reqwest::Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => return FALLBACK_DISPLAY_NAME.to_string(),
    };

    let segment = match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment,
        _ => return FALLBACK_DISPLAY_NAME.to_string(),
    };

    if segment.chars().count() > DISPLAY_NAME_MAX {
        let mut short: String = segment.chars().take(DISPLAY_NAME_KEEP).collect();
        short.push_str("...");
        short
    } else {
        segment.to_string()
    }
}
