use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::contracts::error::TransportError;

/// Chat transport that applies a caption to an existing media message.
///
/// # Behavior
/// - `edit_caption` rewrites the caption of the message in place
/// - `resend_media` posts the same media (same `file_id`, same kind) as a new
///   message carrying `caption`; the media payload itself is never altered
/// - Timeouts and retries are the implementation's concern
pub trait CaptionTransport: Send + Sync {
    /// Edits the caption of `message` in place.
    fn edit_caption(
        &self,
        message: &MediaMessage,
        caption: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Re-sends the media of `message` as a new message with `caption`.
    fn resend_media(
        &self,
        message: &MediaMessage,
        caption: &str,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;
}

/// An inbound media message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub kind: MediaKind,
    /// Transport-side handle of the media payload, reused on resend.
    pub file_id: String,
    pub caption: Option<String>,
}

/// Kind of media attached to a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Audio,
    Photo,
    Animation,
    Document {
        #[serde(default)]
        mime_type: Option<String>,
    },
    Other,
}

impl MediaKind {
    /// Builds a kind from a loose label such as `"video"` or `"document"`.
    /// Unknown labels map to `Other`.
    pub fn from_parts(label: &str, mime_type: Option<String>) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "video" => MediaKind::Video,
            "audio" => MediaKind::Audio,
            "photo" => MediaKind::Photo,
            "animation" => MediaKind::Animation,
            "document" => MediaKind::Document { mime_type },
            _ => MediaKind::Other,
        }
    }

    /// Stable label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Photo => "photo",
            MediaKind::Animation => "animation",
            MediaKind::Document { .. } => "document",
            MediaKind::Other => "other",
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        match self {
            MediaKind::Document { mime_type } => mime_type.as_deref(),
            _ => None,
        }
    }
}
