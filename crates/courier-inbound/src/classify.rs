// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound event classification.
//!
//! Maps a transport payload onto a text body plus an optional media
//! descriptor with a synthetic filename and mime type per kind.

use courier_core::types::{EventPayload, MediaKind};

/// Media metadata derived from a classified event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaDescriptor {
    pub kind: MediaKind,
    pub file_name: String,
    pub mime_type: String,
}

/// Result of classifying an inbound payload.
#[derive(Debug, Clone)]
pub struct Classified {
    /// Body text, caption, or filename fallback. Empty when none apply.
    pub text: String,
    pub media: Option<MediaDescriptor>,
    /// Reactions are acknowledged but never persisted to the inbox.
    pub is_reaction: bool,
}

/// Classifies a payload. `now_millis` feeds the synthetic filenames.
pub fn classify(payload: &EventPayload, now_millis: i64) -> Classified {
    match payload {
        EventPayload::Text { body } => Classified {
            text: body.clone(),
            media: None,
            is_reaction: false,
        },
        EventPayload::Image { caption } => Classified {
            text: caption.clone().unwrap_or_default(),
            media: Some(MediaDescriptor {
                kind: MediaKind::Image,
                file_name: format!("img_{now_millis}.jpg"),
                mime_type: "image/jpeg".to_string(),
            }),
            is_reaction: false,
        },
        EventPayload::Video { caption } => Classified {
            text: caption.clone().unwrap_or_default(),
            media: Some(MediaDescriptor {
                kind: MediaKind::Video,
                file_name: format!("vid_{now_millis}.mp4"),
                mime_type: "video/mp4".to_string(),
            }),
            is_reaction: false,
        },
        EventPayload::Document {
            caption,
            file_name,
            mime_type,
        } => {
            let name = file_name
                .clone()
                .unwrap_or_else(|| format!("document_{now_millis}"));
            Classified {
                text: caption
                    .clone()
                    .or_else(|| file_name.clone())
                    .unwrap_or_else(|| "Document".to_string()),
                media: Some(MediaDescriptor {
                    kind: MediaKind::Document,
                    file_name: name,
                    mime_type: mime_type
                        .clone()
                        .unwrap_or_else(|| "application/octet-stream".to_string()),
                }),
                is_reaction: false,
            }
        }
        EventPayload::Reaction { emoji, .. } => Classified {
            text: emoji.clone(),
            media: None,
            is_reaction: true,
        },
    }
}
