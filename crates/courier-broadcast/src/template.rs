// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Phone normalization and message templating for outbound sends.

use tracing::warn;

use courier_core::types::{MediaKind, SendPayload};

/// Name substituted when a contact has no stored name.
const NAME_FALLBACK: &str = "Friend";

/// Strips non-digits; a bare 10-digit number gets the default country code.
pub fn normalize_phone(raw: &str, default_country_code: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() == 10 {
        format!("{default_country_code}{digits}")
    } else {
        digits
    }
}

/// Substitutes `{{name}}` with the contact's name or the generic fallback.
pub fn render_name(template: &str, name: Option<&str>) -> String {
    template.replace("{{name}}", name.unwrap_or(NAME_FALLBACK))
}

/// Media kind from a URL's file extension; image is the default.
pub fn infer_media_kind(url: &str) -> MediaKind {
    if url.ends_with(".mp4") {
        MediaKind::Video
    } else if url.ends_with(".pdf") {
        MediaKind::Document
    } else {
        MediaKind::Image
    }
}

/// A campaign message template, built once per campaign and rendered per
/// recipient.
#[derive(Debug, Clone)]
pub struct MessageTemplate {
    text: String,
    media: Option<(MediaKind, String)>,
}

impl MessageTemplate {
    /// Builds the template, validating the media URL.
    ///
    /// An invalid URL (not http/https) degrades silently to text-only.
    pub fn build(message: &str, media_url: Option<&str>) -> Self {
        let media = media_url.and_then(|url| {
            if url.starts_with("http://") || url.starts_with("https://") {
                Some((infer_media_kind(url), url.to_string()))
            } else {
                warn!(url, "invalid media URL, sending text-only");
                None
            }
        });
        Self {
            text: message.to_string(),
            media,
        }
    }

    /// Renders the payload for one recipient.
    pub fn render(&self, contact_name: Option<&str>) -> SendPayload {
        let text = render_name(&self.text, contact_name);
        match &self.media {
            Some((kind, url)) => SendPayload::Media {
                kind: *kind,
                url: url.clone(),
                caption: Some(text),
                file_name: (*kind == MediaKind::Document).then(|| "File.pdf".to_string()),
                mime_type: (*kind == MediaKind::Document)
                    .then(|| "application/pdf".to_string()),
            },
            None => SendPayload::Text { body: text },
        }
    }
}
