//! Canonical outbound message handed to a channel handler for delivery.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Media attachment as `<media type>:<url>`, e.g. `image/jpeg:https://example.com/a.jpg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Attachment {
    pub media_type: String,
    pub url: String,
}

impl Attachment {
    pub fn new(media_type: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            url: url.into(),
        }
    }

    /// Split on the first `:`. A value without one is a bare URL with no media type.
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(':') {
            Some((media_type, url)) => Self::new(media_type, url),
            None => Self::new("", raw),
        }
    }

    /// Top-level media type, e.g. `image` for `image/jpeg`.
    pub fn media_category(&self) -> &str {
        self.media_type.split('/').next().unwrap_or_default()
    }
}

impl From<String> for Attachment {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Attachment> for String {
    fn from(a: Attachment) -> Self {
        a.to_string()
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.media_type, self.url)
    }
}

/// Message to deliver to a contact. Read-only from the handler's point of view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboundMsg {
    #[serde(default = "Uuid::new_v4")]
    pub uuid: Uuid,
    pub channel_uuid: String,
    /// Destination address on the provider (Telegram user/chat id).
    pub to: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub quick_replies: Vec<String>,
}

impl OutboundMsg {
    pub fn new(channel_uuid: impl Into<String>, to: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            channel_uuid: channel_uuid.into(),
            to: to.into(),
            text: text.into(),
            attachments: Vec::new(),
            quick_replies: Vec::new(),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn with_quick_replies<I, S>(mut self, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.quick_replies = replies.into_iter().map(Into::into).collect();
        self
    }
}
