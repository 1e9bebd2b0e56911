//! Canonical inbound events produced by channel handlers and handed to the backend.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::channel::Channel;

/// Contact identity on a provider, e.g. `telegram:3527065#nicpottier`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Urn {
    scheme: String,
    path: String,
    display: Option<String>,
}

impl Urn {
    pub const TELEGRAM_SCHEME: &'static str = "telegram";

    /// Telegram URN from a user id, with the username (if any) as display fragment.
    pub fn telegram(user_id: i64, username: &str) -> Self {
        let username = username.trim();
        Self {
            scheme: Self::TELEGRAM_SCHEME.to_string(),
            path: user_id.to_string(),
            display: (!username.is_empty()).then(|| username.to_string()),
        }
    }

    /// Provider-side address (for Telegram, the user id), used as the send destination.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path)?;
        if let Some(d) = &self.display {
            write!(f, "#{}", d)?;
        }
        Ok(())
    }
}

impl Serialize for Urn {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Kinds of channel events (non-message occurrences).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelEventType {
    NewConversation,
}

/// A non-message event, e.g. a contact starting a conversation.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelEvent {
    pub uuid: Uuid,
    pub channel_uuid: String,
    pub event_type: ChannelEventType,
    pub urn: Urn,
    pub contact_name: String,
    pub occurred_on: DateTime<Utc>,
}

impl ChannelEvent {
    pub fn new(channel: &Channel, event_type: ChannelEventType, urn: Urn) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            channel_uuid: channel.uuid.clone(),
            event_type,
            urn,
            contact_name: String::new(),
            occurred_on: Utc::now(),
        }
    }

    pub fn with_contact_name(mut self, name: impl Into<String>) -> Self {
        self.contact_name = name.into();
        self
    }

    pub fn with_occurred_on(mut self, at: DateTime<Utc>) -> Self {
        self.occurred_on = at;
        self
    }
}

/// A message received from a contact: text and at most one attachment URL.
#[derive(Debug, Clone, Serialize)]
pub struct IncomingMsg {
    pub uuid: Uuid,
    pub channel_uuid: String,
    pub urn: Urn,
    pub text: String,
    pub attachments: Vec<String>,
    /// Provider-assigned message id.
    pub external_id: Option<String>,
    pub contact_name: String,
    pub received_on: DateTime<Utc>,
}

impl IncomingMsg {
    pub fn new(channel: &Channel, urn: Urn, text: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            channel_uuid: channel.uuid.clone(),
            urn,
            text: text.into(),
            attachments: Vec::new(),
            external_id: None,
            contact_name: String::new(),
            received_on: Utc::now(),
        }
    }

    pub fn with_received_on(mut self, at: DateTime<Utc>) -> Self {
        self.received_on = at;
        self
    }

    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = Some(id.into());
        self
    }

    pub fn with_contact_name(mut self, name: impl Into<String>) -> Self {
        self.contact_name = name.into();
        self
    }

    pub fn with_attachment(mut self, url: impl Into<String>) -> Self {
        self.attachments.push(url.into());
        self
    }
}

/// Result of normalizing one webhook call.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CanonicalEvent {
    ConversationStarted(ChannelEvent),
    IncomingMessage(IncomingMsg),
}

impl CanonicalEvent {
    pub fn urn(&self) -> &Urn {
        match self {
            Self::ConversationStarted(e) => &e.urn,
            Self::IncomingMessage(m) => &m.urn,
        }
    }
}

/// Display name from sender fields: "first last", else whichever of first/last
/// is present, else the username, else empty.
pub fn name_from_first_last_username(first: &str, last: &str, username: &str) -> String {
    let (first, last, username) = (first.trim(), last.trim(), username.trim());
    match (first.is_empty(), last.is_empty()) {
        (false, false) => format!("{} {}", first, last),
        (false, true) => first.to_string(),
        (true, false) => last.to_string(),
        (true, true) => username.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Nic", "Pottier", "nicpottier", "Nic Pottier")]
    #[case("Nic", "", "nicpottier", "Nic")]
    #[case("", "Pottier", "nicpottier", "Pottier")]
    #[case("", "", "nicpottier", "nicpottier")]
    #[case("", "", "", "")]
    fn display_name_precedence(
        #[case] first: &str,
        #[case] last: &str,
        #[case] username: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(name_from_first_last_username(first, last, username), expected);
    }

    #[test]
    fn telegram_urn_formats() {
        let urn = Urn::telegram(3527065, "nicpottier");
        assert_eq!(urn.to_string(), "telegram:3527065#nicpottier");
        assert_eq!(urn.path(), "3527065");
        assert_eq!(Urn::telegram(12, "").to_string(), "telegram:12");
    }

    #[test]
    fn canonical_event_exposes_sender_urn() {
        let channel: Channel =
            serde_json::from_value(serde_json::json!({ "uuid": "abc", "channelType": "TG" })).unwrap();
        let msg = IncomingMsg::new(&channel, Urn::telegram(7, "bob"), "hi");
        assert_eq!(CanonicalEvent::IncomingMessage(msg).urn().to_string(), "telegram:7#bob");
    }
}
