//! Gateway HTTP acknowledgment bodies.
//!
//! Every webhook gets `{ "message": <summary>, "data": [ ... ] }`, where each
//! data item is tagged by `type`: `msg`, `event`, `info`, or `error`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::channels::{CanonicalEvent, ChannelEvent, ChannelEventType, IncomingMsg};

#[derive(Debug, Clone, Serialize)]
pub struct Ack {
    pub message: String,
    pub data: Vec<AckData>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AckData {
    Msg {
        channel_uuid: String,
        msg_uuid: Uuid,
        text: String,
        urn: String,
        attachments: Vec<String>,
        external_id: Option<String>,
        received_on: DateTime<Utc>,
    },
    Event {
        channel_uuid: String,
        event_type: ChannelEventType,
        urn: String,
        received_on: DateTime<Utc>,
    },
    Info {
        info: String,
    },
    Error {
        error: String,
    },
}

impl From<&IncomingMsg> for AckData {
    fn from(msg: &IncomingMsg) -> Self {
        Self::Msg {
            channel_uuid: msg.channel_uuid.clone(),
            msg_uuid: msg.uuid,
            text: msg.text.clone(),
            urn: msg.urn.to_string(),
            attachments: msg.attachments.clone(),
            external_id: msg.external_id.clone(),
            received_on: msg.received_on,
        }
    }
}

impl From<&ChannelEvent> for AckData {
    fn from(event: &ChannelEvent) -> Self {
        Self::Event {
            channel_uuid: event.channel_uuid.clone(),
            event_type: event.event_type,
            urn: event.urn.to_string(),
            received_on: event.occurred_on,
        }
    }
}

impl Ack {
    pub fn accepted(event: &CanonicalEvent) -> Self {
        match event {
            CanonicalEvent::IncomingMessage(msg) => Self {
                message: "Message Accepted".to_string(),
                data: vec![msg.into()],
            },
            CanonicalEvent::ConversationStarted(ev) => Self {
                message: "Event Accepted".to_string(),
                data: vec![ev.into()],
            },
        }
    }

    pub fn ignored(info: impl Into<String>) -> Self {
        Self {
            message: "Ignored".to_string(),
            data: vec![AckData::Info { info: info.into() }],
        }
    }

    pub fn error(error: impl std::fmt::Display) -> Self {
        Self {
            message: "Error".to_string(),
            data: vec![AckData::Error {
                error: error.to_string(),
            }],
        }
    }
}
