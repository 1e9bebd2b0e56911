//! Webhook update → canonical event.

use chrono::{DateTime, Utc};

use crate::channels::channel::Channel;
use crate::channels::error::{ChannelError, Result};
use crate::channels::inbound::{
    name_from_first_last_username, CanonicalEvent, ChannelEvent, ChannelEventType, IncomingMsg, Urn,
};

use super::files::FileResolver;
use super::payload::{MessageContent, TelegramFile, TelegramLocation, TelegramUpdate};

/// Command that opens a conversation instead of being delivered as a message.
pub const START_COMMAND: &str = "/start";

/// Largest photo variant we fetch, in bytes.
pub const MAX_PHOTO_BYTES: u64 = 100_000;

/// Normalizes updates, resolving media handles through the file resolver.
#[derive(Clone)]
pub struct Normalizer {
    files: FileResolver,
}

impl Normalizer {
    pub fn new(files: FileResolver) -> Self {
        Self { files }
    }

    /// Fails with `IgnoredNoMessage` when the update carries no message, and with
    /// `MediaResolution` when a media handle cannot be resolved. Never returns a partial event.
    pub async fn normalize(&self, channel: &Channel, update: &TelegramUpdate) -> Result<CanonicalEvent> {
        let msg = match &update.message {
            Some(m) if m.message_id != 0 => m,
            _ => return Err(ChannelError::IgnoredNoMessage),
        };

        let date: DateTime<Utc> = DateTime::from_timestamp(msg.date, 0)
            .ok_or_else(|| ChannelError::validation(format!("invalid message date: {}", msg.date)))?;
        let urn = Urn::telegram(msg.from.id, &msg.from.username);
        let name = name_from_first_last_username(
            &msg.from.first_name,
            &msg.from.last_name,
            &msg.from.username,
        );

        if msg.text == START_COMMAND {
            log::debug!("telegram update {}: new conversation from {}", update.update_id, urn);
            let event = ChannelEvent::new(channel, ChannelEventType::NewConversation, urn)
                .with_contact_name(name)
                .with_occurred_on(date);
            return Ok(CanonicalEvent::ConversationStarted(event));
        }

        let mut text = if msg.text.is_empty() {
            msg.caption.clone()
        } else {
            msg.text.clone()
        };

        let mut media_url = None;
        if let Some(content) = msg.content() {
            log::debug!("telegram update {}: {} message", update.update_id, content.kind());
            match content {
                MessageContent::Photo(photos) => {
                    if let Some(photo) = select_photo(photos) {
                        media_url = Some(self.resolve(channel, &photo.file_id).await?);
                    }
                }
                MessageContent::Video(f)
                | MessageContent::Voice(f)
                | MessageContent::Sticker(f)
                | MessageContent::Document(f) => {
                    media_url = Some(self.resolve(channel, &f.file_id).await?);
                }
                MessageContent::Venue { venue, location } => {
                    text = join_non_empty(", ", &[venue.title.as_str(), venue.address.as_str()]);
                    media_url = location.map(geo_url);
                }
                MessageContent::Location(loc) => {
                    text = format!("{:.6},{:.6}", loc.latitude, loc.longitude);
                    media_url = Some(geo_url(loc));
                }
                MessageContent::Contact(contact) => {
                    let phone = if contact.phone_number.is_empty() {
                        String::new()
                    } else {
                        format!("({})", contact.phone_number)
                    };
                    text = join_non_empty(
                        " ",
                        &[contact.first_name.as_str(), contact.last_name.as_str(), phone.as_str()],
                    );
                }
            }
        }

        let mut incoming = IncomingMsg::new(channel, urn, text)
            .with_received_on(date)
            .with_external_id(msg.message_id.to_string())
            .with_contact_name(name);
        if let Some(url) = media_url {
            incoming = incoming.with_attachment(url);
        }
        Ok(CanonicalEvent::IncomingMessage(incoming))
    }

    async fn resolve(&self, channel: &Channel, file_id: &str) -> Result<String> {
        self.files
            .resolve_file_id(channel, file_id)
            .await
            .map_err(|e| {
                log::warn!("telegram media resolution failed for file {}: {}", file_id, e);
                ChannelError::media_resolution(e)
            })
    }
}

/// Largest variant no bigger than [`MAX_PHOTO_BYTES`], else the smallest.
/// Variants are ordered by size first, so providers sending them unsorted get the same choice.
pub fn select_photo(photos: &[TelegramFile]) -> Option<&TelegramFile> {
    let mut by_size: Vec<&TelegramFile> = photos.iter().collect();
    by_size.sort_by_key(|p| p.file_size);
    let smallest = *by_size.first()?;
    Some(
        by_size
            .into_iter()
            .take_while(|p| p.file_size <= MAX_PHOTO_BYTES)
            .last()
            .unwrap_or(smallest),
    )
}

pub fn geo_url(loc: TelegramLocation) -> String {
    format!("geo:{:.6},{:.6}", loc.latitude, loc.longitude)
}

fn join_non_empty(sep: &str, parts: &[&str]) -> String {
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join(sep)
}
