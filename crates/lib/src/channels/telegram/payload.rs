//! Telegram webhook payload schema.
//!
//! ```json
//! {
//!   "update_id": 174114370,
//!   "message": {
//!     "message_id": 41,
//!     "from": { "id": 3527065, "first_name": "Nic", "last_name": "Pottier", "username": "nicpottier" },
//!     "chat": { "id": 3527065, "type": "private" },
//!     "date": 1454119029,
//!     "text": "Hello World"
//!   }
//! }
//! ```

use serde::Deserialize;

use crate::channels::decode::{require_non_empty, Validate};
use crate::channels::error::{ChannelError, Result};

/// Webhook POST body. Only `message` updates are handled; other update kinds are ignored.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub message_id: i64,
    #[serde(default)]
    pub from: TelegramUser,
    /// Unix seconds.
    #[serde(default)]
    pub date: i64,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub caption: String,
    /// Size variants of one photo, smallest first.
    #[serde(default)]
    pub photo: Vec<TelegramFile>,
    #[serde(default)]
    pub video: Option<TelegramFile>,
    #[serde(default)]
    pub voice: Option<TelegramFile>,
    #[serde(default)]
    pub sticker: Option<TelegramSticker>,
    #[serde(default)]
    pub document: Option<TelegramFile>,
    #[serde(default)]
    pub venue: Option<TelegramVenue>,
    #[serde(default)]
    pub location: Option<TelegramLocation>,
    #[serde(default)]
    pub contact: Option<TelegramContact>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TelegramUser {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub username: String,
}

/// Opaque file handle; resolve with `getFile` to obtain a URL.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramFile {
    pub file_id: String,
    #[serde(default)]
    pub file_size: u64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramSticker {
    #[serde(default)]
    pub thumbnail: Option<TelegramFile>,
    /// Name used before Bot API 6.6; some servers still send both.
    #[serde(default)]
    pub thumb: Option<TelegramFile>,
}

impl TelegramSticker {
    pub fn thumbnail(&self) -> Option<&TelegramFile> {
        self.thumbnail.as_ref().or(self.thumb.as_ref())
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TelegramLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramVenue {
    #[serde(default)]
    pub location: Option<TelegramLocation>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct TelegramContact {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// The single content variant a message carries, picked in priority order
/// photo > video > voice > sticker > document > venue > location > contact.
#[derive(Debug, Clone, Copy)]
pub enum MessageContent<'a> {
    Photo(&'a [TelegramFile]),
    Video(&'a TelegramFile),
    Voice(&'a TelegramFile),
    Sticker(&'a TelegramFile),
    Document(&'a TelegramFile),
    /// Telegram sends a venue's coordinates both inside the venue and on the message.
    Venue {
        venue: &'a TelegramVenue,
        location: Option<TelegramLocation>,
    },
    Location(TelegramLocation),
    Contact(&'a TelegramContact),
}

impl MessageContent<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Photo(_) => "photo",
            Self::Video(_) => "video",
            Self::Voice(_) => "voice",
            Self::Sticker(_) => "sticker",
            Self::Document(_) => "document",
            Self::Venue { .. } => "venue",
            Self::Location(_) => "location",
            Self::Contact(_) => "contact",
        }
    }
}

impl TelegramMessage {
    /// Content variant of this message, or `None` for plain text (or nothing).
    pub fn content(&self) -> Option<MessageContent<'_>> {
        if !self.photo.is_empty() {
            return Some(MessageContent::Photo(&self.photo));
        }
        if let Some(f) = &self.video {
            return Some(MessageContent::Video(f));
        }
        if let Some(f) = &self.voice {
            return Some(MessageContent::Voice(f));
        }
        if let Some(thumb) = self.sticker.as_ref().and_then(TelegramSticker::thumbnail) {
            return Some(MessageContent::Sticker(thumb));
        }
        if let Some(f) = &self.document {
            return Some(MessageContent::Document(f));
        }
        if let Some(venue) = &self.venue {
            return Some(MessageContent::Venue {
                venue,
                location: venue.location.or(self.location),
            });
        }
        if let Some(loc) = self.location {
            return Some(MessageContent::Location(loc));
        }
        self.contact.as_ref().map(MessageContent::Contact)
    }

    fn validate(&self) -> Result<()> {
        for p in &self.photo {
            require_non_empty("photo.file_id", &p.file_id)?;
        }
        for (field, file) in [
            ("video.file_id", &self.video),
            ("voice.file_id", &self.voice),
            ("document.file_id", &self.document),
        ] {
            if let Some(f) = file {
                require_non_empty(field, &f.file_id)?;
            }
        }
        if let Some(sticker) = &self.sticker {
            let thumb = sticker
                .thumbnail()
                .ok_or_else(|| ChannelError::validation("field 'sticker.thumbnail' is required"))?;
            require_non_empty("sticker.thumbnail.file_id", &thumb.file_id)?;
        }
        Ok(())
    }
}

impl Validate for TelegramUpdate {
    fn validate(&self) -> Result<()> {
        if self.update_id == 0 {
            return Err(ChannelError::validation("field 'update_id' is required"));
        }
        match &self.message {
            Some(m) => m.validate(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::decode::decode_and_validate;
    use serde_json::json;

    fn update(message: serde_json::Value) -> TelegramUpdate {
        let body = json!({ "update_id": 174114370, "message": message }).to_string();
        decode_and_validate(body.as_bytes()).unwrap()
    }

    #[test]
    fn plain_text_has_no_content() {
        let u = update(json!({ "message_id": 41, "date": 1454119029, "text": "Hello World" }));
        let m = u.message.unwrap();
        assert_eq!(m.text, "Hello World");
        assert!(m.content().is_none());
    }

    #[test]
    fn venue_wins_over_location() {
        let u = update(json!({
            "message_id": 1,
            "location": { "latitude": 1.0, "longitude": 2.0 },
            "venue": { "title": "Cafe", "address": "Main St" }
        }));
        let m = u.message.unwrap();
        match m.content() {
            Some(MessageContent::Venue { venue, location }) => {
                assert_eq!(venue.title, "Cafe");
                let loc = location.unwrap();
                assert_eq!((loc.latitude, loc.longitude), (1.0, 2.0));
            }
            other => panic!("expected venue, got {:?}", other),
        }
    }

    #[test]
    fn photo_wins_over_document() {
        let u = update(json!({
            "message_id": 1,
            "photo": [{ "file_id": "p1", "file_size": 10 }],
            "document": { "file_id": "d1" }
        }));
        assert_eq!(u.message.unwrap().content().unwrap().kind(), "photo");
    }

    #[test]
    fn sticker_uses_legacy_thumb_field() {
        let u = update(json!({
            "message_id": 1,
            "sticker": { "file_id": "s1", "thumb": { "file_id": "t1" } }
        }));
        match u.message.unwrap().content() {
            Some(MessageContent::Sticker(f)) => assert_eq!(f.file_id, "t1"),
            other => panic!("expected sticker, got {:?}", other),
        }
    }

    #[test]
    fn sticker_accepts_both_thumbnail_names_together() {
        let u = update(json!({
            "message_id": 1,
            "sticker": {
                "file_id": "s1",
                "thumb": { "file_id": "old" },
                "thumbnail": { "file_id": "new" }
            }
        }));
        match u.message.unwrap().content() {
            Some(MessageContent::Sticker(f)) => assert_eq!(f.file_id, "new"),
            other => panic!("expected sticker, got {:?}", other),
        }
    }

    #[test]
    fn missing_update_id_is_invalid() {
        let err = decode_and_validate::<TelegramUpdate>(br#"{"message": {"message_id": 1}}"#)
            .unwrap_err();
        assert!(matches!(err, ChannelError::Validation(_)));
        let err = decode_and_validate::<TelegramUpdate>(br#"{"update_id": 0}"#).unwrap_err();
        assert!(err.to_string().contains("update_id"));
    }

    #[test]
    fn file_without_id_is_invalid() {
        let body = json!({ "update_id": 1, "message": { "message_id": 1, "video": { "file_id": "" } } });
        let err = decode_and_validate::<TelegramUpdate>(body.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("video.file_id"));
    }

    #[test]
    fn sticker_without_thumbnail_is_invalid() {
        let body = json!({ "update_id": 1, "message": { "message_id": 1, "sticker": { "file_id": "s" } } });
        let err = decode_and_validate::<TelegramUpdate>(body.to_string().as_bytes()).unwrap_err();
        assert!(err.to_string().contains("sticker.thumbnail"));
    }
}
