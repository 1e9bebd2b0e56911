//! Messaging channels (e.g. Telegram).
//!
//! A channel handler turns provider webhooks into canonical events and sends
//! outbound messages through the provider API. Handlers are registered by
//! channel type; configured channels are looked up by uuid.

mod backend;
mod channel;
mod decode;
mod error;
mod inbound;
mod outbound;
mod registry;
mod status;
pub mod telegram;

pub use backend::{Backend, MemoryBackend};
pub use channel::{Channel, ChannelType, CONFIG_AUTH_TOKEN};
pub use decode::{decode_and_validate, require_non_empty, Validate};
pub use error::{ChannelError, Result};
pub use inbound::{
    name_from_first_last_username, CanonicalEvent, ChannelEvent, ChannelEventType, IncomingMsg, Urn,
};
pub use outbound::{Attachment, OutboundMsg};
pub use registry::{ChannelHandler, ChannelRegistry, ChannelStore};
pub use status::{ChannelLog, MsgStatus, MsgStatusValue};
pub use telegram::TelegramHandler;
