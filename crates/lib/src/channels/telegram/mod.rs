//! Telegram channel: webhook updates in, Bot API form calls out.
//!
//! Each configured channel carries its own bot token under the `auth_token`
//! config key; the handler itself is shared by every Telegram channel.

pub mod api;
pub mod files;
pub mod keyboard;
pub mod normalize;
pub mod payload;
pub mod send;

use async_trait::async_trait;

use crate::channels::channel::{Channel, ChannelType, CONFIG_AUTH_TOKEN};
use crate::channels::decode::decode_and_validate;
use crate::channels::error::{ChannelError, Result};
use crate::channels::inbound::CanonicalEvent;
use crate::channels::outbound::OutboundMsg;
use crate::channels::registry::ChannelHandler;
use crate::channels::status::MsgStatus;
use crate::transport::HttpTransport;

use api::TelegramApi;
use files::FileResolver;
use normalize::Normalizer;
use payload::TelegramUpdate;
use send::Dispatcher;

pub use api::DEFAULT_API_BASE;

/// Channel type code for Telegram channels.
pub const CHANNEL_TYPE: &str = "TG";

/// Bot token for `channel`, or `Auth` when it is missing or blank.
pub(crate) fn auth_token(channel: &Channel) -> Result<&str> {
    channel
        .string_for_key(CONFIG_AUTH_TOKEN)
        .ok_or(ChannelError::Auth)
}

pub struct TelegramHandler {
    channel_type: ChannelType,
    normalizer: Normalizer,
    dispatcher: Dispatcher,
}

impl TelegramHandler {
    /// Handler talking to the Bot API at `api_base` through `transport`.
    pub fn new(api_base: impl Into<String>, transport: HttpTransport) -> Self {
        let api = TelegramApi::new(api_base, transport);
        Self {
            channel_type: ChannelType::new(CHANNEL_TYPE),
            normalizer: Normalizer::new(FileResolver::new(api.clone())),
            dispatcher: Dispatcher::new(api),
        }
    }
}

impl Default for TelegramHandler {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE, HttpTransport::default())
    }
}

#[async_trait]
impl ChannelHandler for TelegramHandler {
    fn channel_type(&self) -> &ChannelType {
        &self.channel_type
    }

    fn name(&self) -> &str {
        "Telegram"
    }

    async fn receive(&self, channel: &Channel, body: &[u8]) -> Result<CanonicalEvent> {
        let update: TelegramUpdate = decode_and_validate(body)?;
        self.normalizer.normalize(channel, &update).await
    }

    async fn send_msg(&self, channel: &Channel, msg: &OutboundMsg) -> Result<MsgStatus> {
        self.dispatcher.dispatch(channel, msg).await
    }
}
