//! Channel handler registry (by channel type) and configured channel lookup (by uuid).

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::channel::{Channel, ChannelType};
use super::error::{ChannelError, Result};
use super::inbound::CanonicalEvent;
use super::outbound::OutboundMsg;
use super::status::MsgStatus;

/// Protocol adapter for one provider.
#[async_trait]
pub trait ChannelHandler: Send + Sync {
    /// Channel type code this handler serves (e.g. "TG").
    fn channel_type(&self) -> &ChannelType;
    /// Human-readable provider name.
    fn name(&self) -> &str;
    /// Decode, validate, and normalize a webhook body into a canonical event.
    async fn receive(&self, channel: &Channel, body: &[u8]) -> Result<CanonicalEvent>;
    /// Deliver an outbound message. Per-part failures are encoded in the status;
    /// `Err` is reserved for failures that prevent any attempt (e.g. missing credentials).
    async fn send_msg(&self, channel: &Channel, msg: &OutboundMsg) -> Result<MsgStatus>;
}

/// Registry of channel types to handlers. Shared across the gateway.
pub struct ChannelRegistry {
    inner: Arc<RwLock<HashMap<ChannelType, Arc<dyn ChannelHandler>>>>,
}

impl Default for ChannelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn register(&self, handler: Arc<dyn ChannelHandler>) {
        let channel_type = handler.channel_type().clone();
        log::info!("registered {} handler ({})", handler.name(), channel_type);
        self.inner.write().await.insert(channel_type, handler);
    }

    pub async fn get(&self, channel_type: &ChannelType) -> Option<Arc<dyn ChannelHandler>> {
        self.inner.read().await.get(channel_type).cloned()
    }

    pub async fn handler_for(&self, channel: &Channel) -> Result<Arc<dyn ChannelHandler>> {
        self.get(&channel.channel_type)
            .await
            .ok_or_else(|| ChannelError::UnknownChannelType(channel.channel_type.to_string()))
    }

    pub async fn types(&self) -> Vec<ChannelType> {
        self.inner.read().await.keys().cloned().collect()
    }
}

/// Configured channels keyed by uuid. Read-only after start-up.
#[derive(Debug, Clone, Default)]
pub struct ChannelStore {
    channels: HashMap<String, Channel>,
}

impl ChannelStore {
    pub fn new(channels: impl IntoIterator<Item = Channel>) -> Self {
        Self {
            channels: channels
                .into_iter()
                .map(|c| (c.uuid.to_lowercase(), c))
                .collect(),
        }
    }

    /// Look up a channel by uuid (case-insensitive), optionally requiring a channel type.
    pub fn get(&self, uuid: &str, channel_type: Option<&str>) -> Result<&Channel> {
        self.channels
            .get(&uuid.to_lowercase())
            .filter(|c| channel_type.map_or(true, |t| c.channel_type.as_str().eq_ignore_ascii_case(t)))
            .ok_or_else(|| ChannelError::UnknownChannel(uuid.to_string()))
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
