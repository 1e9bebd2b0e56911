//! Host persistence sinks for channel events, messages, and delivery statuses.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::inbound::{ChannelEvent, IncomingMsg};
use super::status::MsgStatus;

/// Where normalized events and delivery statuses are written. The gateway provides one.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn write_channel_event(&self, event: &ChannelEvent) -> anyhow::Result<()>;
    async fn write_msg(&self, msg: &IncomingMsg) -> anyhow::Result<()>;
    async fn write_msg_status(&self, status: &MsgStatus) -> anyhow::Result<()>;
}

/// In-memory backend: keeps everything written, in order.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    events: Arc<RwLock<Vec<ChannelEvent>>>,
    msgs: Arc<RwLock<Vec<IncomingMsg>>>,
    statuses: Arc<RwLock<Vec<MsgStatus>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn events(&self) -> Vec<ChannelEvent> {
        self.events.read().await.clone()
    }

    pub async fn msgs(&self) -> Vec<IncomingMsg> {
        self.msgs.read().await.clone()
    }

    pub async fn statuses(&self) -> Vec<MsgStatus> {
        self.statuses.read().await.clone()
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn write_channel_event(&self, event: &ChannelEvent) -> anyhow::Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn write_msg(&self, msg: &IncomingMsg) -> anyhow::Result<()> {
        self.msgs.write().await.push(msg.clone());
        Ok(())
    }

    async fn write_msg_status(&self, status: &MsgStatus) -> anyhow::Result<()> {
        self.statuses.write().await.push(status.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::channel::Channel;
    use crate::channels::inbound::Urn;
    use serde_json::json;

    #[tokio::test]
    async fn memory_backend_keeps_writes_in_order() {
        let channel: Channel = serde_json::from_value(json!({ "uuid": "c1", "channelType": "TG" })).unwrap();
        let backend = MemoryBackend::new();
        let shared: Arc<dyn Backend> = Arc::new(backend.clone());

        shared
            .write_msg(&IncomingMsg::new(&channel, Urn::telegram(1, ""), "first"))
            .await
            .unwrap();
        shared
            .write_msg(&IncomingMsg::new(&channel, Urn::telegram(1, ""), "second"))
            .await
            .unwrap();

        let texts: Vec<String> = backend.msgs().await.into_iter().map(|m| m.text).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert!(backend.events().await.is_empty());
    }
}
