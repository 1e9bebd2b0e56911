//! Resolve Telegram file handles into fetchable URLs with `getFile`.

use crate::channels::channel::Channel;
use crate::channels::error::{ChannelError, Result};

use super::api::{ApiEnvelope, TelegramApi};
use super::auth_token;

/// One `getFile` round-trip per call; no caching.
#[derive(Clone)]
pub struct FileResolver {
    api: TelegramApi,
}

impl FileResolver {
    pub fn new(api: TelegramApi) -> Self {
        Self { api }
    }

    /// Durable URL for `file_id`, built from the API base, the channel's token, and the returned path.
    pub async fn resolve_file_id(&self, channel: &Channel, file_id: &str) -> Result<String> {
        let token = auth_token(channel)?;
        let exchange = self.api.call(token, "getFile", &[("file_id", file_id)]).await;
        let response = exchange.response?;

        let envelope = ApiEnvelope::parse(&response.body);
        match envelope.ok {
            None => return Err(ChannelError::provider("no 'ok' in response", response.body)),
            Some(false) => {
                return Err(ChannelError::provider(
                    format!("file id '{}' not present", file_id),
                    response.body,
                ))
            }
            Some(true) => {}
        }

        let path = envelope
            .result_str("file_path")
            .ok_or_else(|| ChannelError::provider("no 'result.file_path' in response", response.body.clone()))?;
        log::debug!("resolved telegram file {} to path {}", file_id, path);
        Ok(self.api.file_url(token, path))
    }
}
