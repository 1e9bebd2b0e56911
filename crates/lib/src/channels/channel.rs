//! A configured connection to one provider account.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Config key holding the provider auth token (e.g. the Telegram bot token).
pub const CONFIG_AUTH_TOKEN: &str = "auth_token";

/// Short channel type code, e.g. `TG` for Telegram.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelType(pub String);

impl ChannelType {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Channel as loaded from config: identity plus free-form per-channel settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub uuid: String,
    pub channel_type: ChannelType,
    #[serde(default)]
    pub name: String,
    /// Provider-side address of the channel (for Telegram, the bot username).
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub config: serde_json::Map<String, serde_json::Value>,
}

impl Channel {
    /// Raw config value for `key`; callers apply their own default.
    pub fn config_for_key(&self, key: &str) -> Option<&serde_json::Value> {
        self.config.get(key)
    }

    /// Config value for `key` when it is a non-empty string.
    pub fn string_for_key(&self, key: &str) -> Option<&str> {
        self.config_for_key(key)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
