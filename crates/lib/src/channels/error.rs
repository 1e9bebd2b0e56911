//! Errors shared by channel handlers.

use crate::transport::TransportError;

pub type Result<T> = std::result::Result<T, ChannelError>;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// Nothing to do for this request. Hosts acknowledge it as ignored, not as a failure.
    #[error("Ignoring request, no message")]
    IgnoredNoMessage,

    /// Webhook payload is malformed or missing required fields.
    #[error("invalid payload: {0}")]
    Validation(String),

    /// Channel credentials are missing or unusable.
    #[error("invalid auth token config")]
    Auth,

    /// Provider answered, but without the expected success marker or field.
    #[error("{message}")]
    Provider {
        message: String,
        /// Raw response body for context.
        response: String,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("unknown media type: {0}")]
    UnsupportedMediaType(String),

    /// Inbound media could not be resolved to a URL.
    #[error("error retrieving media: {0}")]
    MediaResolution(#[source] Box<ChannelError>),

    #[error("channel not found: {0}")]
    UnknownChannel(String),

    #[error("no handler for channel type: {0}")]
    UnknownChannelType(String),
}

impl ChannelError {
    pub fn validation(message: impl std::fmt::Display) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn provider(message: impl Into<String>, response: impl Into<String>) -> Self {
        Self::Provider {
            message: message.into(),
            response: response.into(),
        }
    }

    pub fn media_resolution(cause: ChannelError) -> Self {
        Self::MediaResolution(Box::new(cause))
    }

    /// True for the "nothing to do" signal, which is not a failure.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::IgnoredNoMessage)
    }
}
