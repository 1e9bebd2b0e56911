//! Delivery status for outbound messages and the per-call channel logs behind it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::error::ChannelError;
use crate::transport::HttpExchange;

const REDACTED: &str = "****";

/// Delivery state of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MsgStatusValue {
    /// At least one part failed, or nothing was sent.
    Errored,
    /// Every part was accepted by the provider.
    Wired,
}

/// Record of one provider call (or of a part that could not be attempted).
#[derive(Debug, Clone, Serialize)]
pub struct ChannelLog {
    pub description: String,
    pub channel_uuid: String,
    pub msg_uuid: Option<Uuid>,
    pub method: String,
    pub url: String,
    pub status_code: Option<u16>,
    pub request: String,
    pub response: String,
    pub elapsed_ms: u64,
    pub error: Option<String>,
    pub created_on: DateTime<Utc>,
}

impl ChannelLog {
    pub fn new(description: impl Into<String>, channel_uuid: &str, msg_uuid: Option<Uuid>) -> Self {
        Self {
            description: description.into(),
            channel_uuid: channel_uuid.to_string(),
            msg_uuid,
            method: String::new(),
            url: String::new(),
            status_code: None,
            request: String::new(),
            response: String::new(),
            elapsed_ms: 0,
            error: None,
            created_on: Utc::now(),
        }
    }

    /// Log built from a transport exchange; transport failures become the log's error.
    pub fn from_exchange(
        description: impl Into<String>,
        channel_uuid: &str,
        msg_uuid: Option<Uuid>,
        exchange: &HttpExchange,
    ) -> Self {
        let mut log = Self::new(description, channel_uuid, msg_uuid);
        log.method = exchange.method.to_string();
        log.url = exchange.url.clone();
        log.request = exchange.request.clone();
        log.elapsed_ms = u64::try_from(exchange.elapsed.as_millis()).unwrap_or(u64::MAX);
        match &exchange.response {
            Ok(res) => {
                log.status_code = Some(res.status.as_u16());
                log.response = res.body.clone();
            }
            Err(e) => log.error = Some(e.to_string()),
        }
        log
    }

    /// Attach an error unless one is already recorded.
    pub fn with_error(mut self, err: impl fmt::Display) -> Self {
        if self.error.is_none() {
            self.error = Some(err.to_string());
        }
        self
    }

    /// Replace every occurrence of `secret` (e.g. a bot token in the URL).
    pub fn redacted(mut self, secret: &str) -> Self {
        if secret.is_empty() {
            return self;
        }
        for field in [&mut self.url, &mut self.request, &mut self.response] {
            if field.contains(secret) {
                *field = field.replace(secret, REDACTED);
            }
        }
        if let Some(err) = self.error.as_mut() {
            if err.contains(secret) {
                *err = err.replace(secret, REDACTED);
            }
        }
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Accumulates the outcome of every part of one outbound message.
///
/// Starts Errored; becomes Wired once at least one part was recorded and no
/// part failed. A failure is sticky: later successes do not clear it.
#[derive(Debug, Clone, Serialize)]
pub struct MsgStatus {
    pub channel_uuid: String,
    pub msg_uuid: Uuid,
    pub status: MsgStatusValue,
    /// Provider id of the most recent successfully sent part.
    pub external_id: Option<String>,
    pub logs: Vec<ChannelLog>,
    #[serde(skip)]
    parts: usize,
    #[serde(skip)]
    failures: usize,
}

impl MsgStatus {
    pub fn for_msg(channel_uuid: impl Into<String>, msg_uuid: Uuid) -> Self {
        Self {
            channel_uuid: channel_uuid.into(),
            msg_uuid,
            status: MsgStatusValue::Errored,
            external_id: None,
            logs: Vec::new(),
            parts: 0,
            failures: 0,
        }
    }

    /// Record one part: its log and either the provider id it was given or why it failed.
    pub fn record(&mut self, log: ChannelLog, outcome: Result<String, ChannelError>) {
        self.parts += 1;
        match outcome {
            Ok(external_id) => {
                self.external_id = Some(external_id);
                self.logs.push(log);
            }
            Err(e) => {
                self.failures += 1;
                self.logs.push(log.with_error(&e));
            }
        }
        self.status = if self.failures == 0 {
            MsgStatusValue::Wired
        } else {
            MsgStatusValue::Errored
        };
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn is_wired(&self) -> bool {
        self.status == MsgStatusValue::Wired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(desc: &str) -> ChannelLog {
        ChannelLog::new(desc, "chan", None)
    }

    #[test]
    fn empty_status_is_errored() {
        let status = MsgStatus::for_msg("chan", Uuid::new_v4());
        assert_eq!(status.status, MsgStatusValue::Errored);
        assert_eq!(status.parts(), 0);
    }

    #[test]
    fn all_successes_are_wired_with_last_external_id() {
        let mut status = MsgStatus::for_msg("chan", Uuid::new_v4());
        status.record(log("one"), Ok("1".into()));
        status.record(log("two"), Ok("2".into()));
        assert!(status.is_wired());
        assert_eq!(status.external_id.as_deref(), Some("2"));
        assert!(status.logs.iter().all(|l| !l.is_error()));
    }

    #[test]
    fn failure_is_sticky_and_keeps_last_success_id() {
        let mut status = MsgStatus::for_msg("chan", Uuid::new_v4());
        status.record(log("one"), Ok("1".into()));
        status.record(
            log("two"),
            Err(ChannelError::UnsupportedMediaType("application/pdf".into())),
        );
        status.record(log("three"), Ok("3".into()));
        assert_eq!(status.status, MsgStatusValue::Errored);
        assert_eq!(status.external_id.as_deref(), Some("3"));
        assert_eq!(status.failures(), 1);
        assert_eq!(
            status.logs[1].error.as_deref(),
            Some("unknown media type: application/pdf")
        );
    }

    #[test]
    fn redacted_hides_secret_everywhere() {
        let mut l = log("sent");
        l.url = "https://api.telegram.org/bot123:abc/sendMessage".into();
        l.error = Some("failed calling bot123:abc".into());
        let l = l.redacted("123:abc");
        assert_eq!(l.url, "https://api.telegram.org/bot****/sendMessage");
        assert_eq!(l.error.as_deref(), Some("failed calling bot****"));
    }
}
