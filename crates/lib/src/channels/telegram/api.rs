//! Telegram Bot API endpoints: `{base}/bot{token}/{method}` calls and `{base}/file/bot{token}/{path}` URLs.

use serde::Deserialize;

use crate::transport::{HttpExchange, HttpTransport};

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Bot API client bound to a base URL. Tokens are per call, since each channel has its own.
#[derive(Clone)]
pub struct TelegramApi {
    base_url: String,
    transport: HttpTransport,
}

impl TelegramApi {
    pub fn new(base_url: impl Into<String>, transport: HttpTransport) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, token, method)
    }

    /// Durable download URL for a path returned by `getFile`.
    pub fn file_url(&self, token: &str, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, token, file_path.trim_start_matches('/'))
    }

    /// POST a form-encoded Bot API call.
    pub async fn call(&self, token: &str, method: &str, form: &[(&str, &str)]) -> HttpExchange {
        self.transport
            .post_form(&self.method_url(token, method), form)
            .await
    }
}

/// Bot API response envelope: `{ "ok": bool, "result": ..., "description": ... }`.
///
/// Parsing is lenient: a body that is not JSON yields an envelope with no `ok`.
#[derive(Debug, Default, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub ok: Option<bool>,
    #[serde(default)]
    pub result: serde_json::Value,
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiEnvelope {
    pub fn parse(body: &str) -> Self {
        serde_json::from_str(body).unwrap_or_default()
    }

    pub fn is_ok(&self) -> bool {
        self.ok == Some(true)
    }

    /// `result.<field>` as an integer.
    pub fn result_i64(&self, field: &str) -> Option<i64> {
        self.result.get(field).and_then(|v| v.as_i64())
    }

    /// `result.<field>` as a non-empty string.
    pub fn result_str(&self, field: &str) -> Option<&str> {
        self.result
            .get(field)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_use_base_and_token() {
        let api = TelegramApi::new("http://localhost:9000/", HttpTransport::default());
        assert_eq!(api.base_url(), "http://localhost:9000");
        assert_eq!(
            api.method_url("123:abc", "sendMessage"),
            "http://localhost:9000/bot123:abc/sendMessage"
        );
        assert_eq!(
            api.file_url("123:abc", "photos/file_0.jpg"),
            "http://localhost:9000/file/bot123:abc/photos/file_0.jpg"
        );
    }

    #[test]
    fn envelope_parsing() {
        let env = ApiEnvelope::parse(r#"{"ok":true,"result":{"message_id":77,"file_path":"a/b.jpg"}}"#);
        assert!(env.is_ok());
        assert_eq!(env.result_i64("message_id"), Some(77));
        assert_eq!(env.result_str("file_path"), Some("a/b.jpg"));

        let env = ApiEnvelope::parse("<html>bad gateway</html>");
        assert_eq!(env.ok, None);
        assert!(!env.is_ok());

        let env = ApiEnvelope::parse(r#"{"ok":false,"error_code":400,"description":"Bad Request"}"#);
        assert_eq!(env.ok, Some(false));
        assert_eq!(env.description.as_deref(), Some("Bad Request"));
    }
}
