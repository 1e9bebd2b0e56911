//! Shared outbound HTTP transport used by channel handlers.
//!
//! Every call is recorded as an [`HttpExchange`] whether or not it reached the
//! remote end, so callers can always build a channel log from it.

use std::time::{Duration, Instant};

use reqwest::{Method, StatusCode};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Response half of an exchange: status and raw body.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// One request/response round-trip (or a failed attempt at one).
#[derive(Debug)]
pub struct HttpExchange {
    pub method: Method,
    pub url: String,
    /// Encoded request body as sent.
    pub request: String,
    pub elapsed: Duration,
    pub response: Result<HttpResponse, TransportError>,
}

/// Thin wrapper over a pooled `reqwest::Client`. Cheap to clone.
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                log::warn!("building http client with timeout failed, using defaults: {}", e);
                reqwest::Client::new()
            });
        Self { client }
    }

    /// POST `fields` form-encoded to `url`. Non-2xx statuses are not errors here;
    /// only failures to complete the round-trip are. Errors never carry the URL,
    /// since it may embed credentials.
    pub async fn post_form(&self, url: &str, fields: &[(&str, &str)]) -> HttpExchange {
        let started = Instant::now();
        let request = match self.client.post(url).form(fields).build() {
            Ok(r) => r,
            Err(e) => {
                return HttpExchange {
                    method: Method::POST,
                    url: url.to_string(),
                    request: String::new(),
                    elapsed: started.elapsed(),
                    response: Err(e.without_url().into()),
                }
            }
        };
        let body = request
            .body()
            .and_then(|b| b.as_bytes())
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default();

        let response: Result<HttpResponse, TransportError> = match self.client.execute(request).await {
            Ok(res) => {
                let status = res.status();
                res.text()
                    .await
                    .map(|body| HttpResponse { status, body })
                    .map_err(|e| e.without_url().into())
            }
            Err(e) => Err(e.without_url().into()),
        };

        HttpExchange {
            method: Method::POST,
            url: url.to_string(),
            request: body,
            elapsed: started.elapsed(),
            response,
        }
    }
}
