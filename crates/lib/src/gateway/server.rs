//! Gateway HTTP server (single port): webhook ingestion, outbound send, health.

use crate::channels::{
    Backend, CanonicalEvent, Channel, ChannelError, ChannelHandler, ChannelRegistry, ChannelStore,
    MemoryBackend, OutboundMsg, TelegramHandler,
};
use crate::config::{self, Config};
use crate::gateway::protocol::Ack;
use crate::transport::HttpTransport;
use anyhow::{Context, Result};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// When auth mode is token and a token is configured, returns it for `/send` validation.
fn require_send_token(config: &Config) -> Option<String> {
    if config.gateway.auth.mode == config::GatewayAuthMode::Token {
        config::resolve_gateway_token(config)
    } else {
        None
    }
}

/// Shared state for the gateway (config, handlers, channels, backend).
#[derive(Clone)]
pub struct GatewayState {
    pub config: Arc<Config>,
    /// When Some, `/send` must carry `Authorization: Bearer <token>` matching this.
    pub required_token: Option<String>,
    pub registry: Arc<ChannelRegistry>,
    pub store: Arc<ChannelStore>,
    pub backend: Arc<dyn Backend>,
}

impl GatewayState {
    /// Build state from config: registers the Telegram handler against the resolved
    /// Bot API base and loads the configured channels.
    pub async fn from_config(config: Config, backend: Arc<dyn Backend>) -> Self {
        let transport = HttpTransport::new(config.telegram.request_timeout());
        let api_base = config::resolve_telegram_api_base(&config);
        log::debug!("telegram bot api base: {}", api_base);

        let registry = Arc::new(ChannelRegistry::new());
        registry
            .register(Arc::new(TelegramHandler::new(api_base, transport)))
            .await;

        for channel in &config.channels {
            if registry.get(&channel.channel_type).await.is_none() {
                log::warn!(
                    "channel {} has type {} with no handler; webhooks for it will be rejected",
                    channel.uuid,
                    channel.channel_type
                );
            }
        }
        let store = Arc::new(ChannelStore::new(config.channels.iter().cloned()));

        Self {
            required_token: require_send_token(&config),
            config: Arc::new(config),
            registry,
            store,
            backend,
        }
    }

    async fn lookup(
        &self,
        uuid: &str,
        channel_type: Option<&str>,
    ) -> Result<(Channel, Arc<dyn ChannelHandler>), ChannelError> {
        let channel = self.store.get(uuid, channel_type)?.clone();
        let handler = self.registry.handler_for(&channel).await?;
        Ok((channel, handler))
    }
}

/// Routes: `GET /`, `POST /c/:channel_type/:uuid/receive`, `POST /send`.
pub fn build_router(state: GatewayState) -> Router {
    Router::new()
        .route("/", get(health_http))
        .route("/c/:channel_type/:uuid/receive", post(receive_webhook))
        .route("/send", post(send_http))
        .with_state(state)
}

/// Run the gateway server; binds to config.gateway.bind:config.gateway.port.
/// When bind is not loopback, a gateway token must be configured or startup fails.
/// Blocks until shutdown (e.g. Ctrl+C).
pub async fn run_gateway(config: Config) -> Result<()> {
    let bind = config.gateway.bind.trim().to_string();
    if !config::is_loopback_bind(&bind) {
        let token = config::resolve_gateway_token(&config);
        if token.is_none() || config.gateway.auth.mode != config::GatewayAuthMode::Token {
            anyhow::bail!(
                "refusing to bind gateway to {} without auth (set gateway.auth.mode to \"token\" and gateway.auth.token or TGRELAY_GATEWAY_TOKEN)",
                bind
            );
        }
    }

    let bind_addr = format!("{}:{}", bind, config.gateway.port);
    let state = GatewayState::from_config(config, Arc::new(MemoryBackend::new())).await;
    log::info!(
        "loaded {} channel(s), handlers: {:?}",
        state.store.len(),
        state.registry.types().await
    );

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding to {}", bind_addr))?;
    log::info!("gateway listening on {}", bind_addr);

    serve(listener, state, shutdown_signal()).await?;
    log::info!("gateway stopped");
    Ok(())
}

/// Serve the gateway on an already-bound listener until `shutdown` completes.
pub async fn serve<F>(listener: TcpListener, state: GatewayState, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("gateway server exited")
}

/// Future that completes when the process should shut down (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    log::info!("shutdown signal received, draining connections");
}

fn ack(status: StatusCode, body: Ack) -> Response {
    (status, Json(body)).into_response()
}

/// POST /c/:channel_type/:uuid/receive: normalize a provider webhook and write the result to the backend.
async fn receive_webhook(
    State(state): State<GatewayState>,
    Path((channel_type, uuid)): Path<(String, String)>,
    body: Bytes,
) -> Response {
    let (channel, handler) = match state.lookup(&uuid, Some(channel_type.as_str())).await {
        Ok(found) => found,
        Err(e) => {
            log::debug!("webhook for {}/{} rejected: {}", channel_type, uuid, e);
            return ack(StatusCode::BAD_REQUEST, Ack::error(e));
        }
    };

    let event = match handler.receive(&channel, &body).await {
        Ok(event) => event,
        Err(e) if e.is_ignored() => return ack(StatusCode::OK, Ack::ignored(e.to_string())),
        Err(e) => {
            log::debug!("{} webhook for channel {} failed: {}", handler.name(), channel.uuid, e);
            return ack(StatusCode::BAD_REQUEST, Ack::error(e));
        }
    };

    let written = match &event {
        CanonicalEvent::ConversationStarted(ev) => state.backend.write_channel_event(ev).await,
        CanonicalEvent::IncomingMessage(msg) => state.backend.write_msg(msg).await,
    };
    if let Err(e) = written {
        log::error!("writing event for channel {} failed: {:#}", channel.uuid, e);
        return ack(StatusCode::INTERNAL_SERVER_ERROR, Ack::error(format!("{:#}", e)));
    }
    log::debug!("accepted webhook on channel {} from {}", channel.uuid, event.urn());
    ack(StatusCode::OK, Ack::accepted(&event))
}

/// Credentials of an `Authorization: Bearer <token>` header; the scheme name is case-insensitive.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|t| !t.is_empty())
}

/// POST /send: deliver an outbound message through its channel's handler and record the status.
async fn send_http(State(state): State<GatewayState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Some(ref expected) = state.required_token {
        if bearer_token(&headers) != Some(expected.as_str()) {
            return ack(StatusCode::UNAUTHORIZED, Ack::error("invalid or missing gateway token"));
        }
    }

    let msg: OutboundMsg = match serde_json::from_slice(&body) {
        Ok(m) => m,
        Err(e) => {
            return ack(
                StatusCode::BAD_REQUEST,
                Ack::error(format!("unable to parse request JSON: {}", e)),
            )
        }
    };

    let (channel, handler) = match state.lookup(&msg.channel_uuid, None).await {
        Ok(found) => found,
        Err(e) => return ack(StatusCode::BAD_REQUEST, Ack::error(e)),
    };

    let status = match handler.send_msg(&channel, &msg).await {
        Ok(status) => status,
        Err(e) => {
            log::warn!("send for msg {} on channel {} failed: {}", msg.uuid, channel.uuid, e);
            return ack(StatusCode::BAD_REQUEST, Ack::error(e));
        }
    };

    if let Err(e) = state.backend.write_msg_status(&status).await {
        log::error!("writing status for msg {} failed: {:#}", msg.uuid, e);
        return ack(StatusCode::INTERNAL_SERVER_ERROR, Ack::error(format!("{:#}", e)));
    }
    (StatusCode::OK, Json(status)).into_response()
}

/// GET / returns a simple health JSON (for probes).
async fn health_http(State(state): State<GatewayState>) -> Json<serde_json::Value> {
    Json(json!({
        "runtime": "running",
        "port": state.config.gateway.port,
        "channels": state.store.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use rstest::rstest;

    #[rstest]
    #[case("Bearer gw-secret", Some("gw-secret"))]
    #[case("bearer gw-secret", Some("gw-secret"))]
    #[case("BEARER  gw-secret ", Some("gw-secret"))]
    #[case("Basic gw-secret", None)]
    #[case("Bearer ", None)]
    #[case("gw-secret", None)]
    fn bearer_token_parsing(#[case] header: &str, #[case] expected: Option<&str>) {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(header).unwrap());
        assert_eq!(bearer_token(&headers), expected);
    }

    #[test]
    fn bearer_token_absent_without_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
