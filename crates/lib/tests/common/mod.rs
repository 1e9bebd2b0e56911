//! Shared helpers: a mock Telegram Bot API on an ephemeral port that records every call.

#![allow(dead_code)]

use axum::{
    extract::{Path, State},
    routing::post,
    Form, Json, Router,
};
use relay::channels::Channel;
use relay::transport::HttpTransport;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;

pub const CHANNEL_UUID: &str = "8eb23e93-5ecb-45ba-b726-3b064e0c56ab";
pub const BOT_TOKEN: &str = "a123";

/// One captured Bot API call.
#[derive(Debug, Clone)]
pub struct CapturedCall {
    /// Path after the host, e.g. `bota123/sendMessage`.
    pub path: String,
    pub form: HashMap<String, String>,
}

impl CapturedCall {
    pub fn method(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or("")
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.form.get(key).map(String::as_str)
    }

    pub fn reply_markup(&self) -> Value {
        self.field("reply_markup")
            .map(|s| serde_json::from_str(s).expect("reply_markup is JSON"))
            .unwrap_or(Value::Null)
    }
}

#[derive(Clone)]
struct MockState {
    calls: Arc<Mutex<Vec<CapturedCall>>>,
    file_paths: Arc<HashMap<String, String>>,
    file_bodies: Arc<HashMap<String, Value>>,
    fail_value: Option<String>,
    next_message_id: Arc<AtomicI64>,
}

/// Mock Bot API. `getFile` answers from the canned bodies, then the known file paths; send methods answer
/// with increasing message ids unless a form field equals the configured failure value.
pub struct MockTelegram {
    pub base_url: String,
    calls: Arc<Mutex<Vec<CapturedCall>>>,
    shutdown: Option<oneshot::Sender<()>>,
}

#[derive(Default)]
pub struct MockTelegramBuilder {
    file_paths: HashMap<String, String>,
    file_bodies: HashMap<String, Value>,
    fail_value: Option<String>,
}

impl MockTelegramBuilder {
    pub fn file(mut self, file_id: &str, file_path: &str) -> Self {
        self.file_paths.insert(file_id.to_string(), file_path.to_string());
        self
    }

    /// `getFile` for this id answers with `body` verbatim.
    pub fn file_body(mut self, file_id: &str, body: Value) -> Self {
        self.file_bodies.insert(file_id.to_string(), body);
        self
    }

    /// Any send whose form carries this value answers `{"ok": false}`.
    pub fn fail_on(mut self, value: &str) -> Self {
        self.fail_value = Some(value.to_string());
        self
    }

    pub async fn start(self) -> MockTelegram {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            calls: Arc::clone(&calls),
            file_paths: Arc::new(self.file_paths),
            file_bodies: Arc::new(self.file_bodies),
            fail_value: self.fail_value,
            next_message_id: Arc::new(AtomicI64::new(100)),
        };
        let app = Router::new()
            .route("/*path", post(bot_api_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        MockTelegram {
            base_url: format!("http://{}", addr),
            calls,
            shutdown: Some(shutdown_tx),
        }
    }
}

impl MockTelegram {
    pub fn builder() -> MockTelegramBuilder {
        MockTelegramBuilder::default()
    }

    pub fn calls(&self) -> Vec<CapturedCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn calls_to(&self, method: &str) -> Vec<CapturedCall> {
        self.calls().into_iter().filter(|c| c.method() == method).collect()
    }
}

impl Drop for MockTelegram {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn bot_api_handler(
    State(state): State<MockState>,
    Path(path): Path<String>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    let call = CapturedCall { path, form };
    let method = call.method().to_string();
    let response = match method.as_str() {
        "getFile" => {
            let file_id = call.field("file_id").unwrap_or_default();
            if let Some(body) = state.file_bodies.get(file_id) {
                body.clone()
            } else if let Some(path) = state.file_paths.get(file_id) {
                json!({
                    "ok": true,
                    "result": { "file_id": file_id, "file_size": 1024, "file_path": path }
                })
            } else {
                json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: invalid file_id"
                })
            }
        }
        _ => {
            let fails = state
                .fail_value
                .as_deref()
                .is_some_and(|v| call.form.values().any(|f| f == v));
            if fails {
                json!({ "ok": false, "error_code": 400, "description": "Bad Request: chat not found" })
            } else {
                let id = state.next_message_id.fetch_add(1, Ordering::SeqCst);
                json!({ "ok": true, "result": { "message_id": id } })
            }
        }
    };
    state.calls.lock().expect("calls lock").push(call);
    Json(response)
}

/// Telegram channel configured with [`BOT_TOKEN`].
pub fn telegram_channel() -> Channel {
    channel_with_config(json!({ "auth_token": BOT_TOKEN }))
}

pub fn channel_with_config(config: Value) -> Channel {
    serde_json::from_value(json!({
        "uuid": CHANNEL_UUID,
        "channelType": "TG",
        "name": "Telegram",
        "address": "relay_bot",
        "config": config,
    }))
    .expect("channel json")
}

pub fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(5))
}

/// Webhook body with the given message fields merged over a plain text message from Nic.
pub fn update_body(message: Value) -> Vec<u8> {
    let mut msg = json!({
        "message_id": 41,
        "from": { "id": 3527065, "first_name": "Nic", "last_name": "Pottier", "username": "nicpottier" },
        "chat": { "id": 3527065, "type": "private" },
        "date": 1454119029
    });
    if let (Some(base), Some(extra)) = (msg.as_object_mut(), message.as_object()) {
        for (k, v) in extra {
            base.insert(k.clone(), v.clone());
        }
    }
    json!({ "update_id": 174114370, "message": msg })
        .to_string()
        .into_bytes()
}

pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind free port");
    listener.local_addr().expect("local_addr").port()
}
