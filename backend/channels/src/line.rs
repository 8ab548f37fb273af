/// LINE adapter: receives webhook events from the LINE Messaging API and
/// answers duty-rotation triggers through the Reply API.
///
/// Every text message is passed to the [`DutyRotation`]; a `Some` result is
/// sent back on the event's reply token. Replies are best effort: a failed
/// send is logged and the webhook still answers 200 so LINE does not
/// redeliver.
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use chrono::{DateTime, Utc};
use tracing::{debug, error, info, warn};

use dutybot_core::DutyRotation;
use dutybot_logging::{BotEvent, EventLogger};

use crate::ChannelAdapter;
use crate::line_receive::{
    MessageContent, MessageEvent, SIGNATURE_HEADER, SignatureError, WebhookEvent, parse_webhook,
    verify_signature,
};
use crate::line_send::MessagingApi;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct LineConfig {
    pub channel_secret: String,
    pub webhook_path: String,
}

/// Source of "now" for week computation.
pub type Clock = fn() -> DateTime<Utc>;

// ---------------------------------------------------------------------------
// Axum state
// ---------------------------------------------------------------------------

/// Read-only state shared by every webhook request.
pub struct DispatcherState {
    channel_secret: String,
    rotation: DutyRotation,
    api: Arc<dyn MessagingApi>,
    clock: Clock,
}

impl DispatcherState {
    pub fn new(channel_secret: impl Into<String>, rotation: DutyRotation, api: Arc<dyn MessagingApi>) -> Self {
        Self {
            channel_secret: channel_secret.into(),
            rotation,
            api,
            clock: Utc::now,
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

// ---------------------------------------------------------------------------
// Adapter struct
// ---------------------------------------------------------------------------

pub struct LineAdapter {
    config: LineConfig,
    state: Arc<DispatcherState>,
}

impl LineAdapter {
    pub fn new(config: LineConfig, rotation: DutyRotation, api: Arc<dyn MessagingApi>) -> Self {
        let state = Arc::new(DispatcherState::new(config.channel_secret.clone(), rotation, api));
        Self { config, state }
    }
}

// ---------------------------------------------------------------------------
// Webhook handler
// ---------------------------------------------------------------------------

pub async fn webhook_handler(
    State(state): State<Arc<DispatcherState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    // 1. Verify the signature over the raw body before touching its contents.
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let verified = if signature.is_empty() {
        Err(SignatureError::Missing)
    } else {
        verify_signature(&state.channel_secret, signature, &body)
    };
    if let Err(err) = verified {
        warn!(error = %err, "[LINE] Rejecting webhook");
        return StatusCode::UNAUTHORIZED;
    }

    // 2. Parse the event batch.
    let batch = match parse_webhook(&body) {
        Ok(b) => b,
        Err(err) => {
            error!(error = %err, "[LINE] Failed to parse webhook body");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    };

    info!(
        destination = %batch.destination,
        events = batch.events.len(),
        "[LINE] Webhook received"
    );

    // 3. Dispatch each event in order.
    for event in batch.events {
        dispatch_event(&state, event).await;
    }

    StatusCode::OK
}

async fn dispatch_event(state: &DispatcherState, event: WebhookEvent) {
    let WebhookEvent::Message(message_event) = event else {
        debug!("[LINE] Ignoring non-message event");
        return;
    };
    let MessageEvent {
        reply_token,
        source,
        message,
        ..
    } = message_event;

    match message {
        MessageContent::Text { id, text } => {
            let conversation = source
                .as_ref()
                .and_then(|s| s.conversation_id())
                .unwrap_or("unknown");
            debug!(message_id = %id, conversation, "[LINE] Text message");
            handle_text(state, reply_token.as_deref(), id, text).await;
        }
        MessageContent::Sticker {
            id,
            package_id,
            sticker_id,
            keywords,
        } => {
            EventLogger::log_event(BotEvent::StickerReceived {
                message_id: id,
                package_id,
                sticker_id,
                keywords: keywords.join(","),
            });
        }
        MessageContent::Other => {
            debug!("[LINE] Ignoring unsupported message type");
        }
    }
}

/// Answer one text message and record the remaining message quota.
///
/// The quota lookup runs alongside the reply and its failure never stops it.
async fn handle_text(state: &DispatcherState, reply_token: Option<&str>, message_id: String, text: String) {
    let reply = state.rotation.respond(&text, (state.clock)());

    let send_reply = async {
        let (Some(reply), Some(token)) = (reply.as_deref(), reply_token) else {
            if reply.is_some() {
                warn!(message_id = %message_id, "[LINE] Trigger matched but event has no reply token");
            }
            return;
        };
        match state.api.reply_text(token, reply).await {
            Ok(()) => {
                EventLogger::log_event(BotEvent::ReplySent {
                    message_id: message_id.clone(),
                });
            }
            Err(err) => {
                error!(message_id = %message_id, error = %err, "[LINE] Reply failed");
                EventLogger::log_event(BotEvent::ReplyFailed {
                    message_id: message_id.clone(),
                    error_msg: err.to_string(),
                });
            }
        }
    };

    let (quota, ()) = tokio::join!(state.api.message_quota(), send_reply);

    let quota_remaining = match quota {
        Ok(quota) => quota.remaining(),
        Err(err) => {
            warn!(error = %err, "[LINE] Quota query failed");
            None
        }
    };

    EventLogger::log_event(BotEvent::TextReceived {
        message_id,
        text,
        quota_remaining,
    });
}

// ---------------------------------------------------------------------------
// ChannelAdapter impl
// ---------------------------------------------------------------------------

#[async_trait]
impl ChannelAdapter for LineAdapter {
    fn name(&self) -> &str {
        "line"
    }

    fn build_router(&self) -> Router {
        Router::new()
            .route(&self.config.webhook_path, post(webhook_handler))
            .with_state(Arc::clone(&self.state))
    }

    /// Probe the quota endpoint once so bad credentials show up in the
    /// startup logs rather than on the first message.
    async fn start(&self) -> Result<()> {
        match self.state.api.message_quota().await {
            Ok(quota) => info!(
                limit = ?quota.limit,
                total_usage = quota.total_usage,
                "[LINE] Credentials accepted"
            ),
            Err(err) => warn!(error = %err, "[LINE] Quota probe failed; replies may fail"),
        }
        info!(path = %self.config.webhook_path, "[LINE] Adapter ready");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line_receive::sign_body;
    use crate::line_send::{LineApiError, MessageQuota};
    use chrono::TimeZone;
    use dutybot_core::{DEFAULT_TRIGGER_PHRASE, Roster};
    use std::sync::Mutex;

    const SECRET: &str = "channel-secret";

    #[derive(Default)]
    struct FakeApi {
        replies: Mutex<Vec<(String, String)>>,
        quota_calls: Mutex<u32>,
        fail_quota: bool,
        fail_reply: bool,
    }

    #[async_trait]
    impl MessagingApi for FakeApi {
        async fn reply_text(&self, reply_token: &str, text: &str) -> Result<(), LineApiError> {
            if self.fail_reply {
                return Err(LineApiError::Status {
                    status: 400,
                    body: "Invalid reply token".into(),
                });
            }
            self.replies
                .lock()
                .unwrap()
                .push((reply_token.to_string(), text.to_string()));
            Ok(())
        }

        async fn message_quota(&self) -> Result<MessageQuota, LineApiError> {
            *self.quota_calls.lock().unwrap() += 1;
            if self.fail_quota {
                return Err(LineApiError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            Ok(MessageQuota {
                limit: Some(500),
                total_usage: 20,
            })
        }
    }

    fn week_ten() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 6, 4, 0, 0).unwrap()
    }

    fn state(api: Arc<FakeApi>) -> Arc<DispatcherState> {
        let roster = Roster::new(["Lucas", "Ian", "Mark", "Ploking"]).unwrap();
        let rotation = DutyRotation::with_defaults(roster, "Asia/Taipei").unwrap();
        Arc::new(DispatcherState::new(SECRET, rotation, api).with_clock(week_ten))
    }

    fn text_body(text: &str) -> String {
        serde_json::json!({
            "destination": "Ubot",
            "events": [{
                "type": "message",
                "replyToken": "reply-1",
                "source": {"type": "user", "userId": "U1"},
                "timestamp": 1709697600000i64,
                "message": {"type": "text", "id": "m1", "text": text}
            }]
        })
        .to_string()
    }

    fn signed(body: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(SIGNATURE_HEADER, sign_body(SECRET, body.as_bytes()).parse().unwrap());
        headers
    }

    async fn deliver(state: Arc<DispatcherState>, headers: HeaderMap, body: String) -> StatusCode {
        webhook_handler(State(state), headers, Bytes::from(body)).await
    }

    #[tokio::test]
    async fn replies_to_trigger_phrase() {
        let api = Arc::new(FakeApi::default());
        let body = text_body(&format!("{DEFAULT_TRIGGER_PHRASE}!!"));
        let status = deliver(state(api.clone()), signed(&body), body).await;

        assert_eq!(status, StatusCode::OK);
        let replies = api.replies.lock().unwrap();
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].0, "reply-1");
        assert!(replies[0].1.contains("第10週"));
        assert!(replies[0].1.contains("Mark"));
        assert!(replies[0].1.contains("Ian"));
        assert_eq!(*api.quota_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn stays_silent_without_trigger() {
        let api = Arc::new(FakeApi::default());
        let body = text_body("good morning 恭喜發財");
        let status = deliver(state(api.clone()), signed(&body), body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(api.replies.lock().unwrap().is_empty());
        // Quota is still queried for every text message.
        assert_eq!(*api.quota_calls.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn quota_failure_does_not_block_reply() {
        let api = Arc::new(FakeApi {
            fail_quota: true,
            ..FakeApi::default()
        });
        let body = text_body(DEFAULT_TRIGGER_PHRASE);
        let status = deliver(state(api.clone()), signed(&body), body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(api.replies.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reply_failure_still_acknowledges() {
        let api = Arc::new(FakeApi {
            fail_reply: true,
            ..FakeApi::default()
        });
        let body = text_body(DEFAULT_TRIGGER_PHRASE);
        let status = deliver(state(api.clone()), signed(&body), body).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn rejects_bad_or_missing_signature() {
        let api = Arc::new(FakeApi::default());
        let body = text_body(DEFAULT_TRIGGER_PHRASE);

        let status = deliver(state(api.clone()), HeaderMap::new(), body.clone()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let mut forged = HeaderMap::new();
        forged.insert(SIGNATURE_HEADER, sign_body("wrong", body.as_bytes()).parse().unwrap());
        let status = deliver(state(api.clone()), forged, body).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        assert!(api.replies.lock().unwrap().is_empty());
        assert_eq!(*api.quota_calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_server_error() {
        let api = Arc::new(FakeApi::default());
        let body = "{\"events\": 42}".to_string();
        let status = deliver(state(api), signed(&body), body).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn stickers_and_other_events_get_no_reply() {
        let api = Arc::new(FakeApi::default());
        let body = serde_json::json!({
            "destination": "Ubot",
            "events": [
                {
                    "type": "message",
                    "replyToken": "r1",
                    "message": {
                        "type": "sticker", "id": "s1", "packageId": "446",
                        "stickerId": "1988", "keywords": ["Happy"]
                    }
                },
                {"type": "follow", "replyToken": "r2"},
                {"type": "message", "replyToken": "r3", "message": {"type": "image", "id": "i1"}}
            ]
        })
        .to_string();
        let status = deliver(state(api.clone()), signed(&body), body).await;

        assert_eq!(status, StatusCode::OK);
        assert!(api.replies.lock().unwrap().is_empty());
        assert_eq!(*api.quota_calls.lock().unwrap(), 0);
    }
}
