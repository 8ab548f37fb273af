//! LINE Webhook Receiver
//!
//! Signature validation and deserialization of inbound payloads from the
//! LINE Messaging API.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

/// Header carrying `base64(HMAC-SHA256(channel_secret, body))`.
pub const SIGNATURE_HEADER: &str = "x-line-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("missing x-line-signature header")]
    Missing,
    #[error("signature is not valid base64")]
    Malformed,
    #[error("signature does not match request body")]
    Mismatch,
}

/// Check `signature` against the raw request body.
///
/// The comparison is constant-time (`Mac::verify_slice`).
pub fn verify_signature(secret: &str, signature: &str, body: &[u8]) -> Result<(), SignatureError> {
    let expected = STANDARD
        .decode(signature.trim())
        .map_err(|_| SignatureError::Malformed)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Mismatch)?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| SignatureError::Mismatch)
}

/// Compute the signature LINE would send for `body`.
pub fn sign_body(secret: &str, body: &[u8]) -> String {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(body);
    STANDARD.encode(mac.finalize().into_bytes())
}

// ---------------------------------------------------------------------------
// LINE wire types
// ---------------------------------------------------------------------------

/// Top-level webhook envelope: one request may carry several events.
#[derive(Debug, Deserialize)]
pub struct WebhookBatch {
    /// Bot user ID the events are addressed to.
    #[serde(default)]
    pub destination: String,
    pub events: Vec<WebhookEvent>,
}

/// A single webhook event. Only message events are acted on.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Message(MessageEvent),
    /// follow, unfollow, join, postback, ...
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageEvent {
    #[serde(rename = "replyToken")]
    pub reply_token: Option<String>,
    pub source: Option<EventSource>,
    /// Milliseconds since the epoch.
    pub timestamp: Option<i64>,
    pub message: MessageContent,
}

#[derive(Debug, Deserialize)]
pub struct EventSource {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "groupId")]
    pub group_id: Option<String>,
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
}

impl EventSource {
    /// Most specific conversation identifier available.
    pub fn conversation_id(&self) -> Option<&str> {
        self.group_id
            .as_deref()
            .or(self.room_id.as_deref())
            .or(self.user_id.as_deref())
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessageContent {
    Text {
        id: String,
        text: String,
    },
    Sticker {
        id: String,
        #[serde(rename = "packageId")]
        package_id: String,
        #[serde(rename = "stickerId")]
        sticker_id: String,
        #[serde(default)]
        keywords: Vec<String>,
    },
    /// image, video, audio, file, location, ...
    #[serde(other)]
    Other,
}

/// Decode a webhook request body.
pub fn parse_webhook(body: &[u8]) -> serde_json::Result<WebhookBatch> {
    serde_json::from_slice(body)
}
