//! Bot Event Logger
//!
//! Structured records for each inbound message and outbound reply, emitted
//! under the `bot_events` target so they can be filtered apart from
//! operational logs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    TextReceived {
        message_id: String,
        text: String,
        /// Outbound messages left this month, when the quota query succeeded.
        quota_remaining: Option<i64>,
    },
    StickerReceived {
        message_id: String,
        package_id: String,
        sticker_id: String,
        keywords: String,
    },
    ReplySent {
        message_id: String,
    },
    ReplyFailed {
        message_id: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: BotEvent,
}

pub struct EventLogger;

impl EventLogger {
    /// Redacts free-text fields and writes the event to the tracing system.
    pub fn log_event(mut event: BotEvent) -> EventLogEntry {
        match &mut event {
            BotEvent::TextReceived { text, .. } => {
                *text = redact_sensitive_data(text);
            }
            BotEvent::ReplyFailed { error_msg, .. } => {
                *error_msg = redact_sensitive_data(error_msg);
            }
            BotEvent::StickerReceived { .. } | BotEvent::ReplySent { .. } => {}
        }

        let entry = EventLogEntry {
            timestamp: Utc::now(),
            event,
        };

        let payload = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: "bot_events", event = %payload, "Bot event");
        entry
    }
}
