//! Structured logging for dutybot.
//!
//! Handles subscriber setup (JSON console plus optional rolling NDJSON file),
//! redaction of tokens and phone numbers, and typed bot event records.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{BotEvent, EventLogEntry, EventLogger};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
