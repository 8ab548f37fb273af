//! Config redaction: produce safe-to-log config snapshots by masking secrets.

use serde_json::Value;

use crate::schema::BotConfig;

/// Field names whose values are never shown in full.
static SENSITIVE_KEYS: &[&str] = &[
    "channel_secret",
    "channel_access_token",
    "token",
    "secret",
    "password",
];

/// Serialize `config` with every sensitive field masked.
///
/// Non-empty secrets keep their first four characters as a hint.
pub fn redact(config: &BotConfig) -> Value {
    match serde_json::to_value(config) {
        Ok(value) => redact_value(&value, ""),
        Err(_) => Value::Null,
    }
}

fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if is_sensitive_key(key) && !s.is_empty() {
        let hint = if s.chars().count() > 8 {
            format!("{}***", s.chars().take(4).collect::<String>())
        } else {
            "***".to_string()
        };
        return Value::String(hint);
    }
    Value::String(s.to_string())
}

fn redact_value(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_value(v, key)).collect()),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                result.insert(k.clone(), redact_value(v, k));
            }
            Value::Object(result)
        }
        other => other.clone(),
    }
}
