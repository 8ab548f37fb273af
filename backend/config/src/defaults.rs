//! Config defaults.

/// Default HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";

/// Route the LINE console is pointed at.
pub const DEFAULT_WEBHOOK_PATH: &str = "/callback";

pub const DEFAULT_API_BASE_URL: &str = "https://api.line.me";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Roster used when `DUTYBOT_ROSTER` is unset.
pub const DEFAULT_ROSTER: &[&str] = &["Ian", "Mark", "Lucas", "Ploking"];

pub fn default_roster() -> Vec<String> {
    DEFAULT_ROSTER.iter().map(|name| name.to_string()).collect()
}
