//! Environment variable loading.
//!
//! Every setting comes from one variable. The LINE credentials also accept
//! the legacy `ChannelSecret` / `ChannelAccessToken` names so an existing
//! deployment keeps working without renaming its secrets.

use std::collections::HashMap;
use std::path::PathBuf;

use crate::defaults;
use crate::schema::BotConfig;

pub const ENV_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const ENV_CHANNEL_ACCESS_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const LEGACY_CHANNEL_SECRET: &str = "ChannelSecret";
pub const LEGACY_CHANNEL_ACCESS_TOKEN: &str = "ChannelAccessToken";
pub const ENV_PORT: &str = "PORT";
pub const ENV_BIND: &str = "DUTYBOT_BIND";
pub const ENV_ROSTER: &str = "DUTYBOT_ROSTER";
pub const ENV_TIME_ZONE: &str = "DUTYBOT_TIMEZONE";
pub const ENV_WEBHOOK_PATH: &str = "LINE_WEBHOOK_PATH";
pub const ENV_API_BASE_URL: &str = "LINE_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "RUST_LOG";
pub const ENV_LOG_DIR: &str = "DUTYBOT_LOG_DIR";

/// Error returned when a variable is set but cannot be interpreted.
#[derive(Debug, thiserror::Error)]
#[error("Invalid value {value:?} for env var \"{var_name}\": {reason}")]
pub struct EnvError {
    pub var_name: String,
    pub value: String,
    pub reason: String,
}

/// Load configuration from the process environment.
pub fn from_env() -> Result<BotConfig, EnvError> {
    from_env_with(&std::env::vars().collect())
}

/// Load configuration from a provided map (useful for testing).
///
/// Unset variables fall back to [`BotConfig::default`]. Missing credentials
/// are left empty here and reported by [`crate::validate`].
pub fn from_env_with(env: &HashMap<String, String>) -> Result<BotConfig, EnvError> {
    let get = |key: &str| env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty());
    let base = BotConfig::default();

    let port = match get(ENV_PORT) {
        Some(raw) => raw.parse::<u16>().map_err(|e| EnvError {
            var_name: ENV_PORT.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })?,
        None => base.port,
    };

    let roster = match get(ENV_ROSTER) {
        Some(raw) => parse_names(raw),
        None => base.roster,
    };

    Ok(BotConfig {
        bind_address: get(ENV_BIND).map_or(base.bind_address, str::to_string),
        port,
        channel_secret: get(ENV_CHANNEL_SECRET)
            .or_else(|| get(LEGACY_CHANNEL_SECRET))
            .unwrap_or_default()
            .to_string(),
        channel_access_token: get(ENV_CHANNEL_ACCESS_TOKEN)
            .or_else(|| get(LEGACY_CHANNEL_ACCESS_TOKEN))
            .unwrap_or_default()
            .to_string(),
        webhook_path: get(ENV_WEBHOOK_PATH).map_or(base.webhook_path, str::to_string),
        api_base_url: get(ENV_API_BASE_URL)
            .map_or(base.api_base_url, |url| url.trim_end_matches('/').to_string()),
        roster,
        time_zone: get(ENV_TIME_ZONE).map_or(base.time_zone, str::to_string),
        log_level: get(ENV_LOG_LEVEL).map_or(base.log_level, str::to_string),
        log_dir: get(ENV_LOG_DIR).map(PathBuf::from).or(base.log_dir),
    })
}

/// Split a comma-separated roster, trimming names and skipping blanks.
///
/// An all-blank list yields an empty roster, which validation rejects.
fn parse_names(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_when_unset() {
        let config = from_env_with(&HashMap::new()).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.webhook_path, "/callback");
        assert_eq!(config.time_zone, "Asia/Taipei");
        assert_eq!(config.roster, vec!["Ian", "Mark", "Lucas", "Ploking"]);
        assert!(config.channel_secret.is_empty());
        assert!(config.log_dir.is_none());
    }

    #[test]
    fn reads_primary_variables() {
        let config = from_env_with(&env(&[
            ("LINE_CHANNEL_SECRET", "s3cret"),
            ("LINE_CHANNEL_ACCESS_TOKEN", "tok"),
            ("PORT", "9000"),
            ("DUTYBOT_ROSTER", "Lucas, Ian ,Mark,,Ploking"),
            ("DUTYBOT_TIMEZONE", "Europe/Berlin"),
            ("LINE_API_BASE_URL", "http://localhost:3000/"),
            ("DUTYBOT_LOG_DIR", "/var/log/dutybot"),
        ]))
        .unwrap();
        assert_eq!(config.channel_secret, "s3cret");
        assert_eq!(config.channel_access_token, "tok");
        assert_eq!(config.port, 9000);
        assert_eq!(config.roster, vec!["Lucas", "Ian", "Mark", "Ploking"]);
        assert_eq!(config.time_zone, "Europe/Berlin");
        assert_eq!(config.api_base_url, "http://localhost:3000");
        assert_eq!(config.log_dir, Some(PathBuf::from("/var/log/dutybot")));
    }

    #[test]
    fn falls_back_to_legacy_credential_names() {
        let config = from_env_with(&env(&[
            ("ChannelSecret", "legacy-secret"),
            ("ChannelAccessToken", "legacy-token"),
        ]))
        .unwrap();
        assert_eq!(config.channel_secret, "legacy-secret");
        assert_eq!(config.channel_access_token, "legacy-token");
    }

    #[test]
    fn primary_name_wins_over_legacy() {
        let config = from_env_with(&env(&[
            ("ChannelSecret", "old"),
            ("LINE_CHANNEL_SECRET", "new"),
        ]))
        .unwrap();
        assert_eq!(config.channel_secret, "new");
    }

    #[test]
    fn invalid_port_is_an_error() {
        let err = from_env_with(&env(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(err.var_name, "PORT");
        assert!(err.to_string().contains("eighty"));
    }

    #[test]
    fn blank_roster_is_kept_empty_for_validation() {
        let config = from_env_with(&env(&[("DUTYBOT_ROSTER", " , ")])).unwrap();
        assert!(config.roster.is_empty());
    }
}
