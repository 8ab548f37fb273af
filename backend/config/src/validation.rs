//! Config validation: startup checks with user-friendly error messages.

use crate::schema::BotConfig;
use dutybot_core::{parse_time_zone, DutyError};
use thiserror::Error;

/// A config validation error with field path and message.
#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

/// A collection of validation errors found in one pass.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate the config and return a report of all errors and warnings.
pub fn validate(config: &BotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_credentials(config, &mut report);
    validate_http(config, &mut report);
    validate_rotation(config, &mut report);
    report
}

fn validate_credentials(config: &BotConfig, report: &mut ValidationReport) {
    if config.channel_secret.is_empty() {
        report.error(
            "channel_secret",
            "LINE channel secret is required (LINE_CHANNEL_SECRET)",
        );
    }
    if config.channel_access_token.is_empty() {
        report.error(
            "channel_access_token",
            "LINE channel access token is required (LINE_CHANNEL_ACCESS_TOKEN)",
        );
    }
}

fn validate_http(config: &BotConfig, report: &mut ValidationReport) {
    if config.port == 0 {
        report.error("port", "port must be between 1 and 65535");
    }
    if !config.webhook_path.starts_with('/') {
        report.error(
            "webhook_path",
            format!("webhook path '{}' must start with '/'", config.webhook_path),
        );
    }
    if !config.api_base_url.starts_with("https://") {
        report.warn(
            "api_base_url",
            format!("'{}' is not HTTPS; use only for local testing", config.api_base_url),
        );
    }
}

/// Roster and zone errors surface here rather than on the first message.
fn validate_rotation(config: &BotConfig, report: &mut ValidationReport) {
    if config.roster.is_empty() {
        report.error("roster", DutyError::EmptyRoster.to_string());
    }
    if let Err(err) = parse_time_zone(&config.time_zone) {
        report.error("time_zone", err.to_string());
    }
    if config.roster.len() > 53 {
        report.warn(
            "roster",
            "roster is longer than a year of ISO weeks; some names are never on duty",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> BotConfig {
        BotConfig {
            channel_secret: "secret".into(),
            channel_access_token: "token".into(),
            ..BotConfig::default()
        }
    }

    #[test]
    fn default_config_with_credentials_is_valid() {
        let report = validate(&valid_config());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn empty_roster_is_error() {
        let cfg = BotConfig {
            roster: Vec::new(),
            ..valid_config()
        };
        let report = validate(&cfg);
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "roster");
    }

    #[test]
    fn unknown_zone_is_error() {
        let cfg = BotConfig {
            time_zone: "Asia/Atlantis".into(),
            ..valid_config()
        };
        let report = validate(&cfg);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].message.contains("Asia/Atlantis"));
    }

    #[test]
    fn relative_webhook_path_is_error() {
        let cfg = BotConfig {
            webhook_path: "callback".into(),
            ..valid_config()
        };
        assert!(!validate(&cfg).is_valid());
    }

    #[test]
    fn plain_http_api_is_only_a_warning() {
        let cfg = BotConfig {
            api_base_url: "http://127.0.0.1:9999".into(),
            ..valid_config()
        };
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "api_base_url");
    }
}
