//! Typed runtime configuration.

use std::path::PathBuf;

use serde::Serialize;

use dutybot_core::{DutyError, DutyRotation, Roster};

use crate::defaults;

/// dutybot runtime configuration.
#[derive(Debug, Clone, Serialize)]
pub struct BotConfig {
    /// HTTP server bind address
    pub bind_address: String,
    /// HTTP server port
    pub port: u16,

    // LINE Messaging API
    pub channel_secret: String,
    pub channel_access_token: String,
    pub webhook_path: String,
    pub api_base_url: String,

    // Duty rotation
    pub roster: Vec<String>,
    pub time_zone: String,

    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Directory for rolling NDJSON logs; console only when unset
    pub log_dir: Option<PathBuf>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bind_address: defaults::DEFAULT_BIND_ADDRESS.to_string(),
            port: defaults::DEFAULT_PORT,
            channel_secret: String::new(),
            channel_access_token: String::new(),
            webhook_path: defaults::DEFAULT_WEBHOOK_PATH.to_string(),
            api_base_url: defaults::DEFAULT_API_BASE_URL.to_string(),
            roster: defaults::default_roster(),
            time_zone: dutybot_core::DEFAULT_TIME_ZONE.to_string(),
            log_level: defaults::DEFAULT_LOG_LEVEL.to_string(),
            log_dir: None,
        }
    }
}

impl BotConfig {
    /// `bind_address:port`, ready for `TcpListener::bind`.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Build the duty rotation described by this config.
    pub fn rotation(&self) -> Result<DutyRotation, DutyError> {
        let roster = Roster::new(self.roster.iter().cloned())?;
        DutyRotation::with_defaults(roster, &self.time_zone)
    }
}
