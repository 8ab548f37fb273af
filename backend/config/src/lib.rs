//! `dutybot-config`: dutybot runtime configuration.
//!
//! Provides:
//! - Typed config schema (LINE credentials, HTTP binding, duty rotation, logging)
//! - Environment loading with legacy variable names
//! - Default values
//! - Startup validation with a full error report
//! - Config redaction for safe logging/display

pub mod defaults;
pub mod env;
pub mod redact;
pub mod schema;
pub mod validation;

pub use env::{from_env, from_env_with, EnvError};
pub use redact::redact;
pub use schema::BotConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use std::collections::HashMap;

use anyhow::{bail, Result};

/// Read and validate configuration from an explicit variable map.
pub fn load_from_env_with(env: &HashMap<String, String>) -> Result<BotConfig> {
    ensure_valid(from_env_with(env)?)
}

/// Validate an already-loaded config, logging every finding.
///
/// This is the startup gate: any validation error aborts before the HTTP
/// listener is bound. Returns the config unchanged when there are no errors.
pub fn ensure_valid(config: BotConfig) -> Result<BotConfig> {
    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }

    if !report.is_valid() {
        let details: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", details.join("\n  "));
    }

    Ok(config)
}
