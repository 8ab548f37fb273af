use thiserror::Error;

/// Errors raised while assembling the duty rotation.
///
/// All of these are startup-time conditions: once a [`crate::DutyRotation`]
/// exists, answering a message cannot fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DutyError {
    #[error("duty roster must contain at least one name")]
    EmptyRoster,

    #[error("unknown reference time zone: {name}")]
    UnknownTimeZone { name: String },

    #[error("trigger phrase must not be empty")]
    EmptyTrigger,
}
