pub mod error;
pub mod roster;
pub mod rotation;

pub use error::DutyError;
pub use roster::Roster;
pub use rotation::{
    parse_time_zone, DutyAssignment, DutyRotation, DutySnapshot, DEFAULT_TIME_ZONE,
    DEFAULT_TRIGGER_PHRASE,
};
