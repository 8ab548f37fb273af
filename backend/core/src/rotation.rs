//! Weekly duty rotation.
//!
//! Each ISO-8601 week of the reference time zone maps to one roster slot:
//! `week mod len`. The person before them in the roster is "last week's"
//! owner, wrapping from the first slot to the last.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::debug;

use crate::error::DutyError;
use crate::roster::Roster;

/// Phrase that must open a message for the bot to answer.
pub const DEFAULT_TRIGGER_PHRASE: &str = "恭喜發財";

/// IANA name of the zone whose calendar decides the week number.
pub const DEFAULT_TIME_ZONE: &str = "Asia/Taipei";

/// Resolve an IANA zone name such as `"Asia/Taipei"`.
pub fn parse_time_zone(name: &str) -> Result<Tz, DutyError> {
    name.parse::<Tz>().map_err(|_| DutyError::UnknownTimeZone {
        name: name.to_string(),
    })
}

/// Roster slots selected for a given week.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyAssignment {
    pub current: usize,
    pub previous: usize,
}

impl DutyAssignment {
    /// Slots for ISO week `week` over a roster of `roster_len` names.
    ///
    /// `roster_len` must be non-zero; [`Roster`] guarantees that.
    pub fn for_week(week: u32, roster_len: usize) -> Self {
        let current = week as usize % roster_len;
        let previous = (current + roster_len - 1) % roster_len;
        Self { current, previous }
    }
}

/// Resolved week number and owner names at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DutySnapshot {
    pub week: u32,
    pub on_duty: String,
    pub previous: String,
}

/// The rotation responder: roster, trigger phrase and reference zone,
/// fixed once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct DutyRotation {
    roster: Roster,
    trigger: String,
    time_zone: Tz,
}

impl DutyRotation {
    pub fn new(roster: Roster, trigger: impl Into<String>, time_zone: Tz) -> Result<Self, DutyError> {
        let trigger = trigger.into();
        if trigger.is_empty() {
            return Err(DutyError::EmptyTrigger);
        }
        Ok(Self {
            roster,
            trigger,
            time_zone,
        })
    }

    /// Rotation with the stock trigger phrase in the named zone.
    pub fn with_defaults(roster: Roster, time_zone: &str) -> Result<Self, DutyError> {
        Self::new(roster, DEFAULT_TRIGGER_PHRASE, parse_time_zone(time_zone)?)
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn trigger(&self) -> &str {
        &self.trigger
    }

    pub fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// ISO week number of `now` in the reference zone.
    pub fn week_number(&self, now: DateTime<Utc>) -> u32 {
        now.with_timezone(&self.time_zone).iso_week().week()
    }

    pub fn snapshot_at(&self, now: DateTime<Utc>) -> DutySnapshot {
        let week = self.week_number(now);
        let slots = DutyAssignment::for_week(week, self.roster.len());
        DutySnapshot {
            week,
            on_duty: self.roster.name(slots.current).to_string(),
            previous: self.roster.name(slots.previous).to_string(),
        }
    }

    /// `true` when `text` opens with the trigger phrase (exact, case-sensitive).
    pub fn matches(&self, text: &str) -> bool {
        text.starts_with(self.trigger.as_str())
    }

    /// Reply for an inbound text, or `None` when the trigger is absent.
    pub fn respond(&self, text: &str, now: DateTime<Utc>) -> Option<String> {
        if !self.matches(text) {
            return None;
        }
        let snapshot = self.snapshot_at(now);
        debug!(
            week = snapshot.week,
            on_duty = %snapshot.on_duty,
            previous = %snapshot.previous,
            "Trigger phrase matched"
        );
        Some(format_reply(&snapshot))
    }
}

fn format_reply(snapshot: &DutySnapshot) -> String {
    format!(
        "這週是第{}週，應該是{}要買喔。{}上週的對獎了沒！？",
        snapshot.week, snapshot.on_duty, snapshot.previous
    )
}
