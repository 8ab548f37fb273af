use std::fmt;

use serde::Serialize;

use crate::error::DutyError;

/// Ordered list of people who take turns being on duty, one per ISO week.
///
/// Always non-empty. Names are kept verbatim and may repeat; a repeated name
/// simply takes more than one slot in the rotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Roster(Vec<String>);

impl Roster {
    pub fn new<I, S>(names: I) -> Result<Self, DutyError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(DutyError::EmptyRoster);
        }
        Ok(Self(names))
    }

    /// Parse a comma-separated list such as `"Ian, Mark,Lucas"`.
    ///
    /// Surrounding whitespace is trimmed and blank entries are skipped, so
    /// `"Ian,,Mark,"` yields two names.
    pub fn parse_list(raw: &str) -> Result<Self, DutyError> {
        Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty()),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Name at `index`, which must be below [`Roster::len`].
    pub fn name(&self, index: usize) -> &str {
        &self.0[index]
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for Roster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_roster() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(Roster::new(empty), Err(DutyError::EmptyRoster));
    }

    #[test]
    fn keeps_order_and_duplicates() {
        let roster = Roster::new(["Ian", "Mark", "Ian"]).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.name(0), "Ian");
        assert_eq!(roster.name(2), "Ian");
    }

    #[test]
    fn parses_comma_separated_list() {
        let roster = Roster::parse_list(" Ian, Mark ,,Lucas ,").unwrap();
        assert_eq!(roster.names(), &["Ian", "Mark", "Lucas"]);
        assert_eq!(roster.to_string(), "Ian, Mark, Lucas");
    }

    #[test]
    fn blank_list_is_rejected() {
        assert_eq!(Roster::parse_list(" , ,"), Err(DutyError::EmptyRoster));
        assert_eq!(Roster::parse_list(""), Err(DutyError::EmptyRoster));
    }
}
