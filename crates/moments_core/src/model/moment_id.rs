//! Sortable moment identifiers.
//!
//! # Responsibility
//! - Validate and format the string id that doubles as a directory name.
//!
//! # Invariants
//! - Format is `<13-digit epoch ms>` or `<13-digit epoch ms>-<4-digit seq>`.
//! - Byte-wise string order equals creation order, so derived `Ord` is the
//!   chronological order.
//! - Sequence `0` is always rendered in the bare form, which is also the
//!   shape legacy records were written with.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static MOMENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{13}(?:-[0-9]{4})?$").expect("valid moment id regex"));

const TIMESTAMP_DIGITS: usize = 13;

/// Largest timestamp that still fits the fixed 13-digit prefix.
pub const MAX_TIMESTAMP_MS: i64 = 9_999_999_999_999;
/// Largest tie-breaker that fits the 4-digit suffix.
pub const MAX_SEQUENCE: u16 = 9_999;

/// Validation errors for moment ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Text does not match the id grammar.
    Malformed(String),
    /// Timestamp is negative or wider than 13 digits.
    TimestampOutOfRange(i64),
    /// Tie-breaker wider than 4 digits.
    SequenceOutOfRange(u32),
}

impl Display for IdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(value) => write!(f, "malformed moment id `{value}`"),
            Self::TimestampOutOfRange(value) => {
                write!(f, "moment id timestamp out of range: {value}")
            }
            Self::SequenceOutOfRange(value) => {
                write!(f, "moment id sequence out of range: {value}")
            }
        }
    }
}

impl Error for IdError {}

/// Stable, sortable identifier of one moment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MomentId(String);

impl MomentId {
    /// Parses and validates an id string.
    pub fn parse(value: &str) -> Result<Self, IdError> {
        if MOMENT_ID_RE.is_match(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(IdError::Malformed(value.to_string()))
        }
    }

    /// Builds an id from a millisecond timestamp and a same-millisecond
    /// tie-breaker.
    pub fn from_parts(timestamp_ms: i64, sequence: u32) -> Result<Self, IdError> {
        if !(0..=MAX_TIMESTAMP_MS).contains(&timestamp_ms) {
            return Err(IdError::TimestampOutOfRange(timestamp_ms));
        }
        if sequence > u32::from(MAX_SEQUENCE) {
            return Err(IdError::SequenceOutOfRange(sequence));
        }
        let raw = if sequence == 0 {
            format!("{timestamp_ms:013}")
        } else {
            format!("{timestamp_ms:013}-{sequence:04}")
        };
        Ok(Self(raw))
    }

    /// Epoch-millisecond part of the id.
    pub fn timestamp_ms(&self) -> i64 {
        self.0[..TIMESTAMP_DIGITS].parse().unwrap_or_default()
    }

    /// Tie-breaker part of the id (`0` for the bare form).
    pub fn sequence(&self) -> u32 {
        self.0
            .get(TIMESTAMP_DIGITS + 1..)
            .and_then(|seq| seq.parse().ok())
            .unwrap_or(0)
    }

    /// Borrowed wire form; also the record's directory name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MomentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for MomentId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<MomentId> for String {
    fn from(value: MomentId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::{IdError, MomentId};

    #[test]
    fn parse_accepts_bare_and_suffixed_forms() {
        let bare = MomentId::parse("1700000000000").unwrap();
        assert_eq!(bare.timestamp_ms(), 1_700_000_000_000);
        assert_eq!(bare.sequence(), 0);

        let suffixed = MomentId::parse("1700000000000-0042").unwrap();
        assert_eq!(suffixed.timestamp_ms(), 1_700_000_000_000);
        assert_eq!(suffixed.sequence(), 42);
    }

    #[test]
    fn parse_rejects_hidden_and_short_names() {
        for value in [".staging-abc", "170000000000", "1700000000000-1", "abc", ""] {
            assert!(
                matches!(MomentId::parse(value), Err(IdError::Malformed(_))),
                "`{value}` should be rejected"
            );
        }
    }

    #[test]
    fn order_follows_creation_order() {
        let first = MomentId::from_parts(1_700_000_000_000, 0).unwrap();
        let second = MomentId::from_parts(1_700_000_000_000, 1).unwrap();
        let third = MomentId::from_parts(1_700_000_000_000, 9_999).unwrap();
        let fourth = MomentId::from_parts(1_700_000_000_001, 0).unwrap();
        assert!(first < second);
        assert!(second < third);
        assert!(third < fourth);
    }

    #[test]
    fn from_parts_rejects_out_of_range_values() {
        assert_eq!(
            MomentId::from_parts(-1, 0).unwrap_err(),
            IdError::TimestampOutOfRange(-1)
        );
        assert_eq!(
            MomentId::from_parts(1, 10_000).unwrap_err(),
            IdError::SequenceOutOfRange(10_000)
        );
    }
}
