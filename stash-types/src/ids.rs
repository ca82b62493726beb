//! Record identifiers.
//!
//! Ids are assigned by the storage engine from an auto-increment counter and
//! are never reused within a table.

use crate::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Surrogate key of a persisted record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    /// Wraps a raw store-assigned key.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw key.
    #[must_use]
    pub const fn get(&self) -> i64 {
        self.0
    }

    /// Parses a record id from a string, rejecting non-positive keys.
    pub fn parse(s: &str) -> Result<Self, Error> {
        s.parse()
    }
}

impl From<i64> for RecordId {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidRecordId(s.to_string()))?;
        if raw <= 0 {
            return Err(Error::InvalidRecordId(s.to_string()));
        }
        Ok(Self(raw))
    }
}
