//! Interval-inclusion block lookups over block list records.
//!
//! The block list API reports `(start, expiry)` pairs only. Unblocks are not
//! represented, so a lifted block still counts for its whole interval here.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{BlockError, BlockLogEntry};

/// Expiry as the block list API reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The API string `infinity`.
    Infinite,
    At(DateTime<Utc>),
}

impl Expiry {
    /// Latest instant covered by the block.
    #[must_use]
    pub const fn end(self) -> DateTime<Utc> {
        match self {
            Self::Infinite => DateTime::<Utc>::MAX_UTC,
            Self::At(t) => t,
        }
    }
}

impl FromStr for Expiry {
    type Err = BlockError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "infinity" {
            return Ok(Self::Infinite);
        }
        DateTime::parse_from_rfc3339(s)
            .map(|t| Self::At(t.with_timezone(&Utc)))
            .map_err(|_| BlockError::MalformedExpiry(s.to_string()))
    }
}

impl From<Option<DateTime<Utc>>> for Expiry {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(Self::Infinite, Self::At)
    }
}

impl Serialize for Expiry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Infinite => serializer.serialize_str("infinity"),
            Self::At(t) => t.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Expiry {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One record from the block list API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiBlock {
    pub timestamp: DateTime<Utc>,
    pub expiry: Expiry,
}

/// Block intervals for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockMap {
    intervals: Vec<(DateTime<Utc>, DateTime<Utc>)>,
}

impl BlockMap {
    #[must_use]
    pub fn new(blocks: &[ApiBlock]) -> Self {
        let intervals = blocks
            .iter()
            .map(|b| (b.timestamp, b.expiry.end()))
            .collect();
        Self { intervals }
    }

    /// Intervals from the block entries of a log. Unblocks are ignored.
    #[must_use]
    pub fn from_entries(entries: &[BlockLogEntry]) -> Self {
        let blocks: Vec<ApiBlock> = entries
            .iter()
            .filter_map(|entry| match entry {
                BlockLogEntry::Block(b) => Some(ApiBlock {
                    timestamp: b.timestamp(),
                    expiry: Expiry::from(b.expiry()),
                }),
                BlockLogEntry::Unblock(_) | BlockLogEntry::Unrecognized(_) => None,
            })
            .collect();
        Self::new(&blocks)
    }

    /// True if any interval contains `t`, both ends inclusive.
    #[must_use]
    pub fn is_blocked_at(&self, t: DateTime<Utc>) -> bool {
        self.intervals
            .iter()
            .any(|&(start, end)| start <= t && t <= end)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}
