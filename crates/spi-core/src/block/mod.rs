//! Block and unblock events and point-in-time block queries.
//!
//! Two independent notions of "blocked" exist and are kept apart:
//!
//! - [`UserBlockHistory`] replays a chronological block log. The most recent
//!   entry at or before the query time decides, so an explicit unblock ends a
//!   block regardless of its expiry.
//! - [`BlockMap`] tests interval inclusion over `(start, expiry)` pairs taken
//!   straight from the block list API, which has no unblock records.

pub mod map;

pub use map::{ApiBlock, BlockMap, Expiry};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

/// Title shown for blocks with no finite expiry.
pub const INDEFINITE: &str = "indef";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors raised while constructing block events and histories.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// A finite expiry is earlier than the block itself.
    #[error("block expiry {expiry} precedes block start {timestamp}")]
    ExpiryBeforeStart {
        timestamp: DateTime<Utc>,
        expiry: DateTime<Utc>,
    },

    /// An expiry string is neither `infinity` nor an RFC 3339 instant.
    #[error("malformed block expiry {0:?}")]
    MalformedExpiry(String),

    /// Consecutive entries are not strictly increasing in time.
    #[error("block history out of order at index {index}: {current} does not follow {previous}")]
    OutOfOrder {
        index: usize,
        previous: DateTime<Utc>,
        current: DateTime<Utc>,
    },

    /// An entry is neither a block nor an unblock.
    #[error("unrecognized block log entry at index {index} (action {action:?})")]
    UnrecognizedEntry { index: usize, action: String },
}

impl BlockError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::ExpiryBeforeStart { .. } | Self::MalformedExpiry(_) => {
                ErrorCode::InvalidBlockExpiry
            }
            Self::OutOfOrder { .. } => ErrorCode::BlockHistoryOutOfOrder,
            Self::UnrecognizedEntry { .. } => ErrorCode::UnrecognizedBlockEntry,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// A block (or reblock) placed on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockEvent {
    target: String,
    timestamp: DateTime<Utc>,
    id: u64,
    expiry: Option<DateTime<Utc>>,
    is_reblock: bool,
}

impl BlockEvent {
    /// A new block. `expiry = None` means indefinite.
    ///
    /// # Errors
    ///
    /// [`BlockError::ExpiryBeforeStart`] if `expiry < timestamp`.
    pub fn new(
        target: impl Into<String>,
        timestamp: DateTime<Utc>,
        id: u64,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Self, BlockError> {
        Self::build(target.into(), timestamp, id, expiry, false)
    }

    /// A change to the settings of an existing block.
    ///
    /// # Errors
    ///
    /// [`BlockError::ExpiryBeforeStart`] if `expiry < timestamp`.
    pub fn reblock(
        target: impl Into<String>,
        timestamp: DateTime<Utc>,
        id: u64,
        expiry: Option<DateTime<Utc>>,
    ) -> Result<Self, BlockError> {
        Self::build(target.into(), timestamp, id, expiry, true)
    }

    fn build(
        target: String,
        timestamp: DateTime<Utc>,
        id: u64,
        expiry: Option<DateTime<Utc>>,
        is_reblock: bool,
    ) -> Result<Self, BlockError> {
        if let Some(expiry) = expiry
            && expiry < timestamp
        {
            return Err(BlockError::ExpiryBeforeStart { timestamp, expiry });
        }
        Ok(Self {
            target,
            timestamp,
            id,
            expiry,
            is_reblock,
        })
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub const fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expiry
    }

    #[must_use]
    pub const fn is_reblock(&self) -> bool {
        self.is_reblock
    }

    /// Expiry as RFC 3339, or [`INDEFINITE`].
    #[must_use]
    pub fn expiry_display(&self) -> String {
        self.expiry.map_or_else(
            || INDEFINITE.to_string(),
            |e| e.to_rfc3339_opts(SecondsFormat::Secs, true),
        )
    }
}

/// Removal of a block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnblockEvent {
    target: String,
    timestamp: DateTime<Utc>,
    id: u64,
}

impl UnblockEvent {
    #[must_use]
    pub fn new(target: impl Into<String>, timestamp: DateTime<Utc>, id: u64) -> Self {
        Self {
            target: target.into(),
            timestamp,
            id,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }
}

/// A block log entry whose action is not understood.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnrecognizedAction {
    pub target: String,
    pub timestamp: DateTime<Utc>,
    pub id: u64,
    pub action: String,
}

/// One entry of a user's block log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BlockLogEntry {
    Block(BlockEvent),
    Unblock(UnblockEvent),
    Unrecognized(UnrecognizedAction),
}

impl BlockLogEntry {
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Block(b) => b.timestamp,
            Self::Unblock(u) => u.timestamp,
            Self::Unrecognized(x) => x.timestamp,
        }
    }

    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Block(b) => &b.target,
            Self::Unblock(u) => &u.target,
            Self::Unrecognized(x) => &x.target,
        }
    }

    #[must_use]
    pub const fn id(&self) -> u64 {
        match self {
            Self::Block(b) => b.id,
            Self::Unblock(u) => u.id,
            Self::Unrecognized(x) => x.id,
        }
    }

    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl From<BlockEvent> for BlockLogEntry {
    fn from(value: BlockEvent) -> Self {
        Self::Block(value)
    }
}

impl From<UnblockEvent> for BlockLogEntry {
    fn from(value: UnblockEvent) -> Self {
        Self::Unblock(value)
    }
}

// ---------------------------------------------------------------------------
// Raw log records
// ---------------------------------------------------------------------------

/// A block log record as delivered by the wiki, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawBlockLogRecord {
    pub id: u64,
    pub target: String,
    pub timestamp: DateTime<Utc>,
    /// `block`, `reblock` or `unblock`; anything else is kept as unrecognized.
    pub action: String,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl TryFrom<RawBlockLogRecord> for BlockLogEntry {
    type Error = BlockError;

    fn try_from(raw: RawBlockLogRecord) -> Result<Self, Self::Error> {
        match raw.action.as_str() {
            "block" => BlockEvent::new(raw.target, raw.timestamp, raw.id, raw.expiry).map(Self::Block),
            "reblock" => {
                BlockEvent::reblock(raw.target, raw.timestamp, raw.id, raw.expiry).map(Self::Block)
            }
            "unblock" => Ok(Self::Unblock(UnblockEvent::new(
                raw.target,
                raw.timestamp,
                raw.id,
            ))),
            _ => {
                tracing::warn!(
                    id = raw.id,
                    target = %raw.target,
                    action = %raw.action,
                    "unknown block action"
                );
                Ok(Self::Unrecognized(UnrecognizedAction {
                    target: raw.target,
                    timestamp: raw.timestamp,
                    id: raw.id,
                    action: raw.action,
                }))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// UserBlockHistory
// ---------------------------------------------------------------------------

/// A validated, strictly chronological block log for one user.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserBlockHistory {
    entries: Vec<BlockLogEntry>,
}

impl UserBlockHistory {
    /// Build a history from entries ordered oldest first.
    ///
    /// # Errors
    ///
    /// [`BlockError::UnrecognizedEntry`] if any entry is neither a block nor
    /// an unblock; [`BlockError::OutOfOrder`] if timestamps are not strictly
    /// increasing.
    pub fn new(entries: Vec<BlockLogEntry>) -> Result<Self, BlockError> {
        for (index, entry) in entries.iter().enumerate() {
            if let BlockLogEntry::Unrecognized(x) = entry {
                return Err(BlockError::UnrecognizedEntry {
                    index,
                    action: x.action.clone(),
                });
            }
        }
        for (index, pair) in entries.windows(2).enumerate() {
            let (previous, current) = (pair[0].timestamp(), pair[1].timestamp());
            if current <= previous {
                return Err(BlockError::OutOfOrder {
                    index: index + 1,
                    previous,
                    current,
                });
            }
        }
        Ok(Self { entries })
    }

    /// Build a history from entries ordered newest first.
    ///
    /// # Errors
    ///
    /// Same as [`UserBlockHistory::new`] after reversing.
    pub fn from_newest_first(mut entries: Vec<BlockLogEntry>) -> Result<Self, BlockError> {
        entries.reverse();
        Self::new(entries)
    }

    #[must_use]
    pub fn entries(&self) -> &[BlockLogEntry] {
        &self.entries
    }

    /// Was the user blocked at `t`?
    ///
    /// The last entry with `timestamp <= t` decides; no such entry means not
    /// blocked. Entries are strictly increasing, so the last qualifying entry
    /// is found by binary search.
    #[must_use]
    pub fn is_blocked_at(&self, t: DateTime<Utc>) -> bool {
        let qualifying = self.entries.partition_point(|e| e.timestamp() <= t);
        qualifying
            .checked_sub(1)
            .is_some_and(|i| matches!(self.entries[i], BlockLogEntry::Block(_)))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
