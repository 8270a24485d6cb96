use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user-visible log entry (account creation, page move, ...).
///
/// `title`, `action` and `comment` are `None` when suppressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub id: u64,
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    #[serde(default)]
    pub title: Option<String>,
    /// Log type, e.g. `newusers`.
    #[serde(rename = "type")]
    pub log_type: String,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}
