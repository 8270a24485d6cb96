//! The wiki data source the analysis engines read from.
//!
//! [`WikiSource`] is the only way the engines see wiki data. Implementations
//! own transport and paging; every method returns whole lists.

pub mod fixture;

pub use fixture::{FixtureError, FixtureSource};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::block::BlockLogEntry;
use crate::error::ErrorCode;
use crate::model::{Contribution, LogEvent};

/// Errors raised by a [`WikiSource`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The caller lacks the right to read this data.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Any other upstream failure.
    #[error("upstream fetch failed: {0}")]
    Upstream(String),

    /// The name cannot be sent in a multi-valued request.
    #[error("invalid user name {0:?}: must not contain '|'")]
    InvalidUserName(String),
}

impl FetchError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::PermissionDenied(_) => ErrorCode::PermissionDenied,
            Self::Upstream(_) => ErrorCode::UpstreamFetchFailed,
            Self::InvalidUserName(_) => ErrorCode::InvalidUserName,
        }
    }
}

/// Read access to one wiki.
///
/// Order guarantees differ per method and are stated on each.
pub trait WikiSource {
    /// Live contributions by any of `user_names`, newest first.
    ///
    /// `end` is an inclusive lower bound on the timestamp.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidUserName`] for names containing `|`; otherwise
    /// whatever the upstream reports.
    fn user_contributions(
        &self,
        user_names: &[String],
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<Contribution>, FetchError>;

    /// Deleted contributions by `user_name`, in no particular order.
    ///
    /// # Errors
    ///
    /// [`FetchError::PermissionDenied`] when the caller cannot see deleted
    /// revisions.
    fn deleted_user_contributions(&self, user_name: &str)
    -> Result<Vec<Contribution>, FetchError>;

    /// Block log for `user_name`, newest first.
    ///
    /// # Errors
    ///
    /// Upstream failures.
    fn user_blocks(&self, user_name: &str) -> Result<Vec<BlockLogEntry>, FetchError>;

    /// Log events performed by `user_name`, in no particular order.
    ///
    /// # Errors
    ///
    /// Upstream failures.
    fn user_log_events(&self, user_name: &str) -> Result<Vec<LogEvent>, FetchError>;

    /// Revisions by any of `user_names` that created a page, newest first.
    ///
    /// # Errors
    ///
    /// [`FetchError::InvalidUserName`] for names containing `|`.
    fn page_creations(&self, user_names: &[String]) -> Result<Vec<Contribution>, FetchError>;

    /// Whether `title` currently exists.
    ///
    /// # Errors
    ///
    /// Upstream failures.
    fn page_exists(&self, title: &str) -> Result<bool, FetchError>;

    /// Up to `limit` revisions of `title`, newest first.
    ///
    /// # Errors
    ///
    /// Upstream failures.
    fn page_revisions(&self, title: &str, limit: usize) -> Result<Vec<Contribution>, FetchError>;
}

/// Reject user names that would corrupt a `|`-joined request parameter.
///
/// # Errors
///
/// [`FetchError::InvalidUserName`] naming the first offending entry.
pub fn validate_user_names(user_names: &[String]) -> Result<(), FetchError> {
    match user_names.iter().find(|name| name.contains('|')) {
        Some(bad) => Err(FetchError::InvalidUserName(bad.clone())),
        None => Ok(()),
    }
}

/// Turn a permission failure into an empty list.
///
/// Deleted revisions are only visible to privileged accounts; everyone else
/// still gets a timeline built from public data.
///
/// # Errors
///
/// Every [`FetchError`] other than `PermissionDenied` is passed through.
pub fn empty_if_denied<T>(
    result: Result<Vec<T>, FetchError>,
    user_name: &str,
) -> Result<Vec<T>, FetchError> {
    match result {
        Err(FetchError::PermissionDenied(reason)) => {
            warn!(user = user_name, %reason, "deleted contributions unavailable");
            Ok(Vec::new())
        }
        other => other,
    }
}
