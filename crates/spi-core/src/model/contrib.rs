//! A single edit by a user, live or deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Revision identifier, unique within one wiki.
pub type RevisionId = u64;

/// Display text used wherever a suppressed comment would appear.
pub const COMMENT_HIDDEN: &str = "<comment hidden>";

/// An edit summary.
///
/// A revision with no summary has `Visible("")`. `Hidden` means the summary
/// exists but was suppressed by revision deletion; the two are never
/// interchangeable. Serialized as a JSON string, or `null` when hidden.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Comment {
    Visible(String),
    Hidden,
}

impl Comment {
    /// The comment text, or `None` if suppressed.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Visible(text) => Some(text),
            Self::Hidden => None,
        }
    }

    /// Text for display: the comment itself or [`COMMENT_HIDDEN`].
    #[must_use]
    pub fn display_text(&self) -> &str {
        self.text().unwrap_or(COMMENT_HIDDEN)
    }

    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        matches!(self, Self::Hidden)
    }
}

impl From<Option<String>> for Comment {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Hidden, Self::Visible)
    }
}

impl From<Comment> for Option<String> {
    fn from(value: Comment) -> Self {
        match value {
            Comment::Visible(text) => Some(text),
            Comment::Hidden => None,
        }
    }
}

impl From<&str> for Comment {
    fn from(value: &str) -> Self {
        Self::Visible(value.to_string())
    }
}

/// One revision made by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub rev_id: RevisionId,
    pub timestamp: DateTime<Utc>,
    pub user_name: String,
    pub namespace: i32,
    /// Page title including the namespace prefix (e.g. `Talk:Foo`).
    pub title: String,
    pub comment: Comment,
    /// `false` for revisions only visible through the deleted-revisions log.
    #[serde(default = "default_live")]
    pub is_live: bool,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Contribution {
    /// Returns `true` if the contribution carries `tag`.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Tags joined for display, e.g. `"mobile edit, mw-reverted"`.
    #[must_use]
    pub fn joined_tags(&self) -> String {
        self.tags.join(", ")
    }
}

const fn default_live() -> bool {
    true
}
