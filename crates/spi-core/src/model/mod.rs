//! Wiki record types consumed by the analysis engines.

pub mod case;
pub mod contrib;
pub mod log_event;

pub use case::{CaseError, IpSummary, SpiIpInfo, SpiUserInfo};
pub use contrib::{COMMENT_HIDDEN, Comment, Contribution, RevisionId};
pub use log_event::LogEvent;
