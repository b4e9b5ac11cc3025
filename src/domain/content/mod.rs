//! Content domain module.
//!
//! Posts, their moderation scores, and the rules that turn a score into a
//! moderation decision.

mod aggregate;
mod mentions;
mod scores;
mod status;

pub use aggregate::{ContentItem, ModerationUpdate};
pub use mentions::extract_mentions;
pub use scores::{
    ModerationVerdict, Recommendation, ScoreSnapshot, REJECT_THRESHOLD, REVIEW_THRESHOLD,
};
pub use status::{LifecycleStatus, ModerationStatus};
