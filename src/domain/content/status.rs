//! Moderation and lifecycle statuses for forum content.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Where a content item stands in automated moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    /// Submitted or edited, not yet scored.
    Pending,
    Approved,
    /// Held for a human moderator.
    Flagged,
    /// Removed by automated moderation. Always paired with `LifecycleStatus::Deleted`.
    Rejected,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Flagged => "flagged",
            ModerationStatus::Rejected => "rejected",
        }
    }

    /// True once a scoring job has produced a decision.
    pub fn is_decided(&self) -> bool {
        !matches!(self, ModerationStatus::Pending)
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "flagged" => Ok(ModerationStatus::Flagged),
            "rejected" => Ok(ModerationStatus::Rejected),
            other => Err(ValidationError::invalid_format(
                "moderation_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Visibility of a content item or thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleStatus {
    Active,
    Deleted,
}

impl LifecycleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStatus::Active => "active",
            LifecycleStatus::Deleted => "deleted",
        }
    }
}

impl fmt::Display for LifecycleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LifecycleStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LifecycleStatus::Active),
            "deleted" => Ok(LifecycleStatus::Deleted),
            other => Err(ValidationError::invalid_format(
                "lifecycle_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
