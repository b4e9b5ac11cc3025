//! Review tickets opened for human moderators.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::content::ModerationVerdict;
use crate::domain::foundation::{
    ContentId, StateMachine, TicketId, Timestamp, UserId, ValidationError,
};

/// What a ticket is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ReportTarget {
    Content(ContentId),
    User(UserId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketCategory {
    Spam,
    Harassment,
    Inappropriate,
    Misinformation,
    Other,
}

impl TicketCategory {
    /// Category for an automatically opened ticket: spam wins over
    /// harassment, anything else is filed as inappropriate.
    pub fn from_verdict(verdict: &ModerationVerdict) -> Self {
        if verdict.scores.is_spam() {
            TicketCategory::Spam
        } else if verdict.scores.is_toxic() {
            TicketCategory::Harassment
        } else {
            TicketCategory::Inappropriate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Spam => "spam",
            TicketCategory::Harassment => "harassment",
            TicketCategory::Inappropriate => "inappropriate",
            TicketCategory::Misinformation => "misinformation",
            TicketCategory::Other => "other",
        }
    }
}

impl FromStr for TicketCategory {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spam" => Ok(TicketCategory::Spam),
            "harassment" => Ok(TicketCategory::Harassment),
            "inappropriate" => Ok(TicketCategory::Inappropriate),
            "misinformation" => Ok(TicketCategory::Misinformation),
            "other" => Ok(TicketCategory::Other),
            other => Err(ValidationError::invalid_format(
                "category",
                format!("unknown category '{}'", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Pending,
    Reviewing,
    Resolved,
    Dismissed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Pending => "pending",
            TicketStatus::Reviewing => "reviewing",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TicketStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(TicketStatus::Pending),
            "reviewing" => Ok(TicketStatus::Reviewing),
            "resolved" => Ok(TicketStatus::Resolved),
            "dismissed" => Ok(TicketStatus::Dismissed),
            other => Err(ValidationError::invalid_format(
                "ticket_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

impl StateMachine for TicketStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TicketStatus::*;
        matches!(
            (self, target),
            (Pending, Reviewing)
                | (Pending, Resolved)
                | (Pending, Dismissed)
                | (Reviewing, Resolved)
                | (Reviewing, Dismissed)
        )
    }
}

/// Action a moderator took when resolving a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Resolution {
    ContentRemoved,
    UserWarned,
    UserBanned,
    NoAction,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Resolution::ContentRemoved => "content-removed",
            Resolution::UserWarned => "user-warned",
            Resolution::UserBanned => "user-banned",
            Resolution::NoAction => "no-action",
        }
    }
}

impl FromStr for Resolution {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "content-removed" => Ok(Resolution::ContentRemoved),
            "user-warned" => Ok(Resolution::UserWarned),
            "user-banned" => Ok(Resolution::UserBanned),
            "no-action" => Ok(Resolution::NoAction),
            other => Err(ValidationError::invalid_format(
                "resolution",
                format!("unknown resolution '{}'", other),
            )),
        }
    }
}

/// A moderation case for a human to look at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewTicket {
    pub id: TicketId,
    pub target: ReportTarget,
    /// `None` for tickets opened by automated moderation.
    pub reporter_id: Option<UserId>,
    pub category: TicketCategory,
    pub description: String,
    pub status: TicketStatus,
    pub resolution: Option<Resolution>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ReviewTicket {
    fn automated(content_id: ContentId, verdict: &ModerationVerdict, status: TicketStatus, description: String) -> Self {
        let now = Timestamp::now();
        Self {
            id: TicketId::new(),
            target: ReportTarget::Content(content_id),
            reporter_id: None,
            category: TicketCategory::from_verdict(verdict),
            description,
            status,
            resolution: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Ticket for content the model rejected. Opened already under review.
    pub fn automated_rejection(content_id: ContentId, verdict: &ModerationVerdict) -> Self {
        let description = format!(
            "AI Moderation: {}. Scores - Spam: {}, Toxicity: {}, Inappropriate: {}",
            verdict.reasoning,
            verdict.scores.spam_score(),
            verdict.scores.toxicity_score(),
            verdict.scores.inappropriate_score(),
        );
        Self::automated(content_id, verdict, TicketStatus::Reviewing, description)
    }

    /// Ticket for content held for manual review.
    pub fn automated_review(content_id: ContentId, verdict: &ModerationVerdict) -> Self {
        let description = format!("AI Moderation (Review Needed): {}", verdict.reasoning);
        Self::automated(content_id, verdict, TicketStatus::Pending, description)
    }

    /// Ticket filed by a forum member.
    pub fn reported(
        target: ReportTarget,
        reporter_id: UserId,
        category: TicketCategory,
        description: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let description = description.into();
        if description.trim().is_empty() {
            return Err(ValidationError::empty_field("description"));
        }
        let now = Timestamp::now();
        Ok(Self {
            id: TicketId::new(),
            target,
            reporter_id: Some(reporter_id),
            category,
            description,
            status: TicketStatus::Pending,
            resolution: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn start_review(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TicketStatus::Reviewing)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn resolve(&mut self, resolution: Resolution) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TicketStatus::Resolved)?;
        self.resolution = Some(resolution);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    pub fn dismiss(&mut self) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(TicketStatus::Dismissed)?;
        self.resolution = Some(Resolution::NoAction);
        self.updated_at = Timestamp::now();
        Ok(())
    }
}
