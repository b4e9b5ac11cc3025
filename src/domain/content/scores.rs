//! Scoring output of the moderation model and the decision rules derived from it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Above this maximum score content is rejected outright.
pub const REJECT_THRESHOLD: f64 = 0.7;

/// Above this score content needs a human look; also the spam/toxic cut-off.
pub const REVIEW_THRESHOLD: f64 = 0.3;

/// Per-dimension scores in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSnapshot {
    spam_score: f64,
    toxicity_score: f64,
    inappropriate_score: f64,
}

impl ScoreSnapshot {
    /// Creates a snapshot, rejecting scores outside `[0, 1]` or NaN.
    pub fn new(spam: f64, toxicity: f64, inappropriate: f64) -> Result<Self, ValidationError> {
        for (field, value) in [
            ("spam_score", spam),
            ("toxicity_score", toxicity),
            ("inappropriate_score", inappropriate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::out_of_range(field, 0.0, 1.0, value));
            }
        }
        Ok(Self {
            spam_score: spam,
            toxicity_score: toxicity,
            inappropriate_score: inappropriate,
        })
    }

    /// Builds a snapshot from untrusted model output, clamping into range.
    pub fn clamped(spam: f64, toxicity: f64, inappropriate: f64) -> Self {
        let clamp = |v: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            spam_score: clamp(spam),
            toxicity_score: clamp(toxicity),
            inappropriate_score: clamp(inappropriate),
        }
    }

    pub fn spam_score(&self) -> f64 {
        self.spam_score
    }

    pub fn toxicity_score(&self) -> f64 {
        self.toxicity_score
    }

    pub fn inappropriate_score(&self) -> f64 {
        self.inappropriate_score
    }

    pub fn max(&self) -> f64 {
        self.spam_score
            .max(self.toxicity_score)
            .max(self.inappropriate_score)
    }

    pub fn is_spam(&self) -> bool {
        self.spam_score > REVIEW_THRESHOLD
    }

    pub fn is_toxic(&self) -> bool {
        self.toxicity_score > REVIEW_THRESHOLD
    }
}

/// What the scorer suggests doing with a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Approve,
    Review,
    Reject,
}

impl Recommendation {
    /// Derives a recommendation from the highest score.
    pub fn from_scores(scores: &ScoreSnapshot) -> Self {
        let max = scores.max();
        if max > REJECT_THRESHOLD {
            Recommendation::Reject
        } else if max > REVIEW_THRESHOLD {
            Recommendation::Review
        } else {
            Recommendation::Approve
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Approve => "approve",
            Recommendation::Review => "review",
            Recommendation::Reject => "reject",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" => Ok(Recommendation::Approve),
            "review" => Ok(Recommendation::Review),
            "reject" => Ok(Recommendation::Reject),
            other => Err(ValidationError::invalid_format(
                "recommendation",
                format!("unknown recommendation '{}'", other),
            )),
        }
    }
}

/// Full result of scoring one piece of content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationVerdict {
    pub scores: ScoreSnapshot,
    pub recommendation: Recommendation,
    pub reasoning: String,
}

impl ModerationVerdict {
    pub fn new(
        scores: ScoreSnapshot,
        recommendation: Recommendation,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            scores,
            recommendation,
            reasoning: reasoning.into(),
        }
    }

    /// Verdict whose recommendation follows the score thresholds.
    pub fn from_scores(scores: ScoreSnapshot, reasoning: impl Into<String>) -> Self {
        Self::new(scores, Recommendation::from_scores(&scores), reasoning)
    }
}
