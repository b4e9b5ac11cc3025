//! ContentScorer port - The language-model scoring and summary function.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::content::ModerationVerdict;
use crate::domain::foundation::DomainError;

/// One post handed to the summarizer, in thread order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryPost {
    pub author: String,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryInput {
    pub thread_title: String,
    pub posts: Vec<SummaryPost>,
}

impl SummaryInput {
    pub fn word_count(&self) -> usize {
        self.posts
            .iter()
            .map(|p| p.body.split_whitespace().count())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryOutput {
    pub summary: String,
    pub key_points: Vec<String>,
    /// -1 (negative) to 1 (positive).
    pub sentiment_score: f64,
}

#[async_trait]
pub trait ContentScorer: Send + Sync {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, DomainError>;

    async fn summarize(&self, input: &SummaryInput) -> Result<SummaryOutput, DomainError>;
}
