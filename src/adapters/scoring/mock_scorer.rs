//! Content scorer with canned answers, for tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::domain::content::{ModerationVerdict, Recommendation, ScoreSnapshot};
use crate::domain::foundation::DomainError;
use crate::ports::{ContentScorer, SummaryInput, SummaryOutput};

#[derive(Debug, Clone)]
pub struct MockContentScorer {
    verdict: Result<ModerationVerdict, DomainError>,
    summary: SummaryOutput,
    moderated: Arc<Mutex<Vec<String>>>,
    summarized: Arc<Mutex<Vec<SummaryInput>>>,
}

impl MockContentScorer {
    /// Approves everything with zero scores.
    pub fn new() -> Self {
        Self {
            verdict: Ok(ModerationVerdict::new(
                ScoreSnapshot::clamped(0.0, 0.0, 0.0),
                Recommendation::Approve,
                "clean",
            )),
            summary: SummaryOutput {
                summary: "A short discussion.".to_string(),
                key_points: vec!["point".to_string()],
                sentiment_score: 0.0,
            },
            moderated: Arc::new(Mutex::new(Vec::new())),
            summarized: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_verdict(mut self, verdict: ModerationVerdict) -> Self {
        self.verdict = Ok(verdict);
        self
    }

    pub fn with_error(mut self, error: DomainError) -> Self {
        self.verdict = Err(error);
        self
    }

    pub fn with_summary(mut self, summary: SummaryOutput) -> Self {
        self.summary = summary;
        self
    }

    pub fn moderated_texts(&self) -> Vec<String> {
        self.moderated.lock().unwrap().clone()
    }

    pub fn summary_inputs(&self) -> Vec<SummaryInput> {
        self.summarized.lock().unwrap().clone()
    }
}

impl Default for MockContentScorer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentScorer for MockContentScorer {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, DomainError> {
        self.moderated.lock().unwrap().push(text.to_string());
        self.verdict.clone()
    }

    async fn summarize(&self, input: &SummaryInput) -> Result<SummaryOutput, DomainError> {
        self.summarized.lock().unwrap().push(input.clone());
        Ok(self.summary.clone())
    }
}
