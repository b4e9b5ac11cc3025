//! Keyword-based scorer used when no language model is configured and as
//! the fallback when the model call fails.

use async_trait::async_trait;

use crate::domain::content::{ModerationVerdict, ScoreSnapshot};
use crate::domain::foundation::DomainError;
use crate::ports::{ContentScorer, SummaryInput, SummaryOutput};

const SPAM_KEYWORDS: &[&str] = &["buy now", "click here", "limited offer", "free money"];
const TOXIC_KEYWORDS: &[&str] = &["hate", "stupid", "idiot", "kill"];
const INAPPROPRIATE_KEYWORDS: &[&str] = &["adult", "explicit"];

const HIT_SCORE: f64 = 0.8;
const MISS_SCORE: f64 = 0.1;

pub const KEYWORD_REASONING: &str = "Automated keyword screening";

#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl KeywordScorer {
    pub fn new() -> Self {
        Self
    }

    /// Scores text synchronously. Shared with the model scorer's fallback path.
    pub fn score(text: &str) -> ModerationVerdict {
        let lower = text.to_lowercase();
        let dimension = |keywords: &[&str]| {
            if keywords.iter().any(|kw| lower.contains(kw)) {
                HIT_SCORE
            } else {
                MISS_SCORE
            }
        };
        let scores = ScoreSnapshot::clamped(
            dimension(SPAM_KEYWORDS),
            dimension(TOXIC_KEYWORDS),
            dimension(INAPPROPRIATE_KEYWORDS),
        );
        ModerationVerdict::from_scores(scores, KEYWORD_REASONING)
    }

    /// Count-based summary with no language understanding.
    pub fn summary(input: &SummaryInput) -> SummaryOutput {
        let posts = input.posts.len();
        let words = input.word_count();
        SummaryOutput {
            summary: format!(
                "This thread contains {} posts discussing \"{}\". Automatic summary unavailable.",
                posts, input.thread_title
            ),
            key_points: vec![
                format!("Total posts: {}", posts),
                format!("Total words: {}", words),
            ],
            sentiment_score: 0.0,
        }
    }
}

#[async_trait]
impl ContentScorer for KeywordScorer {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, DomainError> {
        Ok(Self::score(text))
    }

    async fn summarize(&self, input: &SummaryInput) -> Result<SummaryOutput, DomainError> {
        Ok(Self::summary(input))
    }
}
