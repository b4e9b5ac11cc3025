//! ContentScorer adapters.

mod keyword;
mod mock_scorer;
mod openai;

pub use keyword::{KeywordScorer, KEYWORD_REASONING};
pub use mock_scorer::MockContentScorer;
pub use openai::{OpenAiScorer, OpenAiScorerConfig};
