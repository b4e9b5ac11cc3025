//! OpenAI chat-completions scorer.
//!
//! Asks the model for JSON scores and summaries. Unless disabled, any call
//! or parse failure falls back to [`KeywordScorer`] so moderation keeps
//! flowing while the model is unavailable.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::KeywordScorer;
use crate::domain::content::{ModerationVerdict, Recommendation, ScoreSnapshot};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{ContentScorer, SummaryInput, SummaryOutput};

const MODERATION_SYSTEM_PROMPT: &str =
    "You are a content moderation AI. Analyze text and provide moderation scores in JSON format.";

const SUMMARY_SYSTEM_PROMPT: &str = "You are a helpful assistant that summarizes discussion threads. Provide clear, concise summaries in JSON format.";

#[derive(Debug, Clone)]
pub struct OpenAiScorerConfig {
    api_key: Secret<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    /// Use keyword scoring when the model fails instead of returning an error.
    pub fallback_to_keywords: bool,
}

impl OpenAiScorerConfig {
    pub fn new(api_key: Secret<String>) -> Self {
        Self {
            api_key,
            model: "gpt-3.5-turbo".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout: Duration::from_secs(30),
            fallback_to_keywords: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_fallback(mut self, enabled: bool) -> Self {
        self.fallback_to_keywords = enabled;
        self
    }
}

pub struct OpenAiScorer {
    config: OpenAiScorerConfig,
    client: Client,
}

impl OpenAiScorer {
    pub fn new(config: OpenAiScorerConfig) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::new(ErrorCode::InternalError, e.to_string()))?;
        Ok(Self { config, client })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn chat(
        &self,
        system: &str,
        user: String,
        temperature: f32,
        max_tokens: u32,
    ) -> Result<String, DomainError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature,
            max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| DomainError::new(ErrorCode::ScoringError, e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(DomainError::new(ErrorCode::RateLimited, "scoring model rate limited"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::new(
                ErrorCode::ScoringError,
                format!("scoring model returned {}: {}", status, body),
            ));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| DomainError::new(ErrorCode::ScoringError, e.to_string()))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DomainError::new(ErrorCode::ScoringError, "no choices in response"))
    }

    async fn try_moderate(&self, text: &str) -> Result<ModerationVerdict, DomainError> {
        let raw = self
            .chat(MODERATION_SYSTEM_PROMPT, moderation_prompt(text), 0.3, 300)
            .await?;
        parse_verdict(&raw)
    }

    async fn try_summarize(&self, input: &SummaryInput) -> Result<SummaryOutput, DomainError> {
        let raw = self
            .chat(SUMMARY_SYSTEM_PROMPT, summary_prompt(input), 0.5, 500)
            .await?;
        parse_summary(&raw)
    }
}

#[async_trait]
impl ContentScorer for OpenAiScorer {
    async fn moderate(&self, text: &str) -> Result<ModerationVerdict, DomainError> {
        match self.try_moderate(text).await {
            Ok(verdict) => Ok(verdict),
            Err(e) if self.config.fallback_to_keywords => {
                tracing::warn!(error = %e, "Model moderation failed, using keyword scoring");
                Ok(KeywordScorer::score(text))
            }
            Err(e) => Err(e),
        }
    }

    async fn summarize(&self, input: &SummaryInput) -> Result<SummaryOutput, DomainError> {
        match self.try_summarize(input).await {
            Ok(summary) => Ok(summary),
            Err(e) if self.config.fallback_to_keywords => {
                tracing::warn!(error = %e, "Model summary failed, using count-based summary");
                Ok(KeywordScorer::summary(input))
            }
            Err(e) => Err(e),
        }
    }
}

fn moderation_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following content for moderation purposes. Rate it on three dimensions:
1. Spam (promotional content, repetitive, off-topic)
2. Toxicity (offensive language, hate speech, harassment)
3. Inappropriate (adult content, violence, illegal activities)

For each dimension, provide a score from 0 (clean) to 1 (severe violation).
Then provide a recommendation: "approve" (all scores < 0.3), "review" (any score 0.3-0.7), or "reject" (any score > 0.7).
Finally, explain your reasoning in 1-2 sentences.

Content to analyze:
"""
{}
"""

Respond in JSON format:
{{"spamScore": 0.0, "toxicityScore": 0.0, "inappropriateScore": 0.0, "recommendation": "approve", "reasoning": "explanation here"}}"#,
        text
    )
}

fn summary_prompt(input: &SummaryInput) -> String {
    let posts = input
        .posts
        .iter()
        .enumerate()
        .map(|(i, p)| format!("Post {} (by {}):\n{}", i + 1, p.author, p.body))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    format!(
        r#"Summarize the following discussion thread titled "{}". Provide:
1. A concise summary (2-3 sentences)
2. Key points discussed (3-5 bullet points)
3. Overall sentiment score from -1 (very negative) to 1 (very positive)

Discussion thread:
"""
{}
"""

Respond in JSON format:
{{"summary": "summary here", "keyPoints": ["point 1", "point 2"], "sentimentScore": 0.0}}"#,
        input.thread_title, posts
    )
}

/// Models sometimes wrap JSON in markdown fences.
fn strip_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open.strip_suffix("```").unwrap_or(without_open).trim()
}

fn parse_verdict(raw: &str) -> Result<ModerationVerdict, DomainError> {
    let parsed: RawVerdict = serde_json::from_str(strip_fences(raw))
        .map_err(|e| DomainError::new(ErrorCode::ScoringError, format!("unparsable verdict: {}", e)))?;
    let scores = ScoreSnapshot::clamped(
        parsed.spam_score,
        parsed.toxicity_score,
        parsed.inappropriate_score,
    );
    let recommendation = parsed
        .recommendation
        .as_deref()
        .and_then(|r| r.parse::<Recommendation>().ok())
        .unwrap_or_else(|| Recommendation::from_scores(&scores));
    Ok(ModerationVerdict::new(
        scores,
        recommendation,
        parsed.reasoning.unwrap_or_default(),
    ))
}

fn parse_summary(raw: &str) -> Result<SummaryOutput, DomainError> {
    let parsed: RawSummary = serde_json::from_str(strip_fences(raw))
        .map_err(|e| DomainError::new(ErrorCode::ScoringError, format!("unparsable summary: {}", e)))?;
    Ok(SummaryOutput {
        summary: parsed.summary,
        key_points: parsed.key_points,
        sentiment_score: parsed.sentiment_score.clamp(-1.0, 1.0),
    })
}

// ----- OpenAI API Types -----

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVerdict {
    spam_score: f64,
    toxicity_score: f64,
    inappropriate_score: f64,
    recommendation: Option<String>,
    reasoning: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSummary {
    summary: String,
    #[serde(default)]
    key_points: Vec<String>,
    #[serde(default)]
    sentiment_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder_works() {
        let config = OpenAiScorerConfig::new(Secret::new("sk-test".into()))
            .with_model("gpt-4o-mini")
            .with_timeout(Duration::from_secs(5))
            .with_fallback(false);
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert!(!config.fallback_to_keywords);
    }

    #[test]
    fn parses_fenced_verdict() {
        let raw = "```json\n{\"spamScore\":0.9,\"toxicityScore\":0.1,\"inappropriateScore\":0.0,\"recommendation\":\"reject\",\"reasoning\":\"ads\"}\n```";
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Reject);
        assert_eq!(verdict.reasoning, "ads");
    }

    #[test]
    fn derives_recommendation_when_missing_or_invalid() {
        let raw = r#"{"spamScore":0.5,"toxicityScore":0.1,"inappropriateScore":0.0,"recommendation":"maybe"}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.recommendation, Recommendation::Review);
        assert_eq!(verdict.reasoning, "");
    }

    #[test]
    fn clamps_out_of_range_scores() {
        let raw = r#"{"spamScore":3.0,"toxicityScore":-1.0,"inappropriateScore":0.2}"#;
        let verdict = parse_verdict(raw).unwrap();
        assert_eq!(verdict.scores.spam_score(), 1.0);
        assert_eq!(verdict.scores.toxicity_score(), 0.0);
    }

    #[test]
    fn rejects_non_json_verdict() {
        assert!(parse_verdict("I think it's fine").is_err());
    }

    #[test]
    fn parses_summary_with_defaults() {
        let out = parse_summary(r#"{"summary":"People agree."}"#).unwrap();
        assert!(out.key_points.is_empty());
        assert_eq!(out.sentiment_score, 0.0);
    }

    #[test]
    fn completions_url_tolerates_trailing_slash() {
        let scorer = OpenAiScorer::new(
            OpenAiScorerConfig::new(Secret::new("k".into())).with_base_url("http://localhost:9/v1/"),
        )
        .unwrap();
        assert_eq!(scorer.completions_url(), "http://localhost:9/v1/chat/completions");
    }

    #[tokio::test]
    async fn unreachable_model_falls_back_to_keywords() {
        let scorer = OpenAiScorer::new(
            OpenAiScorerConfig::new(Secret::new("k".into()))
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(Duration::from_secs(1)),
        )
        .unwrap();
        let verdict = scorer.moderate("free money here").await.unwrap();
        assert_eq!(verdict.scores.spam_score(), 0.8);
    }

    #[tokio::test]
    async fn unreachable_model_errors_without_fallback() {
        let scorer = OpenAiScorer::new(
            OpenAiScorerConfig::new(Secret::new("k".into()))
                .with_base_url("http://127.0.0.1:9")
                .with_timeout(Duration::from_secs(1))
                .with_fallback(false),
        )
        .unwrap();
        assert!(scorer.moderate("hello").await.is_err());
    }
}
