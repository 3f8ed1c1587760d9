//! Pluggable text-analysis providers behind a chat-completion API.
//!
//! Default: `DeepSeekAnalyzer` (OpenAI-shaped chat endpoint). `AppState`
//! holds an `AnalyzerSet`; requests pick a provider by model name, so a
//! second backend is a registration at startup, not a handler change.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Model name requests default to when they do not name one.
pub const DEFAULT_MODEL: &str = "deepseek";

const CHAT_MODEL: &str = "deepseek-chat";
const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;
const MAX_RETRIES: u32 = 3;

#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analysis provider is not configured (missing API key)")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("provider returned empty content")]
    EmptyContent,
}

/// One analysis outcome: the provider's free-text recommendations plus a
/// virality score. The score is currently drawn uniformly from 1..=10; it
/// stands in until a provider reports a real one.
#[derive(Debug, Clone)]
pub struct TextAnalysis {
    pub recommendations: String,
    pub virality_score: i32,
}

/// Implement this to add a backend without touching handlers or storage.
#[async_trait]
pub trait TextAnalyzer: Send + Sync {
    /// Stable name clients select the provider by. Also what gets persisted
    /// on stored analyses.
    fn name(&self) -> &'static str;

    async fn analyze(&self, text: &str) -> Result<TextAnalysis, AnalyzerError>;
}

/// The analyzers available to this process, keyed by provider name.
#[derive(Clone, Default)]
pub struct AnalyzerSet {
    analyzers: HashMap<&'static str, Arc<dyn TextAnalyzer>>,
}

impl AnalyzerSet {
    pub fn register(&mut self, analyzer: Arc<dyn TextAnalyzer>) {
        self.analyzers.insert(analyzer.name(), analyzer);
    }

    /// Lookup is case-insensitive; stored names are lowercase.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TextAnalyzer>> {
        self.analyzers.get(name.to_lowercase().as_str())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Chat-completion backed analyzer. Prompts are Spanish because the target
/// audience writes Spanish-language social posts.
#[derive(Clone)]
pub struct DeepSeekAnalyzer {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl DeepSeekAnalyzer {
    /// A missing key builds a client that reports `NotConfigured` on use,
    /// so the rest of the API stays up without the provider.
    pub fn new(api_key: Option<String>, endpoint: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            endpoint,
        }
    }

    /// Retries on 429 and 5xx with exponential backoff.
    async fn complete(&self, api_key: &str, prompt: &str) -> Result<String, AnalyzerError> {
        let request_body = ChatRequest {
            model: CHAT_MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let mut last_error: Option<AnalyzerError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = std::time::Duration::from_millis(1000 * (1 << (attempt - 1)));
                warn!(
                    "Analysis call attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = self
                .client
                .post(&self.endpoint)
                .bearer_auth(api_key)
                .json(&request_body)
                .send()
                .await;

            let response = match response {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(AnalyzerError::Http(e));
                    continue;
                }
            };

            let status = response.status();

            if status.as_u16() == 429 || status.is_server_error() {
                let body = response.text().await.unwrap_or_default();
                warn!("Analysis API returned {}: {}", status, body);
                last_error = Some(AnalyzerError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            if !status.is_success() {
                let message = response.text().await.unwrap_or_default();
                return Err(AnalyzerError::Api {
                    status: status.as_u16(),
                    message,
                });
            }

            let body: ChatResponse = response.json().await?;
            let content = body
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .filter(|content| !content.is_empty())
                .ok_or(AnalyzerError::EmptyContent)?;

            debug!("Analysis call succeeded ({} chars)", content.len());
            return Ok(content);
        }

        Err(last_error.unwrap_or(AnalyzerError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }
}

#[async_trait]
impl TextAnalyzer for DeepSeekAnalyzer {
    fn name(&self) -> &'static str {
        DEFAULT_MODEL
    }

    async fn analyze(&self, text: &str) -> Result<TextAnalysis, AnalyzerError> {
        let api_key = self.api_key.as_deref().ok_or(AnalyzerError::NotConfigured)?;

        let prompt = format!(
            "Analiza el siguiente texto para redes sociales y proporciona \
             recomendaciones concretas para mejorar su alcance y engagement. \
             Responde en español. El texto es: {text}"
        );
        let recommendations = self.complete(api_key, &prompt).await?;

        Ok(TextAnalysis {
            recommendations,
            virality_score: rand::thread_rng().gen_range(1..=10),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_api_key_reports_not_configured() {
        let analyzer = DeepSeekAnalyzer::new(None, "http://localhost:1/v1".to_string());
        let err = analyzer.analyze("hola").await.unwrap_err();
        assert!(matches!(err, AnalyzerError::NotConfigured));
    }

    #[test]
    fn test_analyzer_set_lookup_is_case_insensitive() {
        let mut set = AnalyzerSet::default();
        set.register(Arc::new(DeepSeekAnalyzer::new(
            None,
            "http://localhost:1/v1".to_string(),
        )));

        assert!(set.get("deepseek").is_some());
        assert!(set.get("DeepSeek").is_some());
        assert!(set.get("gpt-nonexistent").is_none());
    }
}
