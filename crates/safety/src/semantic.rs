//! External semantic safety collaborator.

use anyhow::{Context, Result};
use async_trait::async_trait;
use caseforge_core::SafetyStatus;
use reqwest::{Client, ClientBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Opinion returned by the semantic collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticOpinion {
    /// Suggested classification
    pub status: SafetyStatus,

    /// Short explanation
    #[serde(default)]
    pub reason: String,

    /// Optional softened rewrite of the offending text
    #[serde(default)]
    pub refined_content: Option<String>,
}

/// External text classification service.
///
/// Implementations are called at most once per safety review and must not
/// retry internally; the reviewer treats any error as "unavailable" and
/// fails open.
#[async_trait]
pub trait SemanticClassifier: Send + Sync {
    /// Classify a flattened document.
    async fn classify(&self, text: &str) -> Result<SemanticOpinion>;
}

/// OpenAI-compatible chat-completions classifier.
#[derive(Clone)]
pub struct OpenAiClassifier {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClassifier {
    /// Create a classifier against the OpenAI API.
    pub fn new(api_key: String) -> Self {
        Self {
            client: ClientBuilder::new()
                .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
                .build()
                .unwrap_or_default(),
            api_key,
            base_url: "https://api.openai.com".to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Override the API base URL (for compatible gateways).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct RawOpinion {
    #[serde(default)]
    status: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    refined_content: Option<String>,
}

#[async_trait]
impl SemanticClassifier for OpenAiClassifier {
    async fn classify(&self, text: &str) -> Result<SemanticOpinion> {
        let prompt = format!(
            "Review the following text. Decide whether it reads like legal advice \
             or implies a promised win or recovery.\n\
             - If risky, suggest status EDIT or DISCARD with short feedback or a \
             softened example sentence.\n\
             - If safe, use status PASS.\n\
             - Return JSON only: {{\"status\": \"PASS|EDIT|DISCARD\", \
             \"reason\": \"...\", \"refined_content\": \"...\"}}\n\n\
             Text:\n{text}\n"
        );

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": "You are a compliance reviewer. Return JSON only."},
                {"role": "user", "content": prompt},
            ],
            "response_format": {"type": "json_object"},
        });

        debug!("running semantic safety check ({} chars)", text.len());

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to call chat completions API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("classifier API error (status {status}): {body}");
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .context("failed to parse classifier response")?;
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or("{}");
        let raw: RawOpinion =
            serde_json::from_str(content).context("classifier returned malformed JSON")?;

        let status = match raw.status.as_str() {
            "DISCARD" => SafetyStatus::Discard,
            "EDIT" => SafetyStatus::Edit,
            _ => SafetyStatus::Pass,
        };

        Ok(SemanticOpinion {
            status,
            reason: raw.reason,
            refined_content: raw.refined_content.filter(|s| !s.is_empty()),
        })
    }
}
