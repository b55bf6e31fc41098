//! OpenAI-compatible chat-completions writer.

use async_trait::async_trait;
use caseforge_core::{Case, ContentDocument, PlanningInfo};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{safe_test, Writer, WriterMode};

const REQUEST_TIMEOUT_SECS: u64 = 120;
const DEFAULT_MODEL: &str = "gpt-5-mini";

const SYSTEM_PROMPT: &str = "\
You are a senior editor producing landing page content for claim-recovery \
topics. Return exactly one JSON object with the sections page_meta, \
hero_section, situation_analysis, action_guide, faq_section and \
legal_safety. Compliance rules: state that the content is general \
information, recommend consulting an expert, and do not promise a win or a \
recovery in any form. Vary the opening by user_intent and structure_type: \
calculation leads with the key numbers, action leads with a short numbered \
step list, exploration leads with a situation narrative; type_a opens with \
a TL;DR summary, type_b opens with a case story, type_c is built around an \
FAQ and checklist. Keep the tone direct, brief and conservative.";

/// Writer backed by an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct OpenAiWriter {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
}

impl OpenAiWriter {
    /// Create a writer. A missing API key makes every live call fail,
    /// which the loop consumes as a generation failure.
    pub fn new(api_key: Option<String>) -> Self {
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

    fn case_brief(
        case: &Case,
        planning: &PlanningInfo,
        previous_text: Option<&str>,
        feedback: Option<&str>,
    ) -> String {
        let faq: Vec<String> = case
            .faq
            .iter()
            .map(|pair| format!("{} / {}", pair.question, pair.answer))
            .collect();
        format!(
            "Fill the JSON schema using this case.\n\n\
             case_id: {}\n\
             slug: {}\n\
             category: {}\n\
             title: {}\n\
             target_user: {}\n\
             pain_summary: {}\n\
             keywords: {}\n\
             faq seeds: {}\n\
             previous draft (if any): {}\n\
             feedback to address (if any): {}\n\
             user_intent: {}\n\
             structure_type: {}\n\
             relationship: {}\n\
             legal_strategy: {}\n\
             unique_data_point: {}\n\
             main_keyword: {}\n\
             Apply the intent, structure and tone guidance above.",
            case.case_id,
            case.slug.as_deref().unwrap_or_default(),
            case.category.as_deref().unwrap_or_default(),
            case.title.as_deref().unwrap_or_default(),
            case.target_user.as_deref().unwrap_or_default(),
            case.pain_summary.as_deref().unwrap_or_default(),
            case.keywords.as_deref().unwrap_or_default(),
            faq.join(" | "),
            previous_text.unwrap_or_default(),
            feedback.unwrap_or_default(),
            planning.user_intent.as_deref().unwrap_or_default(),
            planning.structure_type.as_deref().unwrap_or_default(),
            planning.relationship.as_deref().unwrap_or_default(),
            planning.legal_strategy.as_deref().unwrap_or_default(),
            planning.unique_data_point.as_deref().unwrap_or_default(),
            planning.main_keyword.as_deref().unwrap_or_default(),
        )
    }

    async fn request_document(&self, brief: String) -> Option<ContentDocument> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("writer API key missing, cannot generate");
            return None;
        };

        let payload = json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": SYSTEM_PROMPT},
                {"role": "user", "content": brief},
            ],
            "response_format": {"type": "json_object"},
        });

        debug!(model = %self.model, "requesting draft from writer service");

        let response = match self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("writer request failed: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!("writer API returned status {}", response.status());
            return None;
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

        let parsed: ChatResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("writer response was not valid JSON: {e}");
                return None;
            }
        };
        let content = parsed
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .unwrap_or_default();
        match serde_json::from_str(content) {
            Ok(value) => Some(ContentDocument::new(value)),
            Err(e) => {
                warn!("writer returned malformed document JSON: {e}");
                None
            }
        }
    }
}

#[async_trait]
impl Writer for OpenAiWriter {
    async fn generate(
        &self,
        case: &Case,
        planning: &PlanningInfo,
        mode: WriterMode,
    ) -> Option<ContentDocument> {
        if mode == WriterMode::SafeTest {
            return Some(safe_test::safe_test_document(case.slug.as_deref()));
        }
        self.request_document(Self::case_brief(case, planning, None, None))
            .await
    }

    async fn refine(
        &self,
        case: &Case,
        previous_text: &str,
        feedback: &str,
        planning: &PlanningInfo,
        mode: WriterMode,
    ) -> Option<ContentDocument> {
        if mode == WriterMode::SafeTest {
            return Some(safe_test::safe_test_document(case.slug.as_deref()));
        }
        self.request_document(Self::case_brief(
            case,
            planning,
            Some(previous_text),
            Some(feedback),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_api_key_yields_none_in_live_mode() {
        let writer = OpenAiWriter::new(None);
        let case = Case::new("CASE-1", "slug-1");
        let planning = PlanningInfo::from_case(&case);
        let doc = writer.generate(&case, &planning, WriterMode::Live).await;
        assert!(doc.is_none());
    }

    #[tokio::test]
    async fn safe_test_mode_never_calls_the_service() {
        // No API key and no network access, yet safe mode still produces
        // the fixture with the case slug applied.
        let writer = OpenAiWriter::new(None);
        let case = Case::new("TEST-CASE-001", "test-freelancer-unpaid");
        let planning = PlanningInfo::from_case(&case);
        let doc = writer
            .generate(&case, &planning, WriterMode::SafeTest)
            .await
            .unwrap();
        assert_eq!(doc.slug(), Some("test-freelancer-unpaid"));

        let refined = writer
            .refine(&case, "prev", "fb", &planning, WriterMode::SafeTest)
            .await
            .unwrap();
        assert_eq!(refined.slug(), Some("test-freelancer-unpaid"));
    }

    #[test]
    fn case_brief_includes_planning_fields() {
        let mut case = Case::new("CASE-2", "slug-2");
        case.user_intent = Some("action".to_string());
        case.main_keyword = Some("overdue payment".to_string());
        let planning = PlanningInfo::from_case(&case);
        let brief = OpenAiWriter::case_brief(&case, &planning, None, Some("be more concrete"));
        assert!(brief.contains("CASE-2"));
        assert!(brief.contains("action"));
        assert!(brief.contains("overdue payment"));
        assert!(brief.contains("be more concrete"));
    }
}
