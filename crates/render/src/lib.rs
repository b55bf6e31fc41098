//! Landing page rendering.
//!
//! The renderer collaborator turns an approved content document into a
//! persisted artifact. The default implementation substitutes document
//! sections into an HTML template and writes `public/<slug>.html`.

#![warn(missing_docs)]

use async_trait::async_trait;
use caseforge_core::ContentDocument;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;

/// Error type for rendering operations.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The document carries no slug to name the artifact after.
    #[error("document has no slug")]
    MissingSlug,

    /// I/O error while writing the artifact
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Renderer collaborator.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Render a document and return the artifact location.
    async fn render(&self, document: &ContentDocument) -> Result<String, RenderError>;
}

const DEFAULT_TEMPLATE: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{TITLE}}</title>
<meta name="description" content="{{DESCRIPTION}}">
<meta name="keywords" content="{{KEYWORDS}}">
</head>
<body>
<main>
<h1>{{H1}}</h1>
<p class="intro">{{INTRO}}</p>
<section class="situation"><p>{{PAIN_POINT}}</p></section>
<section class="guide"><p>{{ACTION_STEPS}}</p></section>
<section class="faq">
<h2>FAQ</h2>
<dl>
<dt>{{FAQ1_Q}}</dt><dd>{{FAQ1_A}}</dd>
<dt>{{FAQ2_Q}}</dt><dd>{{FAQ2_A}}</dd>
<dt>{{FAQ3_Q}}</dt><dd>{{FAQ3_A}}</dd>
</dl>
</section>
<footer class="disclaimer"><p>{{LEGAL_DISCLAIMER}}</p></footer>
</main>
</body>
</html>
"#;

const DEFAULT_DISCLAIMER: &str =
    "This content is a general information sample. Speak with a qualified \
     professional before acting on a real dispute.";

/// File-writing HTML renderer.
pub struct HtmlRenderer {
    out_dir: PathBuf,
}

impl HtmlRenderer {
    /// Render into the given output directory.
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    fn replacements(document: &ContentDocument) -> Vec<(&'static str, String)> {
        let value = document.as_value();
        let get = |section: &str, field: &str| -> String {
            value
                .get(section)
                .and_then(|s| s.get(field))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };
        let faq = |idx: usize, field: &str| -> String {
            value
                .get("faq_section")
                .and_then(Value::as_array)
                .and_then(|items| items.get(idx))
                .and_then(|item| item.get(field))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let mut disclaimer = get("legal_safety", "disclaimer");
        if disclaimer.is_empty() {
            disclaimer = DEFAULT_DISCLAIMER.to_string();
        }

        vec![
            ("{{TITLE}}", get("page_meta", "title")),
            ("{{DESCRIPTION}}", get("page_meta", "description")),
            ("{{KEYWORDS}}", get("page_meta", "keywords")),
            ("{{H1}}", get("hero_section", "headline")),
            ("{{INTRO}}", get("hero_section", "intro_copy")),
            ("{{PAIN_POINT}}", get("situation_analysis", "pain_summary")),
            ("{{ACTION_STEPS}}", get("action_guide", "guidance")),
            ("{{FAQ1_Q}}", faq(0, "question")),
            ("{{FAQ1_A}}", faq(0, "answer")),
            ("{{FAQ2_Q}}", faq(1, "question")),
            ("{{FAQ2_A}}", faq(1, "answer")),
            ("{{FAQ3_Q}}", faq(2, "question")),
            ("{{FAQ3_A}}", faq(2, "answer")),
            ("{{LEGAL_DISCLAIMER}}", disclaimer),
        ]
    }
}

#[async_trait]
impl Renderer for HtmlRenderer {
    async fn render(&self, document: &ContentDocument) -> Result<String, RenderError> {
        let slug = document.slug().ok_or(RenderError::MissingSlug)?;

        let mut html = DEFAULT_TEMPLATE.to_string();
        for (placeholder, replacement) in Self::replacements(document) {
            html = html.replace(placeholder, &replacement);
        }

        std::fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(format!("{slug}.html"));
        std::fs::write(&path, html)?;

        info!(slug, "rendered landing artifact");
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document() -> ContentDocument {
        ContentDocument::new(json!({
            "page_meta": {"title": "T", "description": "D", "keywords": "k1, k2", "slug": "my-page"},
            "hero_section": {"headline": "H", "intro_copy": "I"},
            "situation_analysis": {"pain_summary": "P"},
            "action_guide": {"guidance": "G"},
            "faq_section": [
                {"question": "Q1?", "answer": "A1"},
                {"question": "Q2?", "answer": "A2"},
            ],
            "legal_safety": {"disclaimer": "General information only."},
        }))
    }

    #[tokio::test]
    async fn renders_sections_into_the_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path());
        let path = renderer.render(&document()).await.unwrap();

        assert!(path.ends_with("my-page.html"));
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("<title>T</title>"));
        assert!(html.contains("<h1>H</h1>"));
        assert!(html.contains("Q1?"));
        assert!(html.contains("General information only."));
        // The third FAQ slot is absent and renders empty.
        assert!(!html.contains("{{FAQ3_Q}}"));
    }

    #[tokio::test]
    async fn missing_slug_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path());
        let doc = ContentDocument::new(json!({"hero_section": {"headline": "H"}}));
        let err = renderer.render(&doc).await.unwrap_err();
        assert!(matches!(err, RenderError::MissingSlug));
    }

    #[tokio::test]
    async fn empty_disclaimer_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = HtmlRenderer::new(dir.path());
        let doc = ContentDocument::new(json!({
            "page_meta": {"slug": "bare"},
        }));
        let path = renderer.render(&doc).await.unwrap();
        let html = std::fs::read_to_string(path).unwrap();
        assert!(html.contains("general information sample"));
    }
}
