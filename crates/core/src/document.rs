//! Generated content document.

use crate::case::PlanningInfo;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A generated content document.
///
/// The generator returns a nested JSON object with conventional sections
/// (page_meta, hero_section, situation_analysis, action_guide, faq_section,
/// legal_safety). The loop mutates it in exactly two places: injecting the
/// case slug when absent and stamping the planned structure type. Everything
/// else treats the document as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentDocument(Value);

impl ContentDocument {
    /// Wrap a JSON value. Non-object values are accepted but flatten to
    /// their own text.
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Borrow the underlying JSON.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Flatten the document to plain text.
    ///
    /// Depth-first over maps and lists in order, collecting every scalar
    /// leaf, joined by single spaces. This is the canonical text fed to
    /// the safety reviewer and quality scorer, and must stay deterministic
    /// for a given document.
    pub fn flatten(&self) -> String {
        let mut leaves = Vec::new();
        collect_leaves(&self.0, &mut leaves);
        leaves.join(" ")
    }

    /// The document slug, if one has been set.
    pub fn slug(&self) -> Option<&str> {
        self.0
            .get("page_meta")
            .and_then(|meta| meta.get("slug"))
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Set `page_meta.slug` when the document has none, creating
    /// `page_meta` if needed.
    pub fn inject_slug(&mut self, slug: &str) {
        if slug.is_empty() || self.slug().is_some() {
            return;
        }
        let root = match self.0.as_object_mut() {
            Some(obj) => obj,
            None => return,
        };
        let meta = root
            .entry("page_meta")
            .or_insert_with(|| Value::Object(Default::default()));
        if !meta.is_object() {
            *meta = Value::Object(Default::default());
        }
        if let Some(meta) = meta.as_object_mut() {
            meta.insert("slug".to_string(), Value::String(slug.to_string()));
        }
    }

    /// Stamp the planned structure type on the document when it lacks one.
    pub fn inherit_structure_type(&mut self, planning: &PlanningInfo) {
        let Some(structure_type) = planning.structure_type.as_deref() else {
            return;
        };
        let Some(root) = self.0.as_object_mut() else {
            return;
        };
        if !root.contains_key("structure_type") {
            root.insert(
                "structure_type".to_string(),
                Value::String(structure_type.to_string()),
            );
        }
    }

    /// The document's own structure type tag, if any.
    pub fn structure_type(&self) -> Option<&str> {
        self.0.get("structure_type").and_then(Value::as_str)
    }
}

fn collect_leaves(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for v in map.values() {
                collect_leaves(v, out);
            }
        }
        Value::Array(items) => {
            for v in items {
                collect_leaves(v, out);
            }
        }
        Value::String(s) => out.push(s.clone()),
        Value::Number(n) => out.push(n.to_string()),
        Value::Bool(b) => out.push(b.to_string()),
        Value::Null => {}
    }
}
