//! Orchestration of prompt → model → mapping list.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use formfill_core::{FieldDescriptor, FieldMapping};

use crate::MatchError;
use crate::client::ModelClient;
use crate::prompt;

/// Maps extracted document text onto caller-supplied form fields.
///
/// Output always has exactly one [`FieldMapping`] per input
/// [`FieldDescriptor`], in input order, no matter what the model returns.
pub struct FieldMatcher {
    client: Arc<dyn ModelClient>,
    default_api_key: Option<String>,
}

impl FieldMatcher {
    pub fn new(client: Arc<dyn ModelClient>, default_api_key: Option<String>) -> Self {
        Self {
            client,
            default_api_key,
        }
    }

    /// Match `extracted_text` onto `fields`.
    ///
    /// Empty text short-circuits before any model call. A successful model
    /// call with unparseable output degrades to all-empty mappings rather
    /// than erroring; failures to reach the model at all are surfaced.
    pub async fn match_fields(
        &self,
        extracted_text: &str,
        fields: &[FieldDescriptor],
        api_key: Option<&str>,
    ) -> Result<Vec<FieldMapping>, MatchError> {
        if extracted_text.trim().is_empty() {
            return Err(MatchError::NoExtractedText);
        }

        let key = resolve_api_key(api_key, self.default_api_key.as_deref())?;
        let prompt = prompt::build(extracted_text, fields);

        let raw = self.client.complete(&prompt, &key).await?;
        debug!(chars = raw.len(), "model completion received");

        Ok(parse_mappings(&raw, fields))
    }
}

/// Resolve the credential: trimmed caller key wins over the process-level
/// default; neither present is a configuration failure.
pub fn resolve_api_key(
    caller: Option<&str>,
    default_key: Option<&str>,
) -> Result<String, MatchError> {
    if let Some(key) = caller {
        // Keys pasted from a browser often carry stray whitespace/newlines.
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    if let Some(key) = default_key {
        let key = key.trim();
        if !key.is_empty() {
            return Ok(key.to_string());
        }
    }
    Err(MatchError::MissingApiKey)
}

/// Parse the model's completion into mappings aligned with `fields`.
///
/// Unparseable JSON degrades to the all-empty result. Parsed mappings are
/// re-aligned to the input descriptors: unknown field ids are dropped,
/// missing ones filled with empty values, and option-constrained fields
/// only keep values that are verbatim members of their options list.
pub fn parse_mappings(raw: &str, fields: &[FieldDescriptor]) -> Vec<FieldMapping> {
    let cleaned = strip_code_fences(raw);

    let parsed: Vec<Value> = match serde_json::from_str(cleaned) {
        Ok(values) => values,
        Err(e) => {
            warn!(error = %e, "model output was not a JSON array; returning empty mappings");
            return empty_mappings(fields);
        }
    };

    let coerced: Vec<FieldMapping> = parsed.iter().map(coerce_mapping).collect();
    align(fields, coerced)
}

/// One empty mapping per descriptor — the degradation result that keeps
/// the cardinality/order invariant intact on model misbehavior.
pub fn empty_mappings(fields: &[FieldDescriptor]) -> Vec<FieldMapping> {
    fields.iter().map(FieldMapping::empty_for).collect()
}

/// Lenient per-object coercion with `""`/`"text"` defaults.
fn coerce_mapping(value: &Value) -> FieldMapping {
    let get = |key: &str| value.get(key).and_then(Value::as_str).unwrap_or("").to_string();
    FieldMapping {
        field_id: get("fieldId"),
        field_name: get("fieldName"),
        field_type: {
            let t = get("fieldType");
            if t.is_empty() { "text".to_string() } else { t }
        },
        value: get("value"),
    }
}

fn align(fields: &[FieldDescriptor], parsed: Vec<FieldMapping>) -> Vec<FieldMapping> {
    fields
        .iter()
        .map(|field| {
            let mut mapping = FieldMapping::empty_for(field);
            if let Some(found) = parsed.iter().find(|m| m.field_id == field.id) {
                mapping.value = found.value.trim().to_string();
            }
            if let Some(options) = &field.options {
                if !mapping.value.is_empty() && !options.contains(&mapping.value) {
                    warn!(
                        field = %field.id,
                        value = %mapping.value,
                        "model value is not an allowed option; clearing"
                    );
                    mapping.value.clear();
                }
            }
            mapping
        })
        .collect()
}

fn strip_code_fences(raw: &str) -> &str {
    let s = raw.trim();
    let s = s
        .strip_prefix("```json")
        .or_else(|| s.strip_prefix("```"))
        .unwrap_or(s);
    let s = s.strip_suffix("```").unwrap_or(s);
    s.trim()
}
