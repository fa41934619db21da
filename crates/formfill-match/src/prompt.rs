//! Deterministic instruction payload construction.
//!
//! Pure: identical text and fields always produce identical prompts. The
//! extracted text is embedded verbatim — truncation, if any, is the
//! boundary layer's business.

use serde_json::{Value, json};

use formfill_core::FieldDescriptor;

/// A chat-style instruction payload: fixed system instruction plus the
/// per-request user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful assistant that extracts and matches form data. \
You excel at cross-language matching - translating content to find the correct option. \
Always respond with valid JSON only.";

/// Serialize one descriptor for the model. The allowed-options list is
/// included only when present and non-empty.
fn field_descriptor_json(field: &FieldDescriptor) -> Value {
    let mut desc = json!({
        "id": field.id,
        "name": field.name,
        "label": field.label,
        "type": field.field_type,
        "placeholder": field.placeholder,
    });
    if let Some(options) = &field.options {
        if !options.is_empty() {
            desc["availableOptions"] = json!(options);
        }
    }
    desc
}

/// Build the instruction payload for one matching request.
pub fn build(extracted_text: &str, fields: &[FieldDescriptor]) -> Prompt {
    let descriptors: Vec<Value> = fields.iter().map(field_descriptor_json).collect();
    let fields_description =
        serde_json::to_string_pretty(&descriptors).unwrap_or_else(|_| "[]".to_string());

    let user = format!(
        r#"You are a form-filling assistant. I have extracted text from a document and need to fill in a web form.

## Extracted Document Text:
{extracted_text}

## Form Fields to Fill:
{fields_description}

## Task:
Analyze the document text and determine the best value for each form field based on semantic matching.
For each field, find the most appropriate value from the document text.

Return a JSON array with this structure:
[
  {{
    "fieldId": "the field id",
    "fieldName": "human readable field name/label",
    "fieldType": "the field type",
    "value": "the extracted value to fill, or empty string if no match"
  }}
]

## CRITICAL RULES:

### Translation & Semantic Matching:
- The document and form may be in DIFFERENT LANGUAGES. You MUST match by MEANING, not literal text.
- If a field has "availableOptions", you MUST return a value that EXACTLY matches one of those options.
- Translate document content to match the form's language when selecting from options.

### Examples of translation matching:
- Document says "Männlich" (German for male) → select "Male" from options ["Male", "Female", "Other"]
- Document says "États-Unis" (French) → select "United States" from country options
- Document says "Geburtsdatum: 15.03.1990" → return "1990-03-15" for a date field

### For fields WITH availableOptions:
1. Find the semantic/translated match between document content and available options
2. Return the EXACT text of the matching option (copy it exactly as shown in availableOptions)
3. If no option matches semantically, return empty string

### For fields WITHOUT availableOptions (free text):
- Extract the appropriate value directly from the document
- Format dates as YYYY-MM-DD
- For names, emails and phone numbers, look for the corresponding patterns

### General:
- Only return valid JSON array, no other text
- Return empty string for value if no good match exists

JSON Response:"#
    );

    Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(id: &str, options: Option<Vec<&str>>) -> FieldDescriptor {
        FieldDescriptor {
            id: id.to_string(),
            name: format!("{id}-name"),
            field_type: "text".to_string(),
            label: String::new(),
            placeholder: String::new(),
            options: options.map(|o| o.into_iter().map(str::to_string).collect()),
        }
    }

    #[test]
    fn build_is_deterministic() {
        let fields = vec![field("f1", None), field("f2", Some(vec!["Male", "Female"]))];
        let a = build("Name: Jane", &fields);
        let b = build("Name: Jane", &fields);
        assert_eq!(a, b);
    }

    #[test]
    fn text_is_embedded_verbatim() {
        let long_text = "x".repeat(20_000);
        let prompt = build(&long_text, &[field("f1", None)]);
        assert!(prompt.user.contains(&long_text));
    }

    #[test]
    fn options_only_serialized_when_non_empty() {
        let with = build("t", &[field("f1", Some(vec!["A", "B"]))]);
        assert!(with.user.contains("availableOptions"));
        assert!(with.user.contains("\"A\""));

        let without = build("t", &[field("f1", None)]);
        assert!(!without.user.contains("availableOptions"));

        let empty = build("t", &[field("f1", Some(vec![]))]);
        assert!(!empty.user.contains("availableOptions"));
    }

    #[test]
    fn rules_are_present() {
        let prompt = build("t", &[field("f1", None)]);
        assert!(prompt.user.contains("DIFFERENT LANGUAGES"));
        assert!(prompt.user.contains("YYYY-MM-DD"));
        assert!(prompt.user.contains("EXACTLY matches one of those options"));
        assert!(prompt.system.contains("valid JSON only"));
    }
}
