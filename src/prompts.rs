//! Prompts for VLM-based patient-data extraction.
//!
//! Every instruction sent to the model lives here so that prompt changes
//! never touch the retry or parsing logic, and so tests can inspect the
//! texts directly.
//!
//! All prompts ask for the same four-key JSON object; the parser in
//! [`crate::pipeline::parse`] relies on nothing else.

use crate::config::Attempt;

/// Detailed prompt used for PDF 1.5 and newer.
pub const STANDARD_PROMPT: &str = r#"You are a medical document analysis AI specialized in extracting patient information from healthcare documents.

IMPORTANT: First, please explain what you can see in the document. Describe the content, structure, and any information you can read. This will help us understand if the PDF is being processed correctly.

Then, extract the following patient information and respond with a JSON object containing:

Required JSON structure:
{
    "debugInfo": "Brief description of what you can see in the document",
    "firstName": "extracted first name or empty string if not found",
    "lastName": "extracted last name or empty string if not found",
    "dateOfBirth": "extracted date of birth in YYYY-MM-DD format or empty string if not found"
}

EXTRACTION RULES:
- firstName: Look for "First Name", "Given Name", "Patient Name", "Name" fields, or any clear first name indicators
- lastName: Look for "Last Name", "Surname", "Family Name" fields, or the second part of full names
- dateOfBirth: Look for "Date of Birth", "DOB", "Birth Date", "Born" fields in various date formats
- Convert all dates to YYYY-MM-DD format (e.g., 01/15/1990 → 1990-01-15, Jan 15, 1990 → 1990-01-15)
- Be thorough in your search through the entire document
- If you cannot find any of these fields, use an empty string for that field
- Look for variations in field names and formats
- Consider both structured forms and unstructured text

Please analyze the document and respond with the JSON object."#;

/// Document name attached alongside [`STANDARD_PROMPT`].
pub const STANDARD_DOCUMENT_NAME: &str = "patientDocument";

/// Short prompt used for PDF 1.0–1.4, which models tend to choke on when
/// the instructions are long.
pub const SIMPLIFIED_PROMPT: &str = r#"Please analyze this PDF document and extract patient information. Look for names and dates. Convert any date of birth to YYYY-MM-DD. Respond with JSON: {"debugInfo": "what you can see", "firstName": "", "lastName": "", "dateOfBirth": ""}"#;

/// Document name attached alongside [`SIMPLIFIED_PROMPT`].
pub const SIMPLIFIED_DOCUMENT_NAME: &str = "medicalDocument";

/// First fallback after the model reported an empty document.
pub const FALLBACK_SIMPLIFIED_PROMPT: &str = r#"Extract patient information from this PDF. Look for names and dates. Dates must be YYYY-MM-DD. Respond with JSON: {"debugInfo": "description", "firstName": "", "lastName": "", "dateOfBirth": ""}"#;

/// Second fallback; paired with the fallback model when one is configured.
pub const FALLBACK_ALTERNATE_PROMPT: &str = r#"Analyze this PDF and extract patient data. Dates must be YYYY-MM-DD. Respond with JSON: {"debugInfo": "what you see", "firstName": "", "lastName": "", "dateOfBirth": ""}"#;

/// Which primary prompt a document gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptVariant {
    /// PDF 1.5+ (or an unreadable version): detailed rules and synonyms.
    Standard,
    /// PDF 1.0–1.4: one short instruction.
    Simplified,
}

impl PromptVariant {
    pub fn prompt(self) -> &'static str {
        match self {
            PromptVariant::Standard => STANDARD_PROMPT,
            PromptVariant::Simplified => SIMPLIFIED_PROMPT,
        }
    }

    pub fn document_name(self) -> &'static str {
        match self {
            PromptVariant::Standard => STANDARD_DOCUMENT_NAME,
            PromptVariant::Simplified => SIMPLIFIED_DOCUMENT_NAME,
        }
    }
}

/// Build the default fallback sequence.
///
/// `fallback_model` is used by the second attempt; `None` keeps the
/// primary model for both.
pub fn default_fallback_attempts(fallback_model: Option<&str>) -> Vec<Attempt> {
    vec![
        Attempt::new("Simplified prompt", FALLBACK_SIMPLIFIED_PROMPT, "patientFile"),
        Attempt::new("Different model", FALLBACK_ALTERNATE_PROMPT, "medicalRecord")
            .with_model(fallback_model.map(str::to_string)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYS: [&str; 4] = ["debugInfo", "firstName", "lastName", "dateOfBirth"];

    #[test]
    fn every_prompt_requests_all_four_keys() {
        for prompt in [
            STANDARD_PROMPT,
            SIMPLIFIED_PROMPT,
            FALLBACK_SIMPLIFIED_PROMPT,
            FALLBACK_ALTERNATE_PROMPT,
        ] {
            for key in KEYS {
                assert!(prompt.contains(key), "missing {key} in: {prompt}");
            }
            assert!(prompt.contains("YYYY-MM-DD"));
        }
    }

    #[test]
    fn standard_prompt_lists_synonyms() {
        for synonym in ["Given Name", "Surname", "DOB", "Born"] {
            assert!(STANDARD_PROMPT.contains(synonym));
        }
    }

    #[test]
    fn variants_pair_prompt_with_document_name() {
        assert_eq!(PromptVariant::Standard.prompt(), STANDARD_PROMPT);
        assert_eq!(PromptVariant::Standard.document_name(), "patientDocument");
        assert_eq!(PromptVariant::Simplified.prompt(), SIMPLIFIED_PROMPT);
        assert_eq!(PromptVariant::Simplified.document_name(), "medicalDocument");
    }

    #[test]
    fn fallback_model_only_applies_to_second_attempt() {
        let attempts = default_fallback_attempts(Some("anthropic.claude-3-haiku"));
        assert_eq!(attempts.len(), 2);
        assert_eq!(attempts[0].model, None);
        assert_eq!(attempts[1].model.as_deref(), Some("anthropic.claude-3-haiku"));
    }
}
