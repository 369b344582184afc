//! Parse stage: free-form model reply → [`PatientRecord`].
//!
//! Models are asked to describe the document and then emit a JSON object,
//! so the object is usually surrounded by prose or a code fence. We take
//! everything between the first `{` and the last `}` and parse that. Every
//! failure path still yields a well-formed record.

use crate::output::PatientRecord;
use serde_json::{Map, Value};

/// Characters of the raw reply kept in diagnostics.
pub const PREVIEW_CHARS: usize = 200;

/// Tokens that mean the model could not read the document.
const EMPTY_SIGNALS: [&str; 2] = ["empty", "blank"];

/// `true` if the reply says the document looked empty or blank.
///
/// Plain substring match, so "blank form field" also triggers it.
pub fn signals_empty(response: &str) -> bool {
    let lower = response.to_lowercase();
    EMPTY_SIGNALS.iter().any(|token| lower.contains(token))
}

/// First [`PREVIEW_CHARS`] characters of `s`.
pub fn preview(s: &str) -> &str {
    match s.char_indices().nth(PREVIEW_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// The span from the first `{` to the last `}`, or `None` if either brace
/// is missing. A `}` that only appears before the first `{` yields an
/// empty span, which then fails to parse.
pub fn json_span(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')? + 1;
    Some(&response[start..end.max(start)])
}

/// Turn a model reply into a record.
pub fn parse_patient_record(response: &str) -> PatientRecord {
    let Some(span) = json_span(response) else {
        return PatientRecord::failed(format!(
            "No JSON response from Claude. Response: {}",
            preview(response)
        ));
    };

    match serde_json::from_str::<Map<String, Value>>(span) {
        Ok(object) => record_from_object(&object),
        Err(e) => PatientRecord::failed(format!(
            "JSON parsing error: {e}. Response: {}",
            preview(response)
        )),
    }
}

/// Coerce a parsed object into the fixed record shape; missing keys become
/// empty strings and surplus keys are dropped.
pub fn record_from_object(object: &Map<String, Value>) -> PatientRecord {
    let field = |key: &str| object.get(key).map(value_to_string).unwrap_or_default();
    PatientRecord {
        debug_info: field("debugInfo"),
        first_name: field("firstName"),
        last_name: field("lastName"),
        date_of_birth: field("dateOfBirth"),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
