//! Output types: the extracted record and the two response shapes.
//!
//! A request produces exactly one [`ProcessingResult`]. How it reaches the
//! caller depends on how the caller invoked us:
//!
//! * HTTP callers (API Gateway proxy events) get a [`ResponseEnvelope`]
//!   from [`render_http`]: status code, CORS headers, JSON body.
//! * Direct callers (no `httpMethod` in the event) get the body mapping
//!   itself from [`render_direct`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Patient demographics extracted from a document.
///
/// Every field is always present. Anything the model could not find is an
/// empty string; failures are described in `debug_info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientRecord {
    /// What the model reported seeing, or why extraction failed.
    pub debug_info: String,
    pub first_name: String,
    pub last_name: String,
    /// `YYYY-MM-DD` when the model followed instructions, else free text.
    pub date_of_birth: String,
}

impl PatientRecord {
    /// A record carrying only a diagnostic message.
    pub fn failed(debug_info: impl Into<String>) -> Self {
        Self {
            debug_info: debug_info.into(),
            ..Self::default()
        }
    }

    /// `true` when no demographic field was extracted.
    pub fn is_blank(&self) -> bool {
        self.first_name.is_empty() && self.last_name.is_empty() && self.date_of_birth.is_empty()
    }
}

/// Outcome of one invocation, before it is shaped for the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessingResult {
    Success(SuccessBody),
    Failure { status: u16, error: String },
}

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessBody {
    pub success: bool,
    pub message: String,
    pub content_length: usize,
    /// Correlation token of the invocation (Lambda request id).
    pub timestamp: String,
    pub debug_info: String,
    pub patient_data: PatientRecord,
}

/// Body of a failed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
}

impl ProcessingResult {
    pub fn success(
        content_length: usize,
        request_id: impl Into<String>,
        patient_data: PatientRecord,
    ) -> Self {
        let debug_info = if patient_data.debug_info.is_empty() {
            "No debug info available".to_string()
        } else {
            patient_data.debug_info.clone()
        };
        ProcessingResult::Success(SuccessBody {
            success: true,
            message: "PDF received and processed successfully".to_string(),
            content_length,
            timestamp: request_id.into(),
            debug_info,
            patient_data,
        })
    }

    pub fn failure(status: u16, error: impl Into<String>) -> Self {
        ProcessingResult::Failure {
            status,
            error: error.into(),
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ProcessingResult::Success(_) => 200,
            ProcessingResult::Failure { status, .. } => *status,
        }
    }

    /// The logical body as a JSON value.
    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            ProcessingResult::Success(body) => serde_json::to_value(body),
            ProcessingResult::Failure { error, .. } => serde_json::to_value(FailureBody {
                success: false,
                error: error.clone(),
            }),
        }
    }
}

/// HTTP-shaped response for proxy integrations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

/// Headers on every JSON response.
pub fn json_headers() -> BTreeMap<String, String> {
    [
        ("Content-Type", "application/json"),
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS, GET"),
        (
            "Access-Control-Allow-Headers",
            "Content-Type, X-Amz-Date, Authorization, X-Api-Key, X-Amz-Security-Token",
        ),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Headers on the CORS preflight response.
pub fn preflight_headers() -> BTreeMap<String, String> {
    [
        ("Access-Control-Allow-Origin", "*"),
        ("Access-Control-Allow-Methods", "POST, OPTIONS"),
        ("Access-Control-Allow-Headers", "Content-Type, Authorization"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Response to an `OPTIONS` request.
pub fn preflight() -> ResponseEnvelope {
    ResponseEnvelope {
        status_code: 200,
        headers: preflight_headers(),
        body: String::new(),
    }
}

/// Shape a result for an HTTP caller.
pub fn render_http(result: &ProcessingResult) -> Result<ResponseEnvelope, serde_json::Error> {
    Ok(ResponseEnvelope {
        status_code: result.status_code(),
        headers: json_headers(),
        body: serde_json::to_string(&result.to_value()?)?,
    })
}

/// Shape a result for a direct (non-HTTP) caller.
pub fn render_direct(result: &ProcessingResult) -> Result<Value, serde_json::Error> {
    result.to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn jane() -> PatientRecord {
        PatientRecord {
            debug_info: "A lab report".into(),
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            date_of_birth: "1990-01-15".into(),
        }
    }

    #[test]
    fn record_serialises_with_camel_case_keys() {
        let v = serde_json::to_value(jane()).unwrap();
        assert_eq!(
            v,
            json!({
                "debugInfo": "A lab report",
                "firstName": "Jane",
                "lastName": "Doe",
                "dateOfBirth": "1990-01-15"
            })
        );
    }

    #[test]
    fn failed_record_is_blank() {
        let r = PatientRecord::failed("boom");
        assert!(r.is_blank());
        assert_eq!(r.debug_info, "boom");
    }

    #[test]
    fn success_body_shape() {
        let result = ProcessingResult::success(12, "req-1", jane());
        let v = render_direct(&result).unwrap();
        assert_eq!(v["success"], json!(true));
        assert_eq!(v["message"], json!("PDF received and processed successfully"));
        assert_eq!(v["contentLength"], json!(12));
        assert_eq!(v["timestamp"], json!("req-1"));
        assert_eq!(v["debugInfo"], json!("A lab report"));
        assert_eq!(v["patientData"]["firstName"], json!("Jane"));
        assert!(v.get("error").is_none());
    }

    #[test]
    fn empty_debug_info_gets_placeholder() {
        let result = ProcessingResult::success(1, "req", PatientRecord::default());
        let v = render_direct(&result).unwrap();
        assert_eq!(v["debugInfo"], json!("No debug info available"));
        assert_eq!(v["patientData"]["debugInfo"], json!(""));
    }

    #[test]
    fn failure_renders_for_both_callers() {
        let result = ProcessingResult::failure(400, "nope");
        assert_eq!(
            render_direct(&result).unwrap(),
            json!({"success": false, "error": "nope"})
        );

        let http = render_http(&result).unwrap();
        assert_eq!(http.status_code, 400);
        assert_eq!(http.headers["Content-Type"], "application/json");
        assert_eq!(http.headers["Access-Control-Allow-Origin"], "*");
        let body: Value = serde_json::from_str(&http.body).unwrap();
        assert_eq!(body, json!({"success": false, "error": "nope"}));
    }

    #[test]
    fn envelope_uses_status_code_key() {
        let v = serde_json::to_value(preflight()).unwrap();
        assert_eq!(v["statusCode"], json!(200));
        assert_eq!(v["body"], json!(""));
        assert_eq!(v["headers"].as_object().unwrap().len(), 3);
    }
}
