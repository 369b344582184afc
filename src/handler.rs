//! Request adapter: inbound event → validated payload → response.
//!
//! [`handle_event`] takes the raw invocation event, so it serves both API
//! Gateway proxy events (which carry `httpMethod`) and direct invocations
//! such as AppSync resolvers (which do not). The two differ only in how the
//! single [`ProcessingResult`] is rendered; see [`crate::output`].
//!
//! Validation short-circuits on the first violation, in this order:
//! preflight, method, body present, base64, JSON, `pdfContent` present,
//! `pdfContent` is a string. The first two only look at `httpMethod`, so
//! the rest of the envelope may be anything. Anything unexpected after
//! that, including a panic in the pipeline, is caught here and becomes a
//! 500.

use crate::config::ExtractionConfig;
use crate::error::{HandlerError, RequestError};
use crate::extract::extract_patient_data;
use crate::inference::InferenceClient;
use crate::output::{self, ProcessingResult};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::FutureExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::borrow::Cow;
use std::panic::AssertUnwindSafe;
use tracing::{debug, error, info, warn};

/// Key of the base64 PDF in the request body.
pub const PDF_CONTENT_FIELD: &str = "pdfContent";

/// Event key that marks an HTTP (proxy integration) invocation.
const HTTP_METHOD_FIELD: &str = "httpMethod";

/// The body fields of an invocation event. `httpMethod` is checked on the
/// raw event before this is deserialized; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundEnvelope {
    /// Only checked for presence by the front door; unused here.
    pub headers: Option<Value>,
    pub body: Option<String>,
    pub is_base64_encoded: Option<bool>,
}

/// How the caller expects the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// The event has an `httpMethod` key: answer with status, headers, body.
    Http,
    /// No `httpMethod` key: answer with the result mapping itself.
    Direct,
}

impl ResponseMode {
    pub fn detect(event: &Value) -> Self {
        if event.get(HTTP_METHOD_FIELD).is_some() {
            ResponseMode::Http
        } else {
            ResponseMode::Direct
        }
    }
}

enum Outcome {
    Preflight,
    Result(ProcessingResult),
}

/// Handle one invocation. Never fails; every path yields a response.
///
/// `request_id` is the invocation's correlation token and is echoed back as
/// `timestamp` on success.
pub async fn handle_event(
    event: &Value,
    request_id: &str,
    client: &dyn InferenceClient,
    config: &ExtractionConfig,
) -> Value {
    let mode = ResponseMode::detect(event);

    let rendered = match AssertUnwindSafe(process(event, mode, request_id, client, config))
        .catch_unwind()
        .await
    {
        Ok(Ok(outcome)) => render(mode, outcome),
        Ok(Err(e)) => Err(e),
        Err(panic) => Err(HandlerError::Internal(panic_message(panic.as_ref()))),
    };

    rendered.unwrap_or_else(|e| {
        error!("Error processing PDF: {}", e);
        internal_error(mode, &e)
    })
}

async fn process(
    event: &Value,
    mode: ResponseMode,
    request_id: &str,
    client: &dyn InferenceClient,
    config: &ExtractionConfig,
) -> Result<Outcome, HandlerError> {
    let method = event.get(HTTP_METHOD_FIELD);
    if method.and_then(Value::as_str) == Some("OPTIONS") {
        debug!("Answering CORS preflight");
        return Ok(Outcome::Preflight);
    }

    if mode == ResponseMode::Http {
        if let Err(e) = check_method(method) {
            return Ok(reject(e));
        }
    }

    let envelope = InboundEnvelope::deserialize(event)
        .map_err(|e| HandlerError::Internal(format!("malformed event: {e}")))?;

    let pdf_content = match validate(&envelope) {
        Ok(content) => content,
        Err(e) => return Ok(reject(e)),
    };

    info!("Received PDF content of length: {}", pdf_content.len());
    let record = extract_patient_data(client, &pdf_content, config).await;
    if !record.debug_info.is_empty() {
        debug!("Model debug info: {}", record.debug_info);
    }

    Ok(Outcome::Result(ProcessingResult::success(
        pdf_content.chars().count(),
        request_id,
        record,
    )))
}

fn reject(e: RequestError) -> Outcome {
    warn!(status = e.status_code(), "Rejected request: {}", e);
    Outcome::Result(ProcessingResult::failure(e.status_code(), e.to_string()))
}

/// Only `POST` is accepted. A missing, `null` or non-string method is
/// rejected like any other.
pub fn check_method(method: Option<&Value>) -> Result<(), RequestError> {
    match method {
        Some(Value::String(m)) if m == "POST" => Ok(()),
        Some(Value::String(m)) => Err(RequestError::MethodNotAllowed { method: m.clone() }),
        Some(Value::Null) | None => Err(RequestError::MethodNotAllowed {
            method: String::new(),
        }),
        Some(other) => Err(RequestError::MethodNotAllowed {
            method: other.to_string(),
        }),
    }
}

/// Run the body checks and return the `pdfContent` string.
pub fn validate(envelope: &InboundEnvelope) -> Result<String, RequestError> {
    let body = envelope
        .body
        .as_deref()
        .filter(|b| !b.is_empty())
        .ok_or(RequestError::MissingBody)?;

    let body: Cow<'_, str> = if envelope.is_base64_encoded.unwrap_or(false) {
        Cow::Owned(decode_body(body)?)
    } else {
        Cow::Borrowed(body)
    };

    let payload: Value =
        serde_json::from_str(&body).map_err(|e| RequestError::InvalidJson(e.to_string()))?;

    pdf_content(&payload).map(str::to_string)
}

/// Base64 → bytes → UTF-8.
fn decode_body(body: &str) -> Result<String, RequestError> {
    let bytes = STANDARD
        .decode(body)
        .map_err(|e| RequestError::BodyDecode(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| RequestError::BodyDecode(e.to_string()))
}

/// Pull `pdfContent` out of a parsed body. Falsy values (`null`, `""`,
/// `false`, `0`, `[]`, `{}`) count as missing.
pub fn pdf_content(payload: &Value) -> Result<&str, RequestError> {
    let value = payload
        .get(PDF_CONTENT_FIELD)
        .filter(|v| is_truthy(v))
        .ok_or(RequestError::MissingField {
            field: PDF_CONTENT_FIELD,
        })?;

    value.as_str().ok_or(RequestError::FieldNotString {
        field: PDF_CONTENT_FIELD,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render(mode: ResponseMode, outcome: Outcome) -> Result<Value, HandlerError> {
    match (outcome, mode) {
        (Outcome::Preflight, _) => Ok(serde_json::to_value(output::preflight())?),
        (Outcome::Result(result), ResponseMode::Http) => {
            Ok(serde_json::to_value(output::render_http(&result)?)?)
        }
        (Outcome::Result(result), ResponseMode::Direct) => Ok(output::render_direct(&result)?),
    }
}

fn internal_error(mode: ResponseMode, e: &HandlerError) -> Value {
    let message = format!("Internal server error: {e}");
    render(
        mode,
        Outcome::Result(ProcessingResult::failure(500, message.clone())),
    )
    .unwrap_or_else(|_| json!({ "success": false, "error": message }))
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic in request pipeline".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(body: Option<&str>, b64: bool) -> InboundEnvelope {
        InboundEnvelope {
            headers: None,
            body: body.map(str::to_string),
            is_base64_encoded: Some(b64),
        }
    }

    #[test]
    fn detects_mode_by_key_presence() {
        assert_eq!(
            ResponseMode::detect(&json!({"httpMethod": "POST"})),
            ResponseMode::Http
        );
        assert_eq!(
            ResponseMode::detect(&json!({"httpMethod": null})),
            ResponseMode::Http
        );
        assert_eq!(ResponseMode::detect(&json!({"body": "{}"})), ResponseMode::Direct);
        assert_eq!(ResponseMode::detect(&json!("string event")), ResponseMode::Direct);
    }

    #[test]
    fn only_post_passes_method_check() {
        assert_eq!(check_method(Some(&json!("POST"))), Ok(()));
        for method in [
            Some(json!("GET")),
            Some(json!("post")),
            Some(json!(null)),
            Some(json!(5)),
            Some(json!({"verb": "POST"})),
            None,
        ] {
            let err = check_method(method.as_ref()).unwrap_err();
            assert_eq!(err.status_code(), 405, "method: {method:?}");
        }
    }

    #[test]
    fn non_string_method_is_reported_as_json() {
        assert_eq!(
            check_method(Some(&json!(5))),
            Err(RequestError::MethodNotAllowed { method: "5".into() })
        );
    }

    #[test]
    fn body_checks_ignore_method() {
        let body = r#"{"pdfContent": "JVBERi0="}"#;
        assert_eq!(validate(&envelope(Some(body), false)).unwrap(), "JVBERi0=");
    }

    #[test]
    fn empty_body_is_missing() {
        for body in [None, Some("")] {
            assert_eq!(
                validate(&envelope(body, false)),
                Err(RequestError::MissingBody)
            );
        }
    }

    #[test]
    fn base64_body_is_decoded() {
        let body = STANDARD.encode(r#"{"pdfContent": "abc"}"#);
        assert_eq!(
            validate(&envelope(Some(&body), true)).unwrap(),
            "abc"
        );
    }

    #[test]
    fn bad_base64_body_is_rejected() {
        let err = validate(&envelope(Some("***"), true)).unwrap_err();
        assert!(matches!(err, RequestError::BodyDecode(_)));
        assert!(err.to_string().starts_with("Failed to decode request body: "));
    }

    #[test]
    fn non_utf8_body_is_rejected() {
        let body = STANDARD.encode([0xff, 0xfe, 0xfd]);
        let err = validate(&envelope(Some(&body), true)).unwrap_err();
        assert!(matches!(err, RequestError::BodyDecode(_)));
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = validate(&envelope(Some("{nope"), false)).unwrap_err();
        assert!(err.to_string().starts_with("Invalid JSON in request body: "));
    }

    #[test]
    fn falsy_pdf_content_counts_as_missing() {
        for payload in [
            json!({}),
            json!({"pdfContent": null}),
            json!({"pdfContent": ""}),
            json!({"pdfContent": false}),
            json!({"pdfContent": 0}),
            json!({"pdfContent": []}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(
                pdf_content(&payload),
                Err(RequestError::MissingField {
                    field: PDF_CONTENT_FIELD
                }),
                "payload: {payload}"
            );
        }
    }

    #[test]
    fn non_string_pdf_content_is_rejected() {
        for payload in [
            json!({"pdfContent": 42}),
            json!({"pdfContent": true}),
            json!({"pdfContent": ["a"]}),
        ] {
            assert_eq!(
                pdf_content(&payload),
                Err(RequestError::FieldNotString {
                    field: PDF_CONTENT_FIELD
                })
            );
        }
    }

    struct Unreachable;

    #[async_trait::async_trait]
    impl InferenceClient for Unreachable {
        async fn converse(
            &self,
            _request: &crate::inference::InferenceRequest<'_>,
        ) -> Result<String, crate::error::InferenceError> {
            unreachable!("no model call expected")
        }
    }

    #[test]
    fn preflight_skips_validation() {
        let event = json!({"httpMethod": "OPTIONS", "body": 7, "isBase64Encoded": "yes"});
        let response = tokio_test::block_on(handle_event(
            &event,
            "req",
            &Unreachable,
            &ExtractionConfig::default(),
        ));
        assert_eq!(response["statusCode"], 200);
        assert_eq!(response["body"], "");
    }

    #[test]
    fn direct_failure_is_raw_mapping() {
        let response = tokio_test::block_on(handle_event(
            &json!({}),
            "req",
            &Unreachable,
            &ExtractionConfig::default(),
        ));
        assert_eq!(
            response,
            json!({"success": false, "error": "No PDF content provided in request body."})
        );
    }

    #[test]
    fn panic_message_handles_both_payload_types() {
        let s: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(s.as_ref()), "static");
        let s: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(s.as_ref()), "owned");
    }
}
