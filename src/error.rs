//! Error types for the pdf-intake library.
//!
//! Errors are split by where they are absorbed:
//!
//! * [`RequestError`]: the inbound envelope is unusable (wrong method, bad
//!   body, missing field). The request adapter turns these into 4xx
//!   responses; the `Display` text is exactly what the caller sees in
//!   `error`.
//!
//! * [`InferenceError`] / [`ExtractError`]: the remote model or the document
//!   itself failed. These never leave the extractor; they are rendered into
//!   [`crate::output::PatientRecord::debug_info`] instead.
//!
//! * [`HandlerError`]: anything else. Caught once at the top of the handler
//!   and mapped to a 500.

use thiserror::Error;

/// Validation failures of the inbound request envelope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    /// Anything other than `POST` (preflight is answered before validation).
    #[error("Method not allowed. Only POST requests are supported.")]
    MethodNotAllowed { method: String },

    /// The envelope carried no body, or an empty one.
    #[error("No PDF content provided in request body.")]
    MissingBody,

    /// `isBase64Encoded` was set but the body is not base64 or not UTF-8.
    #[error("Failed to decode request body: {0}")]
    BodyDecode(String),

    /// The (decoded) body is not JSON.
    #[error("Invalid JSON in request body: {0}")]
    InvalidJson(String),

    /// The JSON body has no usable `pdfContent` field.
    #[error("No PDF content found in request. Expected \"{field}\" field.")]
    MissingField { field: &'static str },

    /// `pdfContent` is present but is not a string.
    #[error("PDF content must be a string.")]
    FieldNotString { field: &'static str },
}

impl RequestError {
    /// HTTP status code reported for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            RequestError::MethodNotAllowed { .. } => 405,
            _ => 400,
        }
    }
}

/// Failures talking to the inference capability.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// The call itself failed (network, throttling, service error).
    #[error("{0}")]
    Invocation(String),

    /// The call succeeded but the reply carried no usable text.
    #[error("Unexpected model response: {0}")]
    ResponseParse(String),

    /// The configured provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },
}

/// Failures inside the extractor, before they are folded into a record.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// `pdfContent` is not valid base64.
    #[error("{0}")]
    Decode(#[from] base64::DecodeError),

    /// The primary inference call failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}

/// Unanticipated failures caught at the top of the handler.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    Internal(String),

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Builder validation failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
