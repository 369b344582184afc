//! The inference capability: send a document plus instructions, get text.
//!
//! The extractor only ever sees the [`InferenceClient`] trait. The caller
//! constructs a client once (per Lambda container, per CLI run) and passes
//! a reference into every invocation, which is also how tests substitute a
//! scripted fake.
//!
//! ## Backends
//!
//! | Backend | Transport | Document part |
//! |---------|-----------|---------------|
//! | [`bedrock::BedrockClient`] | AWS Bedrock Converse API | native `DocumentBlock` (PDF) |
//! | [`provider::ProviderClient`] | any `edgequake_llm` provider | base64 attachment, `application/pdf` |

pub mod bedrock;
pub mod provider;

use crate::error::InferenceError;
use async_trait::async_trait;

pub use bedrock::BedrockClient;
pub use provider::ProviderClient;

/// MIME type of the document part.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// One call to the model: a single user turn carrying the instruction text
/// and the PDF.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    /// Name the document is attached under.
    pub document_name: &'a str,
    /// Raw PDF bytes.
    pub document: &'a [u8],
    pub max_tokens: usize,
    pub temperature: f32,
}

/// A multimodal model that reads a PDF and answers in free text.
#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Issue one call and return the first text part of the reply.
    async fn converse(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError>;
}
