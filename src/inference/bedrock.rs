//! AWS Bedrock backend using the Converse API.
//!
//! The PDF travels as a `DocumentBlock`, so the model reads the document
//! natively (text layer and page images) instead of a pre-extracted text
//! dump.

use super::{InferenceClient, InferenceRequest};
use crate::error::InferenceError;
use async_trait::async_trait;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, DocumentBlock, DocumentFormat, DocumentSource,
    InferenceConfiguration, Message,
};
use aws_sdk_bedrockruntime::error::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::Blob;
use std::error::Error as StdError;
use std::fmt;
use tracing::{debug, info};

/// Bedrock runtime client. Cheap to clone; reuses its connection pool.
#[derive(Debug, Clone)]
pub struct BedrockClient {
    client: aws_sdk_bedrockruntime::Client,
}

impl BedrockClient {
    /// Wrap an already-loaded AWS configuration.
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_bedrockruntime::Client::new(config),
        }
    }

    /// Load credentials from the environment (Lambda role, profile, env
    /// vars) and pin the given region.
    pub async fn from_env(region: &str) -> Self {
        let config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;
        info!(region, "Bedrock client initialised");
        Self::new(&config)
    }
}

#[async_trait]
impl InferenceClient for BedrockClient {
    async fn converse(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError> {
        let document = DocumentBlock::builder()
            .format(DocumentFormat::Pdf)
            .name(sanitize_document_name(request.document_name))
            .source(DocumentSource::Bytes(Blob::new(request.document)))
            .build()
            .map_err(|e| InferenceError::Invocation(e.to_string()))?;

        let message = Message::builder()
            .role(ConversationRole::User)
            .content(ContentBlock::Text(request.prompt.to_string()))
            .content(ContentBlock::Document(document))
            .build()
            .map_err(|e| InferenceError::Invocation(e.to_string()))?;

        let inference_config = InferenceConfiguration::builder()
            .max_tokens(i32::try_from(request.max_tokens).unwrap_or(i32::MAX))
            .temperature(request.temperature)
            .build();

        debug!(
            model = request.model,
            document_bytes = request.document.len(),
            "Calling Bedrock converse"
        );

        let response = self
            .client
            .converse()
            .model_id(request.model)
            .messages(message)
            .inference_config(inference_config)
            .send()
            .await
            .map_err(invocation_error)?;

        let output = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| InferenceError::ResponseParse("no message in response".into()))?;

        output
            .content()
            .iter()
            .find_map(|block| match block {
                ContentBlock::Text(text) => Some(text.clone()),
                _ => None,
            })
            .ok_or_else(|| InferenceError::ResponseParse("no text content in message".into()))
    }
}

/// Flatten an SDK error and its whole source chain into one message.
/// Dispatch, timeout and response failures carry their cause only in the
/// chain.
fn invocation_error<E, R>(err: SdkError<E, R>) -> InferenceError
where
    E: StdError + 'static,
    R: fmt::Debug,
{
    InferenceError::Invocation(DisplayErrorContext(err).to_string())
}

/// Bedrock document names allow only alphanumerics, single spaces, hyphens,
/// parentheses and square brackets.
fn sanitize_document_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '(' | ')' | '[' | ']') {
                c
            } else {
                ' '
            }
        })
        .collect();

    let collapsed = mapped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "document".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_cause_survives_in_message() {
        let err: SdkError<std::io::Error, ()> = SdkError::timeout_error(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "read timed out after 30s",
        ));
        let message = invocation_error(err).to_string();
        assert!(message.contains("read timed out after 30s"), "{message}");
    }

    #[test]
    fn construction_failure_cause_survives_in_message() {
        let err: SdkError<std::io::Error, ()> =
            SdkError::construction_failure("model id must not be empty");
        let message = invocation_error(err).to_string();
        assert!(message.contains("model id must not be empty"), "{message}");
    }

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(sanitize_document_name("patientDocument"), "patientDocument");
    }

    #[test]
    fn disallowed_chars_become_single_spaces() {
        assert_eq!(sanitize_document_name("lab_report..v2.pdf"), "lab report v2 pdf");
    }

    #[test]
    fn empty_name_gets_placeholder() {
        assert_eq!(sanitize_document_name("__"), "document");
    }
}
