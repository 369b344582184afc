//! Backend for any `edgequake_llm` provider (OpenAI, Anthropic, Gemini, …).
//!
//! The PDF is attached to the user message as a base64 `ImageData` part
//! with MIME type `application/pdf`; providers that accept document input
//! forward it as such.

use super::{InferenceClient, InferenceRequest, PDF_MIME_TYPE};
use crate::error::InferenceError;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::debug;

/// Inference through an `edgequake_llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    /// Provider name and model the client was built with. Known only when
    /// constructed by name; needed to honour per-attempt model overrides.
    named: Option<(String, String)>,
}

impl ProviderClient {
    /// Wrap a pre-built provider. Per-attempt model overrides are ignored.
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            named: None,
        }
    }

    /// Build a provider by name (`"openai"`, `"anthropic"`, …) reading its
    /// API key from the environment.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, InferenceError> {
        Ok(Self {
            provider: create_provider(provider_name, model)?,
            named: Some((provider_name.to_string(), model.to_string())),
        })
    }

    /// Auto-detect a provider from whichever API key is set.
    pub fn from_env() -> Result<Self, InferenceError> {
        let (provider, _embedding) =
            ProviderFactory::from_env().map_err(|e| InferenceError::ProviderNotConfigured {
                provider: "auto".to_string(),
                hint: format!(
                    "No LLM provider could be auto-detected from environment.\n\
                    Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                    Error: {e}"
                ),
            })?;
        Ok(Self::new(provider))
    }

    /// The provider to use for `model`, rebuilding it when the request asks
    /// for a different model than the one we were built with.
    fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, InferenceError> {
        match &self.named {
            Some((name, built_model)) if built_model != model => {
                debug!(provider = %name, model, "Rebuilding provider for model override");
                create_provider(name, model)
            }
            _ => Ok(Arc::clone(&self.provider)),
        }
    }
}

#[async_trait]
impl InferenceClient for ProviderClient {
    async fn converse(&self, request: &InferenceRequest<'_>) -> Result<String, InferenceError> {
        let provider = self.provider_for(request.model)?;

        let document = ImageData::new(STANDARD.encode(request.document), PDF_MIME_TYPE);
        let messages = vec![ChatMessage::user_with_images(
            request.prompt,
            vec![document],
        )];
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            max_tokens: Some(request.max_tokens),
            ..Default::default()
        };

        let response = provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| InferenceError::Invocation(e.to_string()))?;

        debug!(
            "{} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        if response.content.is_empty() {
            return Err(InferenceError::ResponseParse(
                "provider returned no text".into(),
            ));
        }
        Ok(response.content)
    }
}

fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, InferenceError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        InferenceError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
