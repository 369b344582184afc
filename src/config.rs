//! Configuration types for patient-data extraction.
//!
//! All extraction behaviour is controlled through [`ExtractionConfig`],
//! built via its [`ExtractionConfigBuilder`]. The config is immutable once
//! built and shared read-only across invocations.

use crate::error::ConfigError;
use crate::prompts::default_fallback_attempts;
use serde::{Deserialize, Serialize};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "anthropic.claude-3-5-sonnet-20241022-v2:0";

/// AWS region used by the Bedrock backend when none is configured.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Configuration for a patient-data extraction.
///
/// # Example
/// ```rust
/// use pdf_intake::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("anthropic.claude-3-5-sonnet-20241022-v2:0")
///     .max_tokens(2000)
///     .temperature(0.1)
///     .build()
///     .unwrap();
/// assert_eq!(config.fallback_attempts.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Model identifier for the primary call.
    pub model: String,

    /// Maximum tokens the model may generate per call. Default: 2000.
    ///
    /// The reply is a short description plus a four-key object; 2000 leaves
    /// room for a verbose description without truncating the JSON.
    pub max_tokens: usize,

    /// Sampling temperature. Default: 0.1.
    ///
    /// Kept near zero so repeated runs over the same document agree.
    pub temperature: f32,

    /// Attempts tried in order when the model reports an empty document.
    /// Default: two rephrased prompts, see
    /// [`crate::prompts::default_fallback_attempts`].
    pub fallback_attempts: Vec<Attempt>,

    /// AWS region for the Bedrock backend. Default: `us-west-2`.
    pub region: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            temperature: 0.1,
            fallback_attempts: default_fallback_attempts(None),
            region: DEFAULT_REGION.to_string(),
        }
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
            fallback_model: None,
            custom_attempts: false,
        }
    }
}

/// One prompt/model variant of the fallback sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    /// Human-readable label, used in logs.
    pub label: String,
    /// Instruction text sent with the document.
    pub prompt: String,
    /// Name the document is attached under.
    pub document_name: String,
    /// Model override; `None` uses [`ExtractionConfig::model`].
    pub model: Option<String>,
}

impl Attempt {
    pub fn new(
        label: impl Into<String>,
        prompt: impl Into<String>,
        document_name: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            prompt: prompt.into(),
            document_name: document_name.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
    fallback_model: Option<String>,
    custom_attempts: bool,
}

impl ExtractionConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Model used by the "Different model" fallback attempt.
    ///
    /// Ignored when [`Self::fallback_attempts`] replaces the default list.
    pub fn fallback_model(mut self, model: impl Into<String>) -> Self {
        self.fallback_model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 1.0);
        self
    }

    pub fn fallback_attempts(mut self, attempts: Vec<Attempt>) -> Self {
        self.config.fallback_attempts = attempts;
        self.custom_attempts = true;
        self
    }

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.region = region.into();
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(mut self) -> Result<ExtractionConfig, ConfigError> {
        if !self.custom_attempts {
            self.config.fallback_attempts =
                default_fallback_attempts(self.fallback_model.as_deref());
        }

        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if c.max_tokens == 0 {
            return Err(ConfigError::Invalid("max_tokens must be ≥ 1".into()));
        }
        if c.region.trim().is_empty() {
            return Err(ConfigError::Invalid("region must not be empty".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = ExtractionConfig::default();
        assert_eq!(c.model, DEFAULT_MODEL);
        assert_eq!(c.max_tokens, 2000);
        assert_eq!(c.temperature, 0.1);
        assert_eq!(c.region, "us-west-2");
        assert_eq!(c.fallback_attempts.len(), 2);
    }

    #[test]
    fn temperature_is_clamped() {
        let c = ExtractionConfig::builder().temperature(3.0).build().unwrap();
        assert_eq!(c.temperature, 1.0);
    }

    #[test]
    fn fallback_model_lands_on_second_attempt() {
        let c = ExtractionConfig::builder()
            .fallback_model("anthropic.claude-3-haiku-20240307-v1:0")
            .build()
            .unwrap();
        assert_eq!(c.fallback_attempts[0].model, None);
        assert_eq!(
            c.fallback_attempts[1].model.as_deref(),
            Some("anthropic.claude-3-haiku-20240307-v1:0")
        );
    }

    #[test]
    fn custom_attempts_replace_defaults() {
        let c = ExtractionConfig::builder()
            .fallback_model("ignored")
            .fallback_attempts(vec![Attempt::new("only", "prompt", "doc")])
            .build()
            .unwrap();
        assert_eq!(c.fallback_attempts.len(), 1);
        assert_eq!(c.fallback_attempts[0].model, None);
    }

    #[test]
    fn empty_model_is_rejected() {
        let err = ExtractionConfig::builder().model("  ").build().unwrap_err();
        assert!(err.to_string().contains("model"));
    }

    #[test]
    fn zero_max_tokens_is_rejected() {
        assert!(ExtractionConfig::builder().max_tokens(0).build().is_err());
    }
}
