//! # pdf-intake
//!
//! Extract patient demographics (name, date of birth) from PDF documents
//! with a multimodal language model, behind an AWS Lambda style handler.
//!
//! ## Pipeline Overview
//!
//! ```text
//! event
//!  │
//!  ├─ 1. Adapter   preflight / method / body / base64 / JSON / pdfContent
//!  ├─ 2. Document  base64 → bytes, %PDF- signature, version → prompt choice
//!  ├─ 3. Model     one call; up to two rephrased fallbacks on "empty"/"blank"
//!  ├─ 4. Parse     first `{` … last `}` → PatientRecord
//!  └─ 5. Render    HTTP envelope (statusCode/headers/body) or raw mapping
//! ```
//!
//! Only step 1 can reject a request (4xx). Everything after it degrades into
//! a `PatientRecord` whose `debugInfo` explains what went wrong.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf_intake::{handle_event, BedrockClient, ExtractionConfig};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ExtractionConfig::default();
//!     let client = BedrockClient::from_env(&config.region).await;
//!     let event = json!({
//!         "httpMethod": "POST",
//!         "body": r#"{"pdfContent": "JVBERi0xLjcK..."}"#,
//!     });
//!     let response = handle_event(&event, "local", &client, &config).await;
//!     println!("{response}");
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf-processor` binary (clap + anyhow + tracing-subscriber + lambda_runtime) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod inference;
pub mod output;
pub mod pipeline;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{Attempt, ExtractionConfig, ExtractionConfigBuilder};
pub use error::{ConfigError, ExtractError, HandlerError, InferenceError, RequestError};
pub use extract::extract_patient_data;
pub use handler::{handle_event, InboundEnvelope, ResponseMode, PDF_CONTENT_FIELD};
pub use inference::{BedrockClient, InferenceClient, InferenceRequest, ProviderClient};
pub use output::{PatientRecord, ProcessingResult, ResponseEnvelope};
