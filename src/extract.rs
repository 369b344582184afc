//! The extractor: base64 PDF in, [`PatientRecord`] out.
//!
//! ```text
//! Decoding ─▶ HeaderCheck ─┬─▶ Rejected
//!                          └─▶ PromptSelection ─▶ Inference ─▶ (Fallbacks)* ─▶ Parse
//! ```
//!
//! At most `1 + fallback_attempts.len()` calls are made, strictly one after
//! another; a fallback is only issued after the previous reply was read.

use crate::config::{Attempt, ExtractionConfig};
use crate::error::ExtractError;
use crate::inference::{InferenceClient, InferenceRequest};
use crate::output::PatientRecord;
use crate::pipeline::document::{decode_base64, PdfDocument};
use crate::pipeline::parse::{parse_patient_record, preview, signals_empty};
use tracing::{debug, info, warn};

/// `debugInfo` for input that does not start with `%PDF-`.
pub const INVALID_PDF_HEADER: &str = "Invalid PDF file - missing PDF header";

/// Extract patient demographics from base64-encoded PDF content.
///
/// Never fails: decode errors, non-PDF input, inference failures and
/// unparseable replies all come back as a record with empty fields and an
/// explanation in `debug_info`.
pub async fn extract_patient_data(
    client: &dyn InferenceClient,
    pdf_content: &str,
    config: &ExtractionConfig,
) -> PatientRecord {
    info!("Starting extraction: {} base64 chars", pdf_content.len());

    match run(client, pdf_content, config).await {
        Ok(record) => {
            if record.first_name.is_empty() && record.last_name.is_empty() {
                warn!("No patient name extracted");
            }
            if record.date_of_birth.is_empty() {
                warn!("No date of birth extracted");
            }
            record
        }
        Err(e) => {
            warn!("Extraction failed: {}", e);
            PatientRecord::failed(format!("Bedrock Claude PDF support error: {e}"))
        }
    }
}

async fn run(
    client: &dyn InferenceClient,
    pdf_content: &str,
    config: &ExtractionConfig,
) -> Result<PatientRecord, ExtractError> {
    let bytes = decode_base64(pdf_content)?;
    debug!("Decoded {} PDF bytes", bytes.len());

    let Some(document) = PdfDocument::from_bytes(bytes) else {
        warn!("Rejected input without PDF signature");
        return Ok(PatientRecord::failed(INVALID_PDF_HEADER));
    };

    let diag = document.diagnostics();
    debug!(
        header = %diag.header,
        size_bytes = diag.size_bytes,
        has_stream = diag.has_stream,
        has_endstream = diag.has_endstream,
        "PDF diagnostics"
    );
    for warning in diag.structure_warnings() {
        warn!("{}", warning);
    }

    let variant = document.prompt_variant();
    info!(
        version = ?document.version(),
        variant = ?variant,
        model = %config.model,
        "Calling model"
    );

    let primary = InferenceRequest {
        model: &config.model,
        prompt: variant.prompt(),
        document_name: variant.document_name(),
        document: document.bytes(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };
    let mut response = client.converse(&primary).await?;
    debug!(
        "Model replied with {} chars: {}",
        response.len(),
        preview(&response)
    );

    if signals_empty(&response) {
        warn!("Model reports the document as empty or blank, trying fallbacks");
        response = run_fallbacks(client, &document, config, response).await;
    }

    Ok(parse_patient_record(&response))
}

/// Try each fallback in order until a reply stops signalling emptiness.
///
/// Returns the first such reply, or the last reply received if all of them
/// still signal emptiness. Failed calls are logged and skipped.
async fn run_fallbacks(
    client: &dyn InferenceClient,
    document: &PdfDocument,
    config: &ExtractionConfig,
    mut last: String,
) -> String {
    let total = config.fallback_attempts.len();

    for (i, attempt) in config.fallback_attempts.iter().enumerate() {
        let request = fallback_request(attempt, document, config);
        info!(
            "Fallback {}/{}: {} ({})",
            i + 1,
            total,
            attempt.label,
            request.model
        );

        match client.converse(&request).await {
            Ok(reply) => {
                let still_empty = signals_empty(&reply);
                last = reply;
                if !still_empty {
                    info!("Fallback {} succeeded", i + 1);
                    return last;
                }
                warn!("Fallback {} also reported an empty document", i + 1);
            }
            Err(e) => warn!("Fallback {} failed: {}", i + 1, e),
        }
    }

    last
}

fn fallback_request<'a>(
    attempt: &'a Attempt,
    document: &'a PdfDocument,
    config: &'a ExtractionConfig,
) -> InferenceRequest<'a> {
    InferenceRequest {
        model: attempt.model.as_deref().unwrap_or(&config.model),
        prompt: &attempt.prompt,
        document_name: &attempt.document_name,
        document: document.bytes(),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    }
}
