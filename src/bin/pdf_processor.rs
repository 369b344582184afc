//! Lambda entry point for pdf-intake.
//!
//! Without `--event` this runs the Lambda runtime loop and serves
//! invocations until the container is frozen. With `--event <FILE>` it
//! handles one JSON event from disk and prints the response, which is the
//! quickest way to try a prompt or model change locally.

use anyhow::{Context, Result};
use clap::Parser;
use lambda_runtime::{run, service_fn, LambdaEvent};
use pdf_intake::{
    handle_event, BedrockClient, ExtractionConfig, InferenceClient, ProviderClient,
};
use serde_json::Value;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Serve Lambda invocations (inside the Lambda runtime)
  pdf-processor

  # Handle one API Gateway event locally
  pdf-processor --event events/post.json --pretty

  # Same, through OpenAI instead of Bedrock
  pdf-processor --backend provider --provider openai --model gpt-4.1 --event events/post.json

EVENT SHAPE:
  {"httpMethod": "POST", "isBase64Encoded": false,
   "body": "{\"pdfContent\": \"<base64 PDF>\"}"}
  Omit httpMethod to get the raw result mapping instead of an HTTP envelope.

ENVIRONMENT VARIABLES:
  AWS_REGION                 Bedrock region (default us-west-2)
  PDF_INTAKE_BACKEND         bedrock | provider
  PDF_INTAKE_PROVIDER        edgequake-llm provider name (openai, anthropic, gemini, …)
  PDF_INTAKE_MODEL           Primary model id
  PDF_INTAKE_FALLBACK_MODEL  Model for the second fallback attempt
  RUST_LOG                   Log filter (overrides --verbose)
"#;

/// Extract patient demographics from base64 PDFs with a multimodal LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-processor",
    version,
    about = "Extract patient demographics from base64 PDFs with a multimodal LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Handle a single JSON event from this file instead of serving Lambda.
    #[arg(long)]
    event: Option<PathBuf>,

    /// Correlation token used for `--event` runs.
    #[arg(long, default_value = "local")]
    request_id: String,

    /// Pretty-print the `--event` response.
    #[arg(long)]
    pretty: bool,

    /// Inference backend.
    #[arg(long, env = "PDF_INTAKE_BACKEND", value_enum, default_value = "bedrock")]
    backend: Backend,

    /// edgequake-llm provider name for `--backend provider`; auto-detected
    /// from API key env vars if not set.
    #[arg(long, env = "PDF_INTAKE_PROVIDER")]
    provider: Option<String>,

    /// Primary model id.
    #[arg(long, env = "PDF_INTAKE_MODEL")]
    model: Option<String>,

    /// Model for the second fallback attempt.
    #[arg(long, env = "PDF_INTAKE_FALLBACK_MODEL")]
    fallback_model: Option<String>,

    /// Max output tokens per call.
    #[arg(long, env = "PDF_INTAKE_MAX_TOKENS", default_value_t = 2000)]
    max_tokens: usize,

    /// Sampling temperature (0.0–1.0).
    #[arg(long, env = "PDF_INTAKE_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// AWS region for Bedrock.
    #[arg(long, env = "AWS_REGION", default_value = pdf_intake::config::DEFAULT_REGION)]
    region: String,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDF_INTAKE_VERBOSE")]
    verbose: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Backend {
    Bedrock,
    Provider,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // CloudWatch timestamps every line and does not render ANSI colours.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cli.verbose { "debug" } else { "info" }));
    if cli.event.is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_ansi(false)
            .without_time()
            .init();
    }

    let config = build_config(&cli)?;
    let client = build_client(&cli, &config).await?;

    // ── Local one-shot ───────────────────────────────────────────────────
    if let Some(ref path) = cli.event {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read event from {:?}", path))?;
        let event: Value = serde_json::from_str(&raw)
            .with_context(|| format!("Event file {:?} is not JSON", path))?;

        let response = handle_event(&event, &cli.request_id, client.as_ref(), &config).await;
        let out = if cli.pretty {
            serde_json::to_string_pretty(&response)
        } else {
            serde_json::to_string(&response)
        }
        .context("Failed to serialise response")?;
        println!("{out}");
        return Ok(());
    }

    // ── Lambda runtime ───────────────────────────────────────────────────
    info!(model = %config.model, backend = ?cli.backend, "Serving Lambda invocations");
    let config = Arc::new(config);
    run(service_fn(move |event: LambdaEvent<Value>| {
        let client = Arc::clone(&client);
        let config = Arc::clone(&config);
        async move {
            let response =
                handle_event(&event.payload, &event.context.request_id, client.as_ref(), &config)
                    .await;
            Ok::<Value, lambda_runtime::Error>(response)
        }
    }))
    .await
    .map_err(|e| anyhow::anyhow!(e))
    .context("Lambda runtime stopped")
}

/// Map CLI args to `ExtractionConfig`.
fn build_config(cli: &Cli) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .region(cli.region.clone());

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref model) = cli.fallback_model {
        builder = builder.fallback_model(model.clone());
    }

    builder.build().context("Invalid configuration")
}

/// Construct the inference client once; it is shared by every invocation.
async fn build_client(cli: &Cli, config: &ExtractionConfig) -> Result<Arc<dyn InferenceClient>> {
    match cli.backend {
        Backend::Bedrock => Ok(Arc::new(BedrockClient::from_env(&config.region).await)),
        Backend::Provider => {
            let client = match (&cli.provider, &cli.model) {
                (Some(name), Some(model)) => ProviderClient::from_name(name, model)?,
                (Some(_), None) => anyhow::bail!("--model is required with --provider"),
                (None, _) => ProviderClient::from_env()?,
            };
            Ok(Arc::new(client))
        }
    }
}
