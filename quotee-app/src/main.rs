//! Quotee: multi-provider AI quote validation.
//!
//! Sends a quote-review prompt to OpenAI, Google Gemini and/or Anthropic and prints
//! the reply as text or JSON.

mod config;
mod consult;
mod render;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use config::QuoteeConfig;
use consult::{Consultation, UnknownProvider, resolve_system_prompt};
use quotee_llm::{Credentials, ProviderRegistry, QueryRequest, build_http_client};
use render::ConsoleRenderer;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

const EXIT_OK: u8 = 0;
const EXIT_PROVIDER_FAILED: u8 = 1;

const EXAMPLES: &str = "\
Examples:
  quotee --provider google \"Review digital signage HaaS at $150/month\"
  quotee --provider openai \"Validate managed services at $150/user\"
  quotee --consult \"Multi-provider validation of quote\"
  quotee --list-providers";

#[derive(Debug, Parser)]
#[command(
    name = "quotee",
    version,
    about = "Quotee - AI quote validation",
    after_help = EXAMPLES
)]
struct Cli {
    /// Quote details to validate.
    #[arg(
        required_unless_present = "list_providers",
        value_parser = clap::builder::NonEmptyStringValueParser::new()
    )]
    prompt: Option<String>,

    /// AI provider to use: openai|gpt, google|gemini, anthropic|claude.
    #[arg(short, long, value_name = "ALIAS")]
    provider: Option<String>,

    /// Query every provider in turn.
    #[arg(long)]
    consult: bool,

    /// Custom system prompt.
    #[arg(short, long, value_name = "TEXT")]
    system: Option<String>,

    /// JSON output.
    #[arg(long)]
    json: bool,

    /// List available providers and whether their API keys are set.
    #[arg(long)]
    list_providers: bool,

    /// Config file (default: ~/.quotee/config.toml).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let dotenv = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "failed to load .env"),
    }

    let cli = Cli::parse();
    let credentials = Credentials::from_env();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut err = stderr.lock();

    let code = match run(cli, credentials, &mut out, &mut err).await {
        Ok(code) => code,
        Err(e) => match e.downcast::<UnknownProvider>() {
            Ok(unknown) => Cli::command()
                .error(ErrorKind::InvalidValue, unknown)
                .exit(),
            Err(e) => return Err(e),
        },
    };
    Ok(ExitCode::from(code))
}

async fn run<O: Write, E: Write>(
    cli: Cli,
    credentials: Credentials,
    out: &mut O,
    err: &mut E,
) -> anyhow::Result<u8> {
    if cli.list_providers {
        render::write_provider_listing(out, &credentials)?;
        return Ok(EXIT_OK);
    }

    let Some(prompt) = cli.prompt else {
        Cli::command()
            .error(ErrorKind::MissingRequiredArgument, "Prompt required")
            .exit()
    };

    let cfg = QuoteeConfig::load(cli.config).await?;
    let registry = ProviderRegistry::from_settings(
        &credentials,
        |provider| cfg.settings_for(provider),
        build_http_client(cfg.request_timeout()),
    );
    let system = resolve_system_prompt(cli.system.as_deref(), cfg.system_prompt());
    let consultation = Consultation::new(&registry, QueryRequest::new(prompt, Some(system)));

    if cli.consult {
        let mut renderer = ConsoleRenderer::new(&mut *out);
        renderer.banner();
        let report = consultation.consult(&mut renderer).await;
        renderer.finish()?;
        if cli.json {
            render::write_json(out, &report)?;
        }
        return Ok(EXIT_OK);
    }

    let alias = cli
        .provider
        .map(|p| p.trim().to_ascii_lowercase())
        .unwrap_or_else(|| cfg.default_provider());
    let result = consultation.single(&alias).await?;

    if cli.json {
        render::write_json(out, &result)?;
        return Ok(EXIT_OK);
    }
    if render::write_single_text(out, err, &result)? {
        Ok(EXIT_OK)
    } else {
        Ok(EXIT_PROVIDER_FAILED)
    }
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new("warn,quotee=info,quotee_app=info,quotee_llm=info"),
    };
    let log_format = std::env::var("QUOTEE_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(true);

    match log_format.as_str() {
        "json" => builder
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .init(),
        "pretty" => builder.pretty().init(),
        "compact" => builder.compact().init(),
        other => {
            return Err(anyhow::anyhow!(
                "unsupported QUOTEE_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let payload = panic_payload_to_string(panic_info.payload());
        tracing::error!(
            panic_location = %location,
            panic_payload = %payload,
            "panic captured"
        );
        default_hook(panic_info);
    }));
}

fn panic_payload_to_string(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        return msg.to_string();
    }
    if let Some(msg) = payload.downcast_ref::<String>() {
        return msg.clone();
    }
    "non-string panic payload".to_string()
}
