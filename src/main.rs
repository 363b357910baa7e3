use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tagsmith::{
    ExecutorConfig, ProviderConfig, ProviderConfigBuilder, ReqwestTransport, RequestExecutor,
    TagError, TagGenerationService, merge_tags,
};
use tracing_subscriber::EnvFilter;

/// tagsmith - suggest tags for a document using a text-generation provider
#[derive(Parser)]
#[command(name = "tagsmith")]
#[command(about = "Suggest tags for a document, reusing your existing vocabulary")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Suggest tags for a document
    Suggest(SuggestCommand),
    /// Check that the configured provider is reachable
    Check,
}

/// Suggest tags for a document
#[derive(Parser)]
struct SuggestCommand {
    /// Path of the document to tag
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Comma-separated existing tags to prefer
    #[arg(short, long, value_name = "TAGS")]
    existing: Option<String>,

    /// File listing existing tags, one per line
    #[arg(long, value_name = "PATH")]
    existing_file: Option<PathBuf>,

    /// Comma-separated tags the document already carries
    #[arg(short, long, value_name = "TAGS")]
    current: Option<String>,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_logging();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Suggest(cmd) => handle_suggest(cmd).await,
        Commands::Check => handle_check().await,
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Installs a stderr subscriber filtered by `RUST_LOG`, defaulting to `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Configuration problems are user errors; everything else is internal or remote.
fn is_user_error(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<TagError>(),
        Some(TagError::Configuration(_))
    )
}

/// Builds the service and provider config from the environment.
fn load() -> Result<(TagGenerationService, ProviderConfig)> {
    let config = ProviderConfigBuilder::from_env()?.build();
    let executor_config = ExecutorConfig::from_env()?;
    let transport = ReqwestTransport::new()?;
    let executor = RequestExecutor::new(Arc::new(transport), executor_config);
    Ok((TagGenerationService::new(executor), config))
}

async fn handle_suggest(cmd: &SuggestCommand) -> Result<()> {
    let content = std::fs::read_to_string(&cmd.file)
        .with_context(|| format!("Failed to read document: {}", cmd.file.display()))?;

    let mut existing = cmd.existing.as_deref().map(parse_tags).unwrap_or_default();
    if let Some(path) = &cmd.existing_file {
        existing.extend(read_tag_file(path)?);
    }
    let current = cmd.current.as_deref().map(parse_tags).unwrap_or_default();

    let (service, config) = load()?;
    let generated = service.generate(&content, &existing, &config).await?;

    println!("{}", merge_tags(&current, &generated).join(", "));
    Ok(())
}

async fn handle_check() -> Result<()> {
    let (service, config) = load()?;
    service.test_connectivity(&config).await?;
    println!(
        "OK: {} ({}) at {}",
        config.resolved_kind(),
        config.model(),
        config.base_url()
    );
    Ok(())
}

/// Reads one tag per line, skipping blank lines and a leading '#'.
fn read_tag_file(path: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tag file: {}", path.display()))?;
    Ok(raw
        .lines()
        .map(|line| line.trim().trim_start_matches('#'))
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

/// Parses comma-separated tags from a string.
///
/// Splits on commas, trims whitespace from each tag, and filters out empty strings.
fn parse_tags(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
