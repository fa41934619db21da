use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod output;

use formfill_core::{ExtractionMode, FieldDescriptor, Settings, SourceDocument};
use formfill_extract::ExtractionEngine;
use formfill_match::{FieldMatcher, OpenAiClient};
use output::ColorMode;

/// Formfill - extract text from documents and match it onto form fields
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract text from one or more PDFs or images and print it
    Extract {
        /// Paths of the documents to extract
        files: Vec<PathBuf>,

        /// Extraction mode: fast or structured
        #[arg(long, value_parser = parse_mode)]
        mode: Option<ExtractionMode>,
    },

    /// Extract text and match it onto form fields from a JSON file
    Fill {
        /// Paths of the documents to extract
        files: Vec<PathBuf>,

        /// Path to a JSON array of field descriptors
        #[arg(long)]
        fields: PathBuf,

        /// Extraction mode: fast or structured
        #[arg(long, value_parser = parse_mode)]
        mode: Option<ExtractionMode>,

        /// OpenAI API key (overrides config and OPENAI_API_KEY)
        #[arg(long)]
        api_key: Option<String>,

        /// Print mappings as a JSON array instead of text
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Report which extraction backends this machine has
    Capabilities {
        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
}

fn parse_mode(s: &str) -> Result<ExtractionMode, String> {
    match s {
        "fast" => Ok(ExtractionMode::Fast),
        "structured" => Ok(ExtractionMode::Structured),
        other => Err(format!("unknown mode '{other}' (expected fast or structured)")),
    }
}

fn load_documents(files: &[PathBuf]) -> anyhow::Result<Vec<SourceDocument>> {
    anyhow::ensure!(!files.is_empty(), "no input files given");
    files
        .iter()
        .map(|path| {
            let bytes = std::fs::read(path)
                .with_context(|| format!("cannot read {}", path.display()))?;
            let mut doc = SourceDocument::new(bytes);
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                doc = doc.with_name(name);
            }
            Ok(doc)
        })
        .collect()
}

fn extract_text(
    settings: &Settings,
    files: &[PathBuf],
    mode: Option<ExtractionMode>,
) -> anyhow::Result<String> {
    let docs = load_documents(files)?;
    let engine = ExtractionEngine::from_settings(settings);
    let mode = mode.unwrap_or(settings.default_mode);
    engine
        .extract_all(&docs, mode)
        .context("extraction failed")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let settings = Settings::load();

    match cli.command {
        Command::Extract { files, mode } => {
            let text = extract_text(&settings, &files, mode)?;
            if text.trim().is_empty() {
                anyhow::bail!("no text could be extracted");
            }
            println!("{text}");
            Ok(())
        }

        Command::Fill {
            files,
            fields,
            mode,
            api_key,
            json,
            no_color,
        } => {
            let descriptors: Vec<FieldDescriptor> = serde_json::from_slice(
                &std::fs::read(&fields)
                    .with_context(|| format!("cannot read {}", fields.display()))?,
            )
            .with_context(|| format!("{} is not a field descriptor array", fields.display()))?;
            anyhow::ensure!(!descriptors.is_empty(), "field descriptor array is empty");

            let text = extract_text(&settings, &files, mode)?;

            let client = Arc::new(OpenAiClient::new(&settings)?);
            let matcher = FieldMatcher::new(client, settings.openai_api_key.clone());
            let mappings = matcher
                .match_fields(&text, &descriptors, api_key.as_deref())
                .await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&mappings)?);
            } else {
                let mut stdout = std::io::stdout().lock();
                output::print_mappings(&mut stdout, &mappings, ColorMode(!no_color))?;
            }
            Ok(())
        }

        Command::Capabilities { no_color } => {
            let engine = ExtractionEngine::from_settings(&settings);
            let caps = engine.capabilities(settings.default_mode);
            let mut stdout = std::io::stdout().lock();
            output::print_capabilities(&mut stdout, &caps, ColorMode(!no_color))?;
            Ok(())
        }
    }
}
