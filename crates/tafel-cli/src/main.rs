//! Tafel CLI

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tafel::{
    Fragment, GridLayout, TableConfig, TableParser, fragments_from_json, fragments_from_paddle_json,
    fragments_from_tsv, table_to_markdown,
};
use tracing_subscriber::EnvFilter;

/// OCR output format of the input file
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// Pick from the file extension, then the content
    Auto,
    /// Tesseract TSV
    Tsv,
    /// PaddleOCR JSON (`[[quad, [text, conf]], ...]`)
    Paddle,
    /// Native fragment JSON (`[{"text", "confidence", "bbox"}, ...]`)
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Markdown table
    Markdown,
    /// Table and quality metrics as JSON
    Json,
}

#[derive(Parser)]
#[command(name = "tafel")]
#[command(version, about = "Reconstruct tables from OCR text fragments", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a table from an OCR output file
    Parse {
        /// OCR output file
        input: PathBuf,

        /// Input format
        #[arg(short, long, value_enum, default_value = "auto")]
        format: InputFormat,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        output: OutputFormat,

        /// Configuration file (.toml, .yaml, .yml or .json); defaults to a discovered tafel.toml
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Drop fragments below this confidence (0.0-1.0) before reconstruction
        #[arg(long)]
        min_confidence: Option<f64>,

        /// Split fragment text at column separators (tab, double space, | ; ,)
        #[arg(long)]
        split_separators: bool,

        /// JSON file with known ruling lines (`{"column_lines": [...], "row_lines": [...]}`);
        /// skips row and column inference
        #[arg(long)]
        grid: Option<PathBuf>,
    },

    /// Print the effective configuration as TOML
    Config {
        /// Configuration file (.toml, .yaml, .yml or .json); defaults to a discovered tafel.toml
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Parse {
            input,
            format,
            output,
            config,
            min_confidence,
            split_separators,
            grid,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(min_confidence) = min_confidence {
                config.min_confidence = min_confidence;
            }
            if split_separators {
                config.split_on_separators = true;
            }
            let parser = TableParser::new(config).context("Invalid configuration")?;
            let grid = grid.as_deref().map(load_grid).transpose()?;

            let content = std::fs::read_to_string(&input)
                .with_context(|| format!("Failed to read input file {}", input.display()))?;
            let fragments = read_fragments(&input, &content, format)
                .with_context(|| format!("Failed to read OCR fragments from {}", input.display()))?;

            let parsed = match &grid {
                Some(grid) => parser.parse_with_grid(fragments, grid),
                None => parser.parse(fragments),
            }
            .with_context(|| format!("Failed to reconstruct table from {}", input.display()))?;

            match output {
                OutputFormat::Markdown => print!("{}", table_to_markdown(&parsed.table)),
                OutputFormat::Json => {
                    let json = serde_json::to_string_pretty(&parsed).context("Failed to serialize result")?;
                    println!("{}", json);
                }
            }

            if parsed.quality.needs_review {
                match parsed.quality.confidence_score {
                    Some(score) => eprintln!("Confidence score {:.2}: manual review advised", score),
                    None => eprintln!("No usable fragments: manual review advised"),
                }
            }

            Ok(())
        }

        Commands::Config { config } => {
            let config = load_config(config.as_deref())?;
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "tafel=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Explicit path, then a discovered `tafel.toml`, then defaults; `TAFEL_*`
/// environment variables apply on top.
fn load_config(path: Option<&Path>) -> Result<TableConfig> {
    let config = match path {
        Some(path) => TableConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => TableConfig::discover()
            .context("Failed to load discovered tafel.toml")?
            .unwrap_or_default(),
    };

    config
        .with_env_overrides()
        .context("Invalid TAFEL_* environment override")
}

fn load_grid(path: &Path) -> Result<GridLayout> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read grid file {}", path.display()))?;
    GridLayout::from_json(&content).with_context(|| format!("Invalid grid in {}", path.display()))
}

fn read_fragments(path: &Path, content: &str, format: InputFormat) -> Result<Vec<Fragment>> {
    let format = match format {
        InputFormat::Auto => detect_format(path, content),
        explicit => explicit,
    };
    tracing::debug!("Reading {} as {:?}", path.display(), format);

    let fragments = match format {
        InputFormat::Tsv => fragments_from_tsv(content, 0.0)?,
        InputFormat::Paddle => fragments_from_paddle_json(content)?,
        InputFormat::Json => fragments_from_json(content)?,
        InputFormat::Auto => bail!("Could not detect the input format of {}", path.display()),
    };

    Ok(fragments)
}

/// Extension first; JSON is split into native and PaddleOCR by the shape of
/// the first element.
fn detect_format(path: &Path, content: &str) -> InputFormat {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("tsv") => InputFormat::Tsv,
        Some("json") => detect_json_flavor(content),
        _ if content.trim_start().starts_with('[') => detect_json_flavor(content),
        _ => InputFormat::Tsv,
    }
}

fn detect_json_flavor(content: &str) -> InputFormat {
    let first_element = content
        .trim_start()
        .strip_prefix('[')
        .map(str::trim_start)
        .and_then(|rest| rest.chars().next());

    match first_element {
        Some('{') => InputFormat::Json,
        _ => InputFormat::Paddle,
    }
}
