//! CLI binary for paper-storyteller.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `StorytellerConfig` and prints the output path.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use paper_storyteller::{tell_story, Language, StorytellerConfig};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"EXAMPLES:
  # Narrate a paper (Chinese, default)
  storyteller 1512.03385

  # English page from a URL, custom output directory
  storyteller https://arxiv.org/abs/1706.03762 --lang en --output pages/

  # Point at an existing layout-model download
  storyteller 2103.00020 --model-dir ~/models/doclayout

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY            Gemini API key (GOOGLE_API_KEY also accepted)
  STORYTELLER_MODEL_DIR     Layout-model directory
  STORYTELLER_OUTPUT        Output directory

SETUP:
  1. Download the DocLayout-YOLO ONNX export from HuggingFace into models/doclayout/
  2. Set the API key:   export GEMINI_API_KEY=...
  3. Run:               storyteller 1512.03385
"#;

/// Turn an arXiv paper into a narrated web page.
#[derive(Parser, Debug)]
#[command(
    name = "storyteller",
    version,
    about = "Turn an arXiv paper into a narrated web page",
    long_about = "Fetch an arXiv paper, extract its architecture diagram with a layout-detection \
model, generate a storytelling narrative and illustrations with Gemini, and assemble a single \
self-contained HTML page.",
    arg_required_else_help = true,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// arXiv ID or URL, e.g. 1512.03385 or https://arxiv.org/abs/1512.03385.
    paper: String,

    /// Output language: zh or en.
    #[arg(long, default_value = "zh", value_parser = parse_language)]
    lang: Language,

    /// Gemini API key. Falls back to GOOGLE_API_KEY when unset.
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Output directory for the HTML page, figures, and generated art.
    #[arg(short, long, env = "STORYTELLER_OUTPUT", default_value = "output")]
    output: PathBuf,

    /// Directory holding the layout-detection model artifacts.
    #[arg(long, env = "STORYTELLER_MODEL_DIR", default_value = "models/doclayout")]
    model_dir: PathBuf,

    /// Directory where downloaded PDFs are kept between runs.
    #[arg(long, default_value = "temp")]
    temp_dir: PathBuf,

    /// Hard page cutoff for figure extraction.
    #[arg(long, default_value_t = 10)]
    max_pages: usize,

    /// Rendering DPI for page rasters (72–600).
    #[arg(long, default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Text-generation model ID.
    #[arg(long, default_value = "gemini-2.0-flash-exp")]
    text_model: String,

    /// Primary image-generation model ID.
    #[arg(long, default_value = "gemini-2.5-flash-image")]
    image_model: String,

    /// Regenerate illustrations even when a cached one exists.
    #[arg(long)]
    no_cache: bool,

    /// Enable DEBUG-level logs.
    #[arg(short, long)]
    verbose: bool,

    /// Suppress all output except errors and the final path.
    #[arg(short, long)]
    quiet: bool,
}

fn parse_language(s: &str) -> Result<Language, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO-level step logs in the default mode; verbose
    // mode turns the logs back on and drops the spinner.
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    // ── Resolve credential ───────────────────────────────────────────────
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
        .filter(|k| !k.is_empty())
        .context("No API key provided. Pass --api-key or set GEMINI_API_KEY / GOOGLE_API_KEY.")?;

    // ── Build config ─────────────────────────────────────────────────────
    let config = StorytellerConfig::builder()
        .language(cli.lang)
        .output_dir(&cli.output)
        .temp_dir(&cli.temp_dir)
        .model_dir(&cli.model_dir)
        .max_pages(cli.max_pages)
        .dpi(cli.dpi)
        .api_key(api_key)
        .text_model(&cli.text_model)
        .image_model(&cli.image_model)
        .use_image_cache(!cli.no_cache)
        .build()
        .context("Invalid configuration")?;

    let spinner = if !cli.quiet && !cli.verbose {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(format!("Telling the story of {}…", cli.paper));
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    } else {
        None
    };

    // ── Run ──────────────────────────────────────────────────────────────
    let result = tell_story(&cli.paper, &config).await;

    if let Some(bar) = spinner {
        bar.finish_and_clear();
    }

    let output = result.context("Story generation failed")?;

    if !cli.quiet {
        eprintln!(
            "✔ {} — {} figure(s), {} illustration(s), {:.1}s",
            output.metadata.title,
            output.figures_extracted,
            output.illustrations_generated,
            output.duration_ms as f64 / 1000.0
        );
    }
    println!("{}", output.html_path.display());

    Ok(())
}
