//! CLI command definitions, routing, and tracing setup.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use bookbinder_annotator::OpenAiAnnotator;
use bookbinder_core::pipeline::{ConvertConfig, ConvertResult, ProgressReporter};
use bookbinder_core::ExtractOptions;
use bookbinder_shared::{AppConfig, init_config, load_config, resolve_api_key};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// bookbinder — turn raw text files into structured EPUBs.
#[derive(Parser)]
#[command(
    name = "bookbinder",
    version,
    about = "Convert a raw text file into a structured EPUB using AI chapter detection.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Convert a text file into an EPUB.
    Convert {
        /// Source text file (UTF-8).
        #[arg(short, long)]
        input: PathBuf,

        /// Output EPUB path.
        #[arg(short, long)]
        output: PathBuf,

        /// OpenAI API key (falls back to the env var named in config).
        #[arg(long)]
        api_key: Option<String>,

        /// Annotation model (overrides config).
        #[arg(long)]
        model: Option<String>,

        /// Language tag for EPUB metadata (overrides config).
        #[arg(long)]
        language: Option<String>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "bookbinder=info",
        1 => "bookbinder=debug",
        _ => "bookbinder=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Convert {
            input,
            output,
            api_key,
            model,
            language,
        } => {
            cmd_convert(
                input,
                output,
                api_key.as_deref(),
                model.as_deref(),
                language.as_deref(),
            )
            .await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

async fn cmd_convert(
    input: PathBuf,
    output: PathBuf,
    api_key: Option<&str>,
    model: Option<&str>,
    language: Option<&str>,
) -> Result<()> {
    let config = load_config()?;

    // Resolve the credential before any file I/O; a missing key is fatal.
    let api_key = resolve_api_key(api_key, &config)?;

    let model = model
        .map(String::from)
        .unwrap_or_else(|| config.defaults.model.clone());
    let language = language
        .map(String::from)
        .unwrap_or_else(|| config.defaults.language.clone());

    let annotator = OpenAiAnnotator::new(api_key, model.clone(), &config.openai.api_base)?;

    let convert_config = ConvertConfig {
        input,
        output,
        language,
        extract: ExtractOptions {
            analysis_window: config.extract.analysis_window,
            chunk_size: config.extract.chunk_size,
        },
    };

    info!(
        input = %convert_config.input.display(),
        output = %convert_config.output.display(),
        model = %model,
        "converting text to EPUB"
    );

    let reporter = CliProgress::new();
    let result = bookbinder_core::pipeline::convert(&convert_config, &annotator, &reporter).await?;

    // Print summary
    println!();
    println!("  EPUB created successfully!");
    println!("  Title:    {}", result.title);
    if !result.author.is_empty() {
        println!("  Author:   {}", result.author);
    }
    println!("  Chapters: {}", result.chapter_count);
    println!("  Path:     {}", result.output_path.display());
    println!("  Time:     {:.1}s", result.elapsed.as_secs_f64());
    println!();

    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap()
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
        );
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn text_loaded(&self, char_count: usize) {
        self.spinner
            .println(format!("Text loaded: {char_count} characters"));
    }

    fn chunk_annotated(&self, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Annotating fragment [{current}/{total}]"));
    }

    fn done(&self, _result: &ConvertResult) {
        self.spinner.finish_and_clear();
    }
}

// ---------------------------------------------------------------------------
// Config commands
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
