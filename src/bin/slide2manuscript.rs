//! CLI binary for slide-manuscript.
//!
//! A thin shim over the library crate: maps flags to `ManuscriptConfig`,
//! logs the operator in, runs one generation, writes the document and prints
//! the manuscript.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use slide_manuscript::pipeline::extract::join_slides;
use slide_manuscript::pipeline::input::default_output_path;
use slide_manuscript::{
    extract_transcript, generate, load_input, normalize_manuscript, package_docx, write_docx,
    AccessGate, DocumentStyle, GenerationStats, Manuscript, ManuscriptConfig,
    ManuscriptProgressCallback, ProgressCallback, Session, Stage,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner on stderr that follows the pipeline stages and reports retries
/// while the generator is backing off.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  {elapsed:.dim}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ManuscriptProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: Stage) {
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message(String::new());
    }

    fn on_slides_extracted(&self, page_count: usize, empty_pages: usize) {
        let note = if empty_pages > 0 {
            format!("  {}", dim(&format!("({empty_pages} without text)")))
        } else {
            String::new()
        };
        self.bar
            .println(format!("  {} {page_count} slides extracted{note}", green("✓")));
    }

    fn on_retry(&self, attempt: u32, max_attempts: u32, delay: Duration, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} attempt {attempt}/{max_attempts} failed: {}  {}",
            yellow("↻"),
            msg,
            dim(&format!("retrying in {}s", delay.as_secs())),
        ));
    }

    fn on_complete(&self, manuscript_chars: usize) {
        self.bar.finish_and_clear();
        eprintln!("{} manuscript ready ({manuscript_chars} chars)", green("✔"));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Generate 原稿.docx next to the current directory and print the text
  slide2manuscript deck.pdf

  # Choose the output file
  slide2manuscript deck.pdf -o out/原稿.docx

  # Deck from a URL
  slide2manuscript https://example.org/slides/deck.pdf

  # Show what the model would receive (no API key needed)
  slide2manuscript --extract-only deck.pdf

  # Re-run only the deterministic rewrites on an edited manuscript
  slide2manuscript --normalize-only draft.txt -o 原稿.docx

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          API key for the session
  APP_PASSWORD            Shared access password
  APP_PASSWORD_HASH       SHA-256 hex of the shared password (unset: no gate)
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  RUST_LOG                Log filter, overrides -v / -q
"#;

/// Turn a slide deck into a Japanese presentation manuscript.
#[derive(Parser, Debug)]
#[command(
    name = "slide2manuscript",
    version,
    about = "Turn a slide deck (PDF) into a Japanese presentation manuscript (.docx)",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF path or HTTP/HTTPS URL (a text file with --normalize-only).
    input: String,

    /// Where to write the document. Default: ./原稿.docx
    #[arg(short, long, env = "SLIDE2MS_OUTPUT")]
    output: Option<PathBuf>,

    /// API key for the model provider.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Shared access password, checked against APP_PASSWORD_HASH.
    #[arg(long, env = "APP_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Model ID.
    #[arg(long, env = "SLIDE2MS_MODEL")]
    model: Option<String>,

    /// Provider: openai, anthropic, gemini, mistral.
    #[arg(long, env = "SLIDE2MS_PROVIDER")]
    provider: Option<String>,

    /// Max output tokens.
    #[arg(long, env = "SLIDE2MS_MAX_TOKENS", default_value_t = 16384)]
    max_tokens: usize,

    /// Sampling temperature (0.0–2.0).
    #[arg(long, env = "SLIDE2MS_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Generator attempts, including the first.
    #[arg(long, env = "SLIDE2MS_MAX_ATTEMPTS", default_value_t = 4)]
    max_attempts: u32,

    /// Per-call model timeout in seconds.
    #[arg(long, env = "SLIDE2MS_API_TIMEOUT", default_value_t = 180)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "SLIDE2MS_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// User password of an encrypted PDF.
    #[arg(long, env = "SLIDE2MS_PDF_PASSWORD", hide_env_values = true)]
    pdf_password: Option<String>,

    /// Path to libpdfium (file or directory).
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Replace the built-in style rules with the contents of this file.
    #[arg(long, env = "SLIDE2MS_RULES")]
    rules: Option<PathBuf>,

    /// Document font.
    #[arg(long, env = "SLIDE2MS_FONT", default_value = "MS Mincho")]
    font: String,

    /// Document font size in points.
    #[arg(long, env = "SLIDE2MS_FONT_SIZE", default_value_t = 11)]
    font_size: usize,

    /// Print the page-delimited slide text and stop.
    #[arg(long, conflicts_with = "normalize_only")]
    extract_only: bool,

    /// Normalize an existing manuscript text file instead of generating.
    #[arg(long)]
    normalize_only: bool,

    /// Print the result as JSON (text, key, stats) instead of plain text.
    #[arg(long, env = "SLIDE2MS_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "SLIDE2MS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "SLIDE2MS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the manuscript.
    #[arg(short, long, env = "SLIDE2MS_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Generation failed: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let progress: Option<ProgressCallback> = if show_progress && !cli.normalize_only {
        Some(CliProgressCallback::new() as Arc<dyn ManuscriptProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress).await?;

    // ── Normalize-only mode ──────────────────────────────────────────────
    if cli.normalize_only {
        let raw = tokio::fs::read_to_string(&cli.input)
            .await
            .with_context(|| format!("Failed to read {}", cli.input))?;
        let text = normalize_manuscript(&raw);
        if let Some(ref path) = cli.output {
            let docx = package_docx(&text, &config.style)?;
            let manuscript = Manuscript {
                text: text.clone(),
                docx,
                cache_key: String::new(),
                file_name: file_name_of(path),
                mime_type: slide_manuscript::pipeline::docx::DOCX_MIME.to_string(),
                stats: GenerationStats::default(),
            };
            write_docx(path, &manuscript).await?;
        }
        return print_text(&text);
    }

    let input = load_input(&cli.input, config.download_timeout_secs)
        .await
        .context("Failed to load input")?;

    // ── Extract-only mode ────────────────────────────────────────────────
    if cli.extract_only {
        let slides = extract_transcript(&input, &config).await?;
        if let Some(ref cb) = config.progress_callback {
            cb.on_complete(0);
        }
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&slides).context("Failed to serialise slides")?
            );
            return Ok(());
        }
        return print_text(&join_slides(&slides));
    }

    // ── Session ──────────────────────────────────────────────────────────
    let gate = AccessGate::from_env();
    let mut session = Session::new();
    session.login(
        &gate,
        cli.password.as_deref().unwrap_or_default(),
        cli.api_key.as_deref().unwrap_or_default(),
    )?;

    // ── Generate ─────────────────────────────────────────────────────────
    let manuscript = generate(&mut session, &input, &config).await?;

    let output_path = match cli.output {
        Some(ref p) => p.clone(),
        None => default_output_path(Path::new(".")),
    };
    write_docx(&output_path, &manuscript).await?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&manuscript).context("Failed to serialise output")?
        );
    } else {
        print_text(&manuscript.text)?;
    }

    if !cli.quiet {
        let stats = &manuscript.stats;
        eprintln!(
            "{}  {} slides  {} attempt(s)  {}ms  →  {}",
            green("✔"),
            stats.page_count,
            stats.attempts,
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        eprintln!(
            "   {} tokens in  /  {} tokens out",
            dim(&stats.input_tokens.to_string()),
            dim(&stats.output_tokens.to_string()),
        );
    }

    Ok(())
}

/// Map CLI args to `ManuscriptConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ManuscriptConfig> {
    let mut builder = ManuscriptConfig::builder()
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature)
        .max_attempts(cli.max_attempts)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout)
        .style(DocumentStyle {
            font_name: cli.font.clone(),
            font_size_pt: cli.font_size,
        });

    if let Some(ref model) = cli.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref pwd) = cli.pdf_password {
        builder = builder.pdf_password(pwd);
    }
    if let Some(ref lib) = cli.pdfium_lib {
        builder = builder.pdfium_library_path(lib);
    }
    if let Some(ref path) = cli.rules {
        let rules = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read rules from {:?}", path))?;
        builder = builder.rules(rules);
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

fn print_text(text: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    handle
        .write_all(text.as_bytes())
        .context("Failed to write to stdout")?;
    if !text.ends_with('\n') {
        handle.write_all(b"\n").ok();
    }
    Ok(())
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| slide_manuscript::pipeline::docx::MANUSCRIPT_FILENAME.to_string())
}
