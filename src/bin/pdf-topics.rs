//! CLI binary for pdf-topics.
//!
//! A thin shim over the library crate: `extract` writes the page document,
//! `topics` sorts an existing page document into topic records, and `run`
//! does both.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use pdf_topics::{
    extract_document, extract_to_file, run_batch, run_batch_file, BatchProgressCallback,
    LlmTopicModel, PdfiumBackend, ProgressCallback, TopicConfig, TopicModel, TopicRecord,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
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

/// Terminal progress callback: a progress bar plus one log line per page.
///
/// The bar stays hidden until the batch starts, so nothing is drawn while
/// `run` is still extracting.
struct CliProgressCallback {
    bar: ProgressBar,
    /// Threshold below which a final ratio is flagged in the page log.
    min_preservation: f64,
    /// Without isolation the first page error ends the batch.
    isolate_failures: bool,
}

impl CliProgressCallback {
    fn new(min_preservation: f64, isolate_failures: bool) -> Arc<Self> {
        let bar = ProgressBar::with_draw_target(Some(0), ProgressDrawTarget::hidden());
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}/{len} pages  \
                 ⏱ {elapsed_precise}  ETA {eta_precise}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Topics");

        Arc::new(Self {
            bar,
            min_preservation,
            isolate_failures,
        })
    }
}

impl BatchProgressCallback for CliProgressCallback {
    fn on_batch_start(&self, total_pages: usize) {
        self.bar.set_length(total_pages as u64);
        self.bar.set_draw_target(ProgressDrawTarget::stderr());
        self.bar.enable_steady_tick(Duration::from_millis(80));
        self.bar.reset_eta();
    }

    fn on_page_start(&self, page_num: u32, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: u32, total: usize, ratio: f64) {
        let pct = format!("{:>4.0}% kept", ratio * 100.0);
        let mark = if ratio > 0.0 && ratio < self.min_preservation {
            yellow("⚠")
        } else {
            green("✓")
        };
        self.bar
            .println(format!("  {mark} Page {page_num:>3}/{total:<3}  {}", dim(&pct)));
        self.bar.inc(1);
    }

    fn on_page_error(&self, page_num: u32, total: usize, error: &str) {
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar
            .println(format!("  {} Page {page_num:>3}/{total:<3}  {}", red("✗"), red(&msg)));
        self.bar.inc(1);
        if !self.isolate_failures {
            self.bar.finish_and_clear();
        }
    }

    fn on_batch_complete(&self, total_pages: usize, success_count: usize) {
        self.bar.finish_and_clear();
        let failed = total_pages.saturating_sub(success_count);
        if failed == 0 {
            eprintln!(
                "{} {} pages sorted into topics",
                green("✔"),
                bold(&success_count.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages sorted  ({} failed)",
                yellow("⚠"),
                bold(&success_count.to_string()),
                total_pages,
                red(&failed.to_string()),
            );
        }
    }
}

/// Extract PDF pages and sort them into topic/content records with an LLM.
#[derive(Parser, Debug)]
#[command(
    name = "pdf-topics",
    version,
    about = "Extract PDF pages and sort them into topic/content records with an LLM",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF_TOPICS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF_TOPICS_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "PDF_TOPICS_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract cleaned page text and metadata from a PDF into a JSON document.
    Extract {
        /// Local PDF file path.
        input: PathBuf,

        /// Write the page document here.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        pdf: PdfArgs,
    },

    /// Sort the pages of an extracted JSON document into topic records.
    Topics {
        /// Page document produced by `extract`.
        input: PathBuf,

        /// Write the topic records here.
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        model: ModelArgs,
    },

    /// Extract a PDF and sort its pages into topic records.
    Run {
        /// Local PDF file path.
        input: PathBuf,

        /// Write the topic records here.
        #[arg(short, long)]
        output: PathBuf,

        /// Also write the intermediate page document here.
        #[arg(long)]
        intermediate: Option<PathBuf>,

        #[command(flatten)]
        pdf: PdfArgs,

        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug)]
struct PdfArgs {
    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDF_TOPICS_PASSWORD")]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// LLM model ID (e.g. gpt-4.1-mini, claude-sonnet-4-20250514).
    #[arg(long, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens per call.
    #[arg(long, env = "PDF_TOPICS_MAX_TOKENS", default_value_t = 4000)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, env = "PDF_TOPICS_TEMPERATURE", default_value_t = 0.0)]
    temperature: f32,

    /// Per-call LLM timeout in seconds.
    #[arg(long, env = "PDF_TOPICS_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Minimum fraction of a page's words the content must keep before the
    /// escalated retry is skipped.
    #[arg(long, env = "PDF_TOPICS_MIN_PRESERVATION", default_value_t = 0.7)]
    min_preservation: f64,

    /// Emit a placeholder record for a failing page and continue.
    #[arg(long, env = "PDF_TOPICS_ISOLATE_FAILURES")]
    isolate_failures: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Suppress INFO-level library logs when the progress bar is active.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    match &cli.command {
        Command::Extract { input, output, pdf } => {
            ensure_pdfium(cli.quiet)?;
            let doc = extract_to_file(input, output, backend(pdf))
                .await
                .context("Extraction failed")?;
            if !cli.quiet {
                eprintln!(
                    "{}  {} pages  →  {}",
                    green("✔"),
                    doc.pages.len(),
                    bold(&output.display().to_string())
                );
            }
        }
        Command::Topics {
            input,
            output,
            model,
        } => {
            let (config, topic_model) = build_model(model, show_progress)?;
            let records = run_batch_file(input, output, topic_model, &config)
                .await
                .context("Topic extraction failed")?;
            print_summary(&records, output, cli.quiet);
        }
        Command::Run {
            input,
            output,
            intermediate,
            pdf,
            model,
        } => {
            ensure_pdfium(cli.quiet)?;
            let (config, topic_model) = build_model(model, show_progress)?;
            let doc = match intermediate {
                Some(path) => extract_to_file(input, path, backend(pdf)).await,
                None => extract_document(input, backend(pdf)).await,
            }
            .context("Extraction failed")?;

            let records = run_batch(&doc, topic_model, &config)
                .await
                .context("Topic extraction failed")?;
            pdf_topics::pipeline::persist::write_json_atomic(output, &records)
                .await
                .context("Failed to write topic records")?;
            print_summary(&records, output, cli.quiet);
        }
    }

    Ok(())
}

/// Make sure a pdfium library is available before extraction starts.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    #[cfg(feature = "bundled")]
    {
        let _ = quiet;
        tokio::task::block_in_place(pdfium_auto::ensure_pdfium_bundled)
            .context("Failed to extract bundled PDFium engine")?;
    }

    #[cfg(not(feature = "bundled"))]
    if !pdfium_auto::is_pdfium_cached() {
        if !quiet {
            eprintln!("{}", dim("Downloading PDFium engine (first run only)…"));
        }
        tokio::task::block_in_place(|| pdfium_auto::ensure_pdfium_library(None))
            .context("Failed to download PDFium engine")?;
    }

    Ok(())
}

fn backend(args: &PdfArgs) -> Arc<PdfiumBackend> {
    let mut backend = PdfiumBackend::new();
    if let Some(ref pwd) = args.password {
        backend = backend.with_password(pwd.clone());
    }
    Arc::new(backend)
}

/// Map model flags to a `TopicConfig` and resolve the provider once.
fn build_model(args: &ModelArgs, show_progress: bool) -> Result<(TopicConfig, Arc<dyn TopicModel>)> {
    let mut builder = TopicConfig::builder()
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .api_timeout_secs(args.api_timeout)
        .min_preservation(args.min_preservation)
        .isolate_failures(args.isolate_failures);

    if let Some(ref m) = args.model {
        builder = builder.model(m.clone());
    }
    if let Some(ref p) = args.provider {
        builder = builder.provider_name(p.clone());
    }
    if show_progress {
        let cb: ProgressCallback = CliProgressCallback::new(args.min_preservation, args.isolate_failures);
        builder = builder.progress_callback(cb);
    }

    let config = builder.build().context("Invalid configuration")?;
    let model: Arc<dyn TopicModel> = Arc::new(
        LlmTopicModel::from_config(&config).context("Failed to set up LLM provider")?,
    );
    Ok((config, model))
}

fn print_summary(records: &[TopicRecord], output: &Path, quiet: bool) {
    if quiet {
        return;
    }
    let ok: Vec<&TopicRecord> = records.iter().filter(|r| !r.is_failed()).collect();
    let mean = if ok.is_empty() {
        0.0
    } else {
        ok.iter().map(|r| r.preservation_ratio).sum::<f64>() / ok.len() as f64
    };
    eprintln!(
        "{}  {}/{} records  mean preservation {:.0}%  →  {}",
        if ok.len() == records.len() {
            green("✔")
        } else {
            yellow("⚠")
        },
        ok.len(),
        records.len(),
        mean * 100.0,
        bold(&output.display().to_string()),
    );
}
