//! CLI binary for gemtracker-extract.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ExtractorConfig` and prints extraction reports.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use gemtracker_extract::{
    checklist_catalog, extract_batch, extract_from_screenshot, BatchReport, DocumentOutcome,
    ExtractorConfig, ScreenshotBid, SkipReason, Stage, StageOutcome, StageReport,
    BID_DATE_FORMAT,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract fields from one bid document (human-readable summary)
  gem-extract GeM-Bidding-7654321.pdf

  # JSON report on stdout
  gem-extract --json GeM-Bidding-7654321.pdf > tender.json

  # Batch a directory of tender drops, four documents at a time
  gem-extract incoming/*.pdf -o report.json

  # Read bid rows off a result-page screenshot
  gem-extract --screenshot results.png --json

  # Print the 28-slot document checklist (no API key needed)
  gem-extract --checklist

  A single input produces one JSON object; multiple inputs produce a
  JSON array in input order.

EXTRACTION CHAIN:
  1. pattern    label rules over the leading page text (no network)
  2. inference  Gemini reads the same text; runs only when the pattern
                stage found no bid number and a credential is available
  3. filename   bid number taken from a GEM-prefixed file name

  A document fails only when all three stages leave the bid number
  unset. Without an API key the deterministic stages still run; the
  inference stage is reported as skipped.

MODEL ALIASES (tried in order until one answers):
  gemini-2.0-flash    primary
  gemini-1.5-flash    fallback
  gemini-1.5-pro      fallback

  Override with repeated flags or a comma-separated list:
  gem-extract --model gemini-2.0-flash --model gemini-1.5-pro bid.pdf

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY           Gemini API key (preferred)
  GOOGLE_API_KEY           Legacy key variable, read when GEMINI_API_KEY
                           is unset
  GEM_EXTRACT_OUTPUT       Default --output path
  GEM_EXTRACT_MODELS       Default model aliases (comma-separated)
  GEM_EXTRACT_PAGES        Default --pages
  GEM_EXTRACT_API_TIMEOUT  Default --timeout
  GEM_EXTRACT_CONCURRENCY  Default --concurrency

SETUP:
  1. Set API key:  export GEMINI_API_KEY=AIza...
  2. Extract:      gem-extract GeM-Bidding-7654321.pdf --json
"#;

/// Extract tender fields from GeM bid documents and result screenshots.
#[derive(Parser, Debug)]
#[command(
    name = "gem-extract",
    version,
    about = "Extract tender fields from GeM bid documents and result screenshots",
    long_about = "Extract the bid number, end date, item category and subject from GeM bid \
PDFs through a three-stage fallback chain (label patterns, Gemini inference, file-name \
heuristic), and bid rows from result-page screenshots. Each successful document gets a \
JSON report with the 28-slot compliance checklist attached.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Tender PDF files, or one image file with --screenshot.
    #[arg(value_name = "FILE", required_unless_present = "checklist")]
    inputs: Vec<PathBuf>,

    /// Write the JSON report to this file instead of stdout.
    #[arg(short, long, env = "GEM_EXTRACT_OUTPUT")]
    output: Option<PathBuf>,

    /// Output the structured JSON report instead of a human summary.
    #[arg(long, env = "GEM_EXTRACT_JSON")]
    json: bool,

    /// Treat the input as a bid-result screenshot instead of a tender PDF.
    #[arg(long)]
    screenshot: bool,

    /// Print the tender document checklist and exit.
    #[arg(long)]
    checklist: bool,

    /// Gemini API key.
    #[arg(
        long,
        env = "GEMINI_API_KEY",
        hide_env_values = true,
        long_help = "Gemini API key. Falls back to the GEMINI_API_KEY and GOOGLE_API_KEY \
environment variables; with neither set, the inference stage is skipped (PDF mode) \
or extraction fails (screenshot mode)."
    )]
    api_key: Option<String>,

    /// Model alias to try; repeat or comma-separate for a fallback order.
    #[arg(long = "model", env = "GEM_EXTRACT_MODELS", value_delimiter = ',', value_name = "ALIAS")]
    model: Vec<String>,

    /// Leading pages whose text feeds the pattern and inference stages.
    #[arg(long, env = "GEM_EXTRACT_PAGES", default_value_t = 2)]
    pages: usize,

    /// Per-inference-call timeout in seconds.
    #[arg(long, env = "GEM_EXTRACT_API_TIMEOUT", default_value_t = 60)]
    timeout: u64,

    /// Documents processed in parallel in batch mode.
    #[arg(short, long, env = "GEM_EXTRACT_CONCURRENCY", default_value_t = 4)]
    concurrency: usize,

    /// Disable the progress spinner.
    #[arg(long, env = "GEM_EXTRACT_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GEM_EXTRACT_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GEM_EXTRACT_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active; the
    // summary printed afterwards carries everything the user needs.
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

    // ── Checklist mode ───────────────────────────────────────────────────
    if cli.checklist {
        let items = checklist_catalog();
        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&items).context("Failed to serialise checklist")?
            );
        } else {
            println!(
                "{}",
                bold(&format!("Tender document checklist ({} slots)", items.len()))
            );
            for item in &items {
                println!("  {} {}", cyan(&format!("{:<6}", item.code)), item.name);
            }
        }
        return Ok(());
    }

    let config = build_config(&cli)?;

    if cli.screenshot {
        run_screenshot(&cli, &config, show_progress).await
    } else {
        run_batch(&cli, &config, show_progress).await
    }
}

/// Map CLI args to `ExtractorConfig`.
fn build_config(cli: &Cli) -> Result<ExtractorConfig> {
    let mut builder = ExtractorConfig::builder()
        .page_limit(cli.pages)
        .api_timeout_secs(cli.timeout)
        .concurrency(cli.concurrency);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if !cli.model.is_empty() {
        builder = builder.model_aliases(cli.model.clone());
    }

    builder.build().context("Invalid configuration")
}

// ── PDF batch mode ───────────────────────────────────────────────────────────

async fn run_batch(cli: &Cli, config: &ExtractorConfig, show_progress: bool) -> Result<()> {
    let bar = show_progress.then(|| {
        spinner(
            "Extracting",
            format!("{} document(s)…", cli.inputs.len()),
        )
    });

    let report = extract_batch(&cli.inputs, config).await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    // ── Emit ────────────────────────────────────────────────────────────
    if let Some(ref path) = cli.output {
        let json = report_json(&report)?;
        let text =
            serde_json::to_string_pretty(&json).context("Failed to serialise report")?;
        tokio::fs::write(path, text)
            .await
            .with_context(|| format!("Failed to write report to {}", path.display()))?;

        if !cli.quiet {
            eprintln!(
                "{}  {}/{} documents  →  {}",
                if report.failed() == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                report.succeeded(),
                report.len(),
                bold(&path.display().to_string()),
            );
        }
    } else if cli.json {
        let json = report_json(&report)?;
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise report")?
        );
    } else {
        for outcome in &report.outcomes {
            print_outcome(outcome);
        }
        if !cli.quiet && report.len() > 1 {
            eprintln!(
                "{} {}/{} documents extracted",
                if report.failed() == 0 {
                    green("✔")
                } else {
                    cyan("⚠")
                },
                bold(&report.succeeded().to_string()),
                report.len(),
            );
        }
    }

    if report.failed() > 0 {
        anyhow::bail!("{} of {} documents failed", report.failed(), report.len());
    }
    Ok(())
}

/// One JSON object per document; a bare object when only one input was given.
fn report_json(report: &BatchReport) -> Result<serde_json::Value> {
    let mut docs = Vec::with_capacity(report.len());
    for outcome in &report.outcomes {
        docs.push(match &outcome.result {
            Ok(extraction) => {
                serde_json::to_value(extraction).context("Failed to serialise extraction")?
            }
            Err(err) => serde_json::json!({
                "file": outcome.file,
                "error": err.to_string(),
            }),
        });
    }
    Ok(if docs.len() == 1 {
        docs.remove(0)
    } else {
        serde_json::Value::Array(docs)
    })
}

fn print_outcome(outcome: &DocumentOutcome) {
    let extraction = match &outcome.result {
        Ok(extraction) => extraction,
        Err(err) => {
            println!("{} {}  {}", red("✗"), bold(&outcome.file), red(&err.to_string()));
            return;
        }
    };

    println!("{} {}", green("✓"), bold(&outcome.file));

    let fields = &extraction.fields;
    if let Some(ref bid) = fields.bid_number {
        println!("    {}  {}", label("bid number"), bid);
    }
    if let Some(end) = fields.bid_end_date {
        let status = match fields.deadline_passed(Local::now().naive_local()) {
            Some(true) => red("closed"),
            _ => green("open"),
        };
        println!(
            "    {}  {}  ({status})",
            label("bid end date"),
            end.format(BID_DATE_FORMAT),
        );
    }
    if let Some(ref category) = fields.item_category {
        println!("    {}  {}", label("item category"), category);
    }
    if let Some(ref subject) = fields.subject {
        println!("    {}  {}", label("subject"), subject);
    }

    let stages = extraction
        .stages
        .iter()
        .map(stage_summary)
        .collect::<Vec<_>>()
        .join("  ");
    println!("    {}  {}", label("stages"), dim(&stages));
    println!(
        "    {}  {} document slots",
        label("checklist"),
        extraction.checklist.len()
    );
}

/// Dimmed, width-aligned field label. Pad before colouring so the ANSI
/// escape bytes do not count against the column width.
fn label(name: &str) -> String {
    dim(&format!("{name:<13}"))
}

fn stage_summary(report: &StageReport) -> String {
    let stage = match report.stage {
        Stage::Pattern => "pattern",
        Stage::Inference => "inference",
        Stage::Filename => "filename",
    };
    match &report.outcome {
        StageOutcome::Applied { fields } => format!("{stage}: +{}", fields.len()),
        StageOutcome::Miss => format!("{stage}: miss"),
        StageOutcome::Skipped { reason } => {
            let reason = match reason {
                SkipReason::BidAlreadySet => "bid already set",
                SkipReason::MissingCredential => "no credential",
            };
            format!("{stage}: skipped ({reason})")
        }
        StageOutcome::Failed { detail } => format!("{stage}: failed ({detail})"),
    }
}

// ── Screenshot mode ──────────────────────────────────────────────────────────

async fn run_screenshot(cli: &Cli, config: &ExtractorConfig, show_progress: bool) -> Result<()> {
    anyhow::ensure!(
        cli.inputs.len() == 1,
        "--screenshot takes exactly one image file (got {})",
        cli.inputs.len()
    );
    let path = &cli.inputs[0];

    let image = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let mime = mime_for_extension(path);

    let bar = show_progress.then(|| spinner("Reading", "result-page screenshot…".to_owned()));
    let result = extract_from_screenshot(&image, mime, config).await;
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    let bids = result.context("Screenshot extraction failed")?;

    if let Some(ref out) = cli.output {
        let text = serde_json::to_string_pretty(&bids).context("Failed to serialise bids")?;
        tokio::fs::write(out, text)
            .await
            .with_context(|| format!("Failed to write report to {}", out.display()))?;
        if !cli.quiet {
            eprintln!(
                "{} {} bid(s)  →  {}",
                green("✔"),
                bids.len(),
                bold(&out.display().to_string())
            );
        }
    } else if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&bids).context("Failed to serialise bids")?
        );
    } else {
        print_bids(&bids);
    }

    Ok(())
}

fn print_bids(bids: &[ScreenshotBid]) {
    if bids.is_empty() {
        println!("{} no bids visible on the result page", cyan("⚠"));
        return;
    }

    println!(
        "{} {} bid(s) on the result page",
        green("✔"),
        bold(&bids.len().to_string())
    );
    for bid in bids {
        let mut line = format!("  {}  {}", bold(&bid.bid_number), bid.evaluation_status);
        if let Some(ref ra) = bid.ra_status {
            line.push_str(&format!("  {}", dim(&format!("RA: {ra}"))));
        }
        println!("{line}");
        if let Some(ref details) = bid.result_details {
            println!("      {}", dim(details));
        }
    }
}

/// MIME type for the screenshot upload, from the file extension. Portals
/// hand out PNGs; anything unrecognised is sent as one.
fn mime_for_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "image/png",
    }
}

// ── Progress spinner ─────────────────────────────────────────────────────────

fn spinner(prefix: &str, msg: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
    bar.set_style(style);
    bar.set_prefix(prefix.to_owned());
    bar.set_message(msg);
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}
