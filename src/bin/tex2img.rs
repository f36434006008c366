//! CLI binary for tex2img.
//!
//! A thin shim over the library crate that maps CLI flags to `BatchConfig`,
//! drives the streaming API for live progress, and maps outcomes to exit
//! codes: 0 all items succeeded, 1 at least one item failed, 2 fatal error
//! before any item was processed.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tex2img::{
    convert_batch, convert_batch_stream, BatchConfig, BatchOutput, ItemResult, OutputFormat,
};
use tracing_subscriber::EnvFilter;

const EXIT_ITEM_FAILED: i32 = 1;
const EXIT_FATAL: i32 = 2;

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
  # Render every entry of a batch file to PNG (default)
  tex2img equations.json

  # SVG output into a custom directory
  tex2img equations.json --format svg --output-dir rendered

  # Double-size JPGs, four items at a time
  tex2img equations.json --format jpg --scale 200% --concurrency 4

  # Machine-readable report of the whole run
  tex2img equations.json --json > report.json

  # Keep the per-item scratch workspaces for debugging a failing fragment
  tex2img equations.json --keep-temp --verbose

INPUT FILE:
  A JSON object with at least one of the keys "equations" / "pseudocode",
  each an array of entries. An entry is either a LaTeX string or an object:

    {
      "equations": [
        "E = mc^2",
        { "id": "euler", "latex": "e^{i\\pi} + 1 = 0", "auto_align": false }
      ],
      "pseudocode": [
        { "latex": "\\begin{algorithm}...\\end{algorithm}" }
      ]
    }

  Entries without an "id" get "<kind>_<index>" (equation_0, pseudocode_3).
  Output files are named <id>.<format>.

EXIT CODES:
  0   every item rendered
  1   at least one item failed (the rest were still rendered)
  2   fatal error before any item was processed (bad file, malformed JSON,
      duplicate ids, invalid scale)

REQUIRED EXTERNAL TOOLS:
  latex           typesetting engine (any TeX distribution)
  dvisvgm         DVI → SVG (ships with TeX Live)
  rsvg-convert    SVG → PNG/JPG (librsvg; not needed for --format svg)
"#;

/// Render LaTeX equations and pseudocode from a JSON batch file to images.
#[derive(Parser, Debug)]
#[command(
    name = "tex2img",
    version,
    about = "Batch-render LaTeX equations and pseudocode to PNG, JPG, or SVG",
    long_about = "Reads a JSON file describing LaTeX equations and pseudocode blocks, wraps \
each in a minimal standalone document, and renders it to an image via the local LaTeX \
toolchain. Items fail independently: one bad fragment never aborts the batch.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Path to the JSON batch file.
    input: PathBuf,

    /// Output image format.
    #[arg(long, env = "TEX2IMG_FORMAT", value_enum, default_value = "png")]
    format: FormatArg,

    /// Scale factor, e.g. '125%' or '1.25'.
    #[arg(long, env = "TEX2IMG_SCALE", default_value = "125%")]
    scale: String,

    /// Directory the rendered images are placed in (created if absent).
    #[arg(long, env = "TEX2IMG_OUTPUT_DIR", default_value = "output")]
    output_dir: PathBuf,

    /// Number of items rendered concurrently.
    #[arg(short, long, env = "TEX2IMG_CONCURRENCY", default_value_t = 1)]
    concurrency: usize,

    /// Keep each item's scratch workspace (the .tex source and tool logs).
    #[arg(long, env = "TEX2IMG_KEEP_TEMP")]
    keep_temp: bool,

    /// Timeout for the latex invocation, per item, in seconds.
    #[arg(long, env = "TEX2IMG_LATEX_TIMEOUT", default_value_t = 30)]
    latex_timeout: u64,

    /// Timeout for each conversion tool, per item, in seconds.
    #[arg(long, env = "TEX2IMG_CONVERT_TIMEOUT", default_value_t = 20)]
    convert_timeout: u64,

    /// Output the structured run report as JSON instead of human-readable text.
    #[arg(long, env = "TEX2IMG_JSON")]
    json: bool,

    /// Disable the live progress display.
    #[arg(long, env = "TEX2IMG_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "TEX2IMG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "TEX2IMG_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FormatArg {
    Png,
    Jpg,
    Svg,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Jpg => OutputFormat::Jpg,
            FormatArg::Svg => OutputFormat::Svg,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the progress display is active;
    // the per-item lines carry all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_writer(io::stderr)
        .init();

    let code = match run(&cli, show_progress).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e:#}", red("error:"));
            EXIT_FATAL
        }
    };
    std::process::exit(code);
}

async fn run(cli: &Cli, show_progress: bool) -> Result<i32> {
    let config = build_config(cli)?;

    let output = if show_progress {
        convert_with_progress(cli, &config).await?
    } else {
        convert_batch(&cli.input, &config)
            .await
            .context("conversion failed")?
    };

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("failed to serialise report")?;
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle.write_all(json.as_bytes()).ok();
        handle.write_all(b"\n").ok();
    } else if !cli.quiet {
        print_summary(&output, &config);
    }

    Ok(if output.is_success() { 0 } else { EXIT_ITEM_FAILED })
}

/// Map CLI args to `BatchConfig`.
fn build_config(cli: &Cli) -> Result<BatchConfig> {
    BatchConfig::builder()
        .format(cli.format.into())
        .scale_percent(&cli.scale)
        .output_dir(&cli.output_dir)
        .concurrency(cli.concurrency)
        .keep_temp(cli.keep_temp)
        .latex_timeout_secs(cli.latex_timeout)
        .convert_timeout_secs(cli.convert_timeout)
        .build()
        .context("invalid configuration")
}

/// Drive the streaming API with a live indicatif bar and per-item log lines.
async fn convert_with_progress(cli: &Cli, config: &BatchConfig) -> Result<BatchOutput> {
    let start = Instant::now();
    let (total, mut stream) = convert_batch_stream(&cli.input, config)
        .await
        .context("conversion failed")?;

    let bar = ProgressBar::new(total as u64);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} items  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  "),
    );
    bar.set_prefix("Rendering");
    bar.enable_steady_tick(Duration::from_millis(80));

    let mut results: Vec<ItemResult> = Vec::with_capacity(total);
    while let Some(result) = stream.next().await {
        match &result.error {
            None => bar.println(format!(
                "  {} {:<24} {}  {}",
                green("✓"),
                result.id,
                dim(&result
                    .output_path
                    .as_deref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default()),
                dim(&format!("{:.1}s", result.duration_ms as f64 / 1000.0)),
            )),
            Some(e) => bar.println(format!(
                "  {} {:<24} {}  {}",
                red("✗"),
                result.id,
                red(e.kind()),
                dim(&format!("{:.1}s", result.duration_ms as f64 / 1000.0)),
            )),
        }
        bar.inc(1);
        results.push(result);
    }
    bar.finish_and_clear();

    Ok(BatchOutput::from_results(
        results,
        start.elapsed().as_millis() as u64,
    ))
}

/// Final human-readable summary: counts, output directory, failure details.
fn print_summary(output: &BatchOutput, config: &BatchConfig) {
    let stats = &output.stats;
    if output.is_success() {
        eprintln!(
            "{} {} items rendered in {}ms  →  {}",
            green("✔"),
            bold(&stats.succeeded.to_string()),
            stats.total_duration_ms,
            bold(&config.output_dir.display().to_string()),
        );
        return;
    }

    eprintln!(
        "{} {}/{} items rendered  ({} failed)  →  {}",
        if stats.succeeded == 0 { red("✘") } else { cyan("⚠") },
        bold(&stats.succeeded.to_string()),
        stats.total_items,
        red(&stats.failed.to_string()),
        bold(&config.output_dir.display().to_string()),
    );

    // Per-item diagnostics last: the captured tool logs are the only way to
    // find the offending line of a broken fragment.
    for failure in output.failures() {
        if let Some(error) = &failure.error {
            eprintln!();
            eprintln!("{} {} [{}]", red("failed:"), bold(&failure.id), error.kind());
            for line in error.to_string().lines() {
                eprintln!("  {}", dim(line));
            }
        }
    }
}
