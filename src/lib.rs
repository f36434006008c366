//! # tex2img
//!
//! Batch-render LaTeX equations and pseudocode to PNG, JPG, or SVG images.
//!
//! ## Why this crate?
//!
//! Pasting formulas into slides, issues, or web pages means rendering them
//! one by one in some online editor. Instead this crate takes a JSON file
//! describing a whole batch of equations and algorithm blocks, wraps each in
//! a minimal compilable document, and drives the standard LaTeX toolchain
//! (`latex`, `dvisvgm`, `rsvg-convert`) to produce one image per entry — with
//! per-item failure isolation, so one typo'd formula never costs you the
//! other forty-nine.
//!
//! ## Pipeline Overview
//!
//! ```text
//! batch.json
//!  │
//!  ├─ 1. Load      parse + validate, resolve ids, preserve order
//!  ├─ 2. Build     wrap each fragment in a standalone .tex document
//!  ├─ 3. Typeset   latex → DVI (private scratch workspace per item)
//!  ├─ 4. Convert   dvisvgm → SVG, optionally rsvg-convert → PNG/JPG
//!  └─ 5. Place     <id>.<format> into the output directory
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tex2img::{convert_batch, BatchConfig, OutputFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig::builder()
//!         .format(OutputFormat::Svg)
//!         .output_dir("rendered")
//!         .build()?;
//!     let output = convert_batch("equations.json", &config).await?;
//!     for failure in output.failures() {
//!         eprintln!("{}: {}", failure.id, failure.error.as_ref().unwrap());
//!     }
//!     println!("{}/{} rendered", output.stats.succeeded, output.stats.total_items);
//!     Ok(())
//! }
//! ```
//!
//! ## Input format
//!
//! ```json
//! {
//!   "equations": [
//!     "E = mc^2",
//!     { "id": "euler", "latex": "e^{i\\pi} + 1 = 0", "auto_align": false }
//!   ],
//!   "pseudocode": [
//!     { "latex": "\\begin{algorithm}…\\end{algorithm}" }
//!   ]
//! }
//! ```
//!
//! Items without an `id` get `<kind>_<index>` (`equation_0`, `pseudocode_3`);
//! the derivation is deterministic and duplicate ids are rejected up front.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `tex2img` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! tex2img = { version = "0.1", default-features = false }
//! ```
//!
//! ## External tools
//!
//! The crate shells out to `latex`, `dvisvgm`, and (for raster formats)
//! `rsvg-convert`; they must be on `PATH` or configured on [`BatchConfig`].
//! Their diagnostic output is captured and attached to per-item errors —
//! it is the primary debugging aid for LaTeX syntax mistakes.

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod document;
pub mod error;
pub mod loader;
pub mod output;
pub mod pipeline;
pub mod stream;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{parse_scale, BatchConfig, BatchConfigBuilder, OutputFormat};
pub use convert::{convert_batch, convert_batch_sync};
pub use document::build_document;
pub use error::{BatchError, ItemError};
pub use loader::{load_items, Item, ItemKind};
pub use output::{BatchOutput, BatchStats, ItemResult};
pub use stream::{convert_batch_stream, ItemStream};
