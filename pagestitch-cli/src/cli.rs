//! CLI argument parsing for pagestitch.
//!
//! This module defines the command-line interface structure using `clap`.
//! It handles argument parsing, validation, and help text generation.

use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use pagestitch::config::{self, CompressionLevel, Config, Metadata, OverwriteMode};
use pagestitch::error::{Result, StitchError};
use pagestitch::page_set::Edit;
use pagestitch::preview::{PreviewFormat, PreviewSettings};

/// Reorder, delete and merge pages from several PDF documents into one.
///
/// Every page of every input is loaded in order, edits are applied to the
/// resulting page list, and the remaining pages are written to a single
/// output PDF.
#[derive(Parser, Debug)]
#[command(name = "pagestitch")]
#[command(version)]
#[command(about = "Reorder, delete and merge pages from several PDF documents into one", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Input PDF files (pages are appended in this order)
    ///
    /// Files that cannot be read or decoded are skipped with a warning.
    /// Giving the same file twice appends its pages twice.
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<PathBuf>,

    /// Output PDF file name
    ///
    /// ".pdf" is appended when missing.
    #[arg(short, long, value_name = "FILE", default_value = config::DEFAULT_OUTPUT_NAME)]
    pub output: PathBuf,

    /// Edit to apply to the page list (repeatable, applied in order)
    ///
    /// Positions are 0-based indices into the current page list.
    ///
    /// Examples:
    ///   -e remove:2          # drop the third page
    ///   -e move:0:right      # swap the first page with the second
    ///   -e clear             # drop every page
    #[arg(short, long = "edit", value_name = "EDIT")]
    pub edits: Vec<String>,

    /// JSON edit script applied before any --edit
    ///
    /// Example: [{"op": "remove", "index": 1}, {"op": "move", "index": 0, "direction": "left"}]
    #[arg(long = "edits", value_name = "FILE")]
    pub edit_script: Option<PathBuf>,

    /// Write one preview image per output page into DIR
    #[arg(long, value_name = "DIR")]
    pub previews: Option<PathBuf>,

    /// Preview scale relative to the page size
    #[arg(long, value_name = "SCALE", default_value_t = pagestitch::preview::DEFAULT_PREVIEW_SCALE)]
    pub preview_scale: f32,

    /// Preview encoder quality (1-100)
    #[arg(long, value_name = "Q", default_value_t = pagestitch::preview::DEFAULT_PREVIEW_QUALITY)]
    pub preview_quality: u8,

    /// Preview image format
    #[arg(long, value_name = "FORMAT", default_value = "jpeg")]
    #[arg(value_parser = ["jpeg", "jpg", "png"])]
    pub preview_format: String,

    /// Dry run - load and edit, then list the output order without writing
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Verbose output - show per-file and per-page details
    #[arg(short, long)]
    pub verbose: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file (default)
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Suppress all non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Compression level for output PDF
    ///
    /// - none: No compression
    /// - standard: Compress streams (default)
    /// - maximum: Compress streams and drop unreferenced objects
    #[arg(short, long, value_name = "LEVEL", default_value = "standard")]
    #[arg(value_parser = ["none", "standard", "maximum"])]
    pub compression: String,

    /// Set title metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub title: Option<String>,

    /// Set author metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub author: Option<String>,

    /// Set subject metadata for output PDF
    #[arg(long, value_name = "TEXT")]
    pub subject: Option<String>,

    /// Set keywords metadata for output PDF (comma-separated)
    #[arg(long, value_name = "TEXT")]
    pub keywords: Option<String>,

    /// Number of files decoded concurrently
    ///
    /// Default is number of CPU cores. Use 1 for sequential processing.
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,
}

impl Cli {
    /// Convert CLI arguments into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Compression level or preview format is invalid
    /// - An edit or the edit script cannot be parsed
    /// - Configuration validation fails
    pub fn to_config(&self) -> Result<Config> {
        let compression = CompressionLevel::from_str(&self.compression)?;

        let overwrite_mode = if self.force {
            OverwriteMode::Force
        } else {
            OverwriteMode::NoClobber
        };

        let preview = PreviewSettings {
            scale: self.preview_scale,
            quality: self.preview_quality,
            format: PreviewFormat::from_str(&self.preview_format)?,
        };

        let mut edits = match &self.edit_script {
            Some(path) => config::read_edit_script(path)?,
            None => Vec::new(),
        };
        for edit in &self.edits {
            edits.push(edit.parse::<Edit>()?);
        }

        let metadata = Metadata::new(
            self.title.clone(),
            self.author.clone(),
            self.subject.clone(),
            self.keywords.clone(),
        );

        let config = Config {
            inputs: self.inputs.clone(),
            output: self.output.clone(),
            dry_run: self.dry_run,
            verbose: self.verbose,
            quiet: self.quiet,
            overwrite_mode,
            compression,
            metadata,
            preview,
            preview_dir: self.previews.clone(),
            jobs: self.jobs,
            edits,
        };

        config.validate().map_err(|e| {
            StitchError::invalid_config(format!("Configuration validation failed: {e:#}"))
        })?;

        Ok(config)
    }
}
