//! Configuration for a pagestitch session.
//!
//! This module holds the validated, normalized settings that drive loading,
//! preview rendering, editing and export. It handles:
//! - Validation of option combinations
//! - Defaults for preview and output settings
//! - Reading edit scripts from disk

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::StitchError;
use crate::page_set::Edit;
use crate::preview::PreviewSettings;

/// Output name used when the user does not choose one.
pub const DEFAULT_OUTPUT_NAME: &str = "merged.pdf";

/// Compression level for the output PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionLevel {
    /// No compression - streams are written as they were copied.
    None,
    /// Compress uncompressed streams.
    #[default]
    Standard,
    /// Compress and drop objects no page refers to.
    Maximum,
}

impl FromStr for CompressionLevel {
    type Err = StitchError;

    /// Parse compression level from "none", "standard" or "maximum".
    fn from_str(s: &str) -> crate::Result<Self> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "standard" => Ok(Self::Standard),
            "maximum" => Ok(Self::Maximum),
            _ => Err(StitchError::invalid_config(format!(
                "Invalid compression level: {s}. Must be one of: none, standard, maximum"
            ))),
        }
    }
}

/// Document information written to the output PDF.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title.
    pub title: Option<String>,
    /// Document author.
    pub author: Option<String>,
    /// Document subject.
    pub subject: Option<String>,
    /// Document keywords (comma-separated).
    pub keywords: Option<String>,
}

impl Metadata {
    /// Check if any metadata fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author.is_none()
            && self.subject.is_none()
            && self.keywords.is_none()
    }

    /// Create metadata from optional strings, trimming whitespace.
    pub fn new(
        title: Option<String>,
        author: Option<String>,
        subject: Option<String>,
        keywords: Option<String>,
    ) -> Self {
        let to_string_opt = |opt: Option<String>| {
            opt.filter(|s| !s.trim().is_empty())
                .map(|s| s.trim().to_string())
        };

        Self {
            title: to_string_opt(title),
            author: to_string_opt(author),
            subject: to_string_opt(subject),
            keywords: to_string_opt(keywords),
        }
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Refuse to replace an existing file (default).
    #[default]
    NoClobber,
    /// Always overwrite.
    Force,
}

/// Complete configuration for a pagestitch run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF file paths, loaded in this order.
    pub inputs: Vec<PathBuf>,

    /// Output PDF path; `.pdf` is appended when missing.
    pub output: PathBuf,

    /// Dry run mode - report the final page order without writing output.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Compression level for output.
    pub compression: CompressionLevel,

    /// Metadata to set on output document.
    pub metadata: Metadata,

    /// Preview rendering parameters.
    pub preview: PreviewSettings,

    /// Directory to write page previews to, if any.
    pub preview_dir: Option<PathBuf>,

    /// Number of files decoded concurrently (None = auto-detect).
    pub jobs: Option<usize>,

    /// Edits applied to the page set after loading, in order.
    pub edits: Vec<Edit>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: PathBuf::from(DEFAULT_OUTPUT_NAME),
            dry_run: false,
            verbose: false,
            quiet: false,
            overwrite_mode: OverwriteMode::default(),
            compression: CompressionLevel::default(),
            metadata: Metadata::default(),
            preview: PreviewSettings::default(),
            preview_dir: None,
            jobs: None,
            edits: Vec::new(),
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - Jobs count is zero
    /// - Preview settings are out of range
    /// - The output would overwrite one of the inputs
    pub fn validate(&self) -> Result<()> {
        if self.inputs.is_empty() {
            bail!("No input files specified");
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        if self.jobs == Some(0) {
            bail!("Number of jobs must be at least 1");
        }

        self.preview
            .validate()
            .context("Invalid preview settings")?;

        let output = self.output_path();
        for input in &self.inputs {
            if input == &output {
                bail!(
                    "Output file cannot be the same as an input file: {}",
                    output.display()
                );
            }
        }

        Ok(())
    }

    /// Output path with the `.pdf` extension enforced.
    pub fn output_path(&self) -> PathBuf {
        crate::io::with_pdf_extension(&self.output)
    }

    /// Get the effective number of parallel jobs.
    ///
    /// Returns the configured job count, or the number of CPU cores if auto-detect.
    pub fn effective_jobs(&self) -> usize {
        self.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    /// Check if output should be displayed.
    ///
    /// Returns false if in quiet mode and not doing a dry run.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}

/// Read a JSON edit script: an array of edits such as
/// `[{"op": "remove", "index": 1}, {"op": "move", "index": 0, "direction": "right"}]`.
pub fn read_edit_script(path: &Path) -> Result<Vec<Edit>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read edit script: {}", path.display()))?;

    serde_json::from_str(&raw)
        .with_context(|| format!("Invalid edit script: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page_set::Direction;
    use std::io::Write;

    fn config_with_inputs() -> Config {
        Config {
            inputs: vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
            ..Default::default()
        }
    }

    #[test]
    fn test_compression_level_from_str() {
        assert_eq!(
            CompressionLevel::from_str("none").unwrap(),
            CompressionLevel::None
        );
        assert_eq!(
            CompressionLevel::from_str("STANDARD").unwrap(),
            CompressionLevel::Standard
        );
        assert_eq!(
            CompressionLevel::from_str("maximum").unwrap(),
            CompressionLevel::Maximum
        );
        assert!(CompressionLevel::from_str("invalid").is_err());
    }

    #[test]
    fn test_metadata_new_trims_whitespace() {
        let meta = Metadata::new(
            Some("  Title  ".to_string()),
            Some("   ".to_string()),
            None,
            Some("keyword".to_string()),
        );

        assert_eq!(meta.title, Some("Title".to_string()));
        assert_eq!(meta.author, None);
        assert_eq!(meta.subject, None);
        assert_eq!(meta.keywords, Some("keyword".to_string()));
        assert!(!meta.is_empty());
        assert!(Metadata::default().is_empty());
    }

    #[test]
    fn test_config_validation() {
        let mut config = config_with_inputs();
        assert!(config.validate().is_ok());

        config.inputs.clear();
        assert!(config.validate().is_err());
        config = config_with_inputs();

        config.verbose = true;
        config.quiet = true;
        assert!(config.validate().is_err());
        config = config_with_inputs();

        config.jobs = Some(0);
        assert!(config.validate().is_err());
        config = config_with_inputs();

        config.preview.quality = 0;
        assert!(config.validate().is_err());
        config = config_with_inputs();

        // "a" resolves to "a.pdf"
        config.output = PathBuf::from("a");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_output_path_enforces_extension() {
        let mut config = config_with_inputs();
        assert_eq!(config.output_path(), PathBuf::from("merged.pdf"));

        config.output = PathBuf::from("report");
        assert_eq!(config.output_path(), PathBuf::from("report.pdf"));

        config.output = PathBuf::from("REPORT.PDF");
        assert_eq!(config.output_path(), PathBuf::from("REPORT.PDF"));
    }

    #[test]
    fn test_effective_jobs() {
        let config = Config {
            jobs: Some(4),
            ..config_with_inputs()
        };
        assert_eq!(config.effective_jobs(), 4);

        let auto = Config {
            jobs: None,
            ..config
        };
        assert!(auto.effective_jobs() >= 1);
    }

    #[test]
    fn test_should_print() {
        let mut config = config_with_inputs();
        assert!(config.should_print());

        config.quiet = true;
        assert!(!config.should_print());

        config.dry_run = true;
        assert!(config.should_print());
    }

    #[test]
    fn test_read_edit_script() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"op": "remove", "index": 1}}, {{"op": "move", "index": 0, "direction": "left"}}]"#
        )
        .unwrap();

        let edits = read_edit_script(file.path()).unwrap();
        assert_eq!(
            edits,
            vec![
                Edit::Remove { index: 1 },
                Edit::Move {
                    index: 0,
                    direction: Direction::Left
                }
            ]
        );
    }

    #[test]
    fn test_read_edit_script_rejects_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"op": "explode"}}]"#).unwrap();

        let err = read_edit_script(file.path()).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid edit script"));
    }
}
