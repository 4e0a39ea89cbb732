//! Output formatting and display for pagestitch.
//!
//! This module handles all user-facing output including:
//! - Formatted status messages
//! - Per-file load results
//! - Page order listings
//! - Export summaries
//! - Quiet and verbose modes
//!
//! # Examples
//!
//! ```no_run
//! use pagestitch::output::OutputFormatter;
//! use pagestitch::config::Config;
//!
//! # fn example(config: Config) {
//! let formatter = OutputFormatter::from_config(&config);
//! formatter.info("Loading files");
//! formatter.success("Export completed");
//! # }
//! ```

pub mod formatter;

pub use formatter::{MessageLevel, OutputFormatter};

use crate::merge::CompileStatistics;
use crate::page_set::{PageReference, PageSet};
use crate::session::{FileOutcome, LoadReport};
use crate::source::SourceRegistry;

/// Display per-file load results.
///
/// Failed files are shown as warnings; successes only in verbose mode.
pub fn display_load_report(formatter: &OutputFormatter, report: &LoadReport) {
    for outcome in &report.files {
        match outcome {
            FileOutcome::Loaded {
                name,
                source_id,
                pages_added,
                reused,
            } => {
                let note = if *reused { ", already loaded" } else { "" };
                formatter.debug(&format!(
                    "{name}: {pages_added} page(s) [{source_id}{note}]"
                ));
            }
            FileOutcome::Failed { name, error } => {
                formatter.warning(&format!("Skipping {name}: {error}"));
            }
        }
    }

    if report.failed_count() > 0 {
        formatter.warning(&format!(
            "Warning: {} file(s) failed to load",
            report.failed_count()
        ));
    }

    formatter.info(&format!(
        "Loaded {} file(s): {} page(s)",
        report.loaded_count(),
        report.pages_added()
    ));
}

/// Describe one page set entry, e.g. `report.pdf p.3`.
pub fn describe_entry(entry: &PageReference, registry: &SourceRegistry) -> String {
    let source = registry
        .get(entry.source_id())
        .map(|source| source.name().to_string())
        .unwrap_or_else(|_| format!("<missing {}>", entry.source_id()));

    format!("{source} p.{}", entry.page_index() + 1)
}

/// List the page set in output order.
pub fn display_page_set(formatter: &OutputFormatter, page_set: &PageSet, registry: &SourceRegistry) {
    formatter.section(&format!("Output order ({} page(s)):", page_set.len()));

    for (position, entry) in page_set.iter().enumerate() {
        formatter.list_item(position + 1, &describe_entry(entry, registry));
    }
}

/// Display compile statistics.
pub fn display_compile_statistics(formatter: &OutputFormatter, stats: &CompileStatistics) {
    formatter.detail("Pages", &stats.pages.to_string());
    formatter.detail("Sources attached", &stats.sources_attached.to_string());
    formatter.detail("Output size", &stats.format_output_size());
    formatter.detail(
        "Compile time",
        &format!("{:.2}s", stats.compile_time.as_secs_f64()),
    );
}
