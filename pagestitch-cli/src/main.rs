//! pagestitch - Reorder, delete and merge pages from several PDF documents.
//!
//! Loads every input, applies the requested edits to the page list and
//! writes the remaining pages to a single PDF.

mod cli;

use clap::Parser;
use std::path::Path;
use std::process;
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use pagestitch::Session;
use pagestitch::config::Config;
use pagestitch::error::StitchError;
use pagestitch::io::{FileDelivery, InputFile, InputReader, write_previews};
use pagestitch::output::{
    OutputFormatter, display_compile_statistics, display_load_report, display_page_set,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Log to stderr. `RUST_LOG` wins over the verbosity flag.
fn init_tracing(verbose: bool) {
    let default = if verbose { "pagestitch=debug" } else { "error" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic.
async fn run(cli: Cli) -> Result<(), StitchError> {
    let config = cli.to_config()?;
    let formatter = OutputFormatter::from_config(&config);

    if formatter.should_print() {
        formatter.section(&format!("{} v{}", pagestitch::NAME, pagestitch::VERSION));
        formatter.blank_line();
    }

    let delivery = output_delivery(&config);
    let filename = output_filename(&config);
    if !config.dry_run {
        delivery.can_write(&filename).await?;
    }

    formatter.info("Reading input files...");
    let files = read_inputs(&config, &formatter).await;

    let mut session = Session::from_config(&config);
    let report = session.load(files).await;
    display_load_report(&formatter, &report);

    session.apply_all(&config.edits)?;
    if !config.edits.is_empty() {
        formatter.info(&format!(
            "Applied {} edit(s): {} page(s) remain",
            config.edits.len(),
            session.page_set().len()
        ));
    }

    if let Some(dir) = &config.preview_dir {
        let written = write_previews(session.page_set(), dir).await?;
        formatter.info(&format!(
            "Wrote {} preview(s) to {}",
            written.len(),
            dir.display()
        ));
    }

    if config.dry_run {
        display_page_set(&formatter, session.page_set(), session.registry());
        formatter.blank_line();
        formatter.success("Dry run completed successfully");
        formatter.info(&format!(
            "  Output would be: {}",
            delivery.target_path(&filename).display()
        ));
        return Ok(());
    }

    if formatter.is_verbose() {
        display_page_set(&formatter, session.page_set(), session.registry());
        formatter.blank_line();
    }

    formatter.info("Compiling output...");
    let export = session.export(&filename, &delivery).await?;

    formatter.blank_line();
    formatter.success(&format!(
        "Successfully created {} ({})",
        export.path.display(),
        export.statistics.format_output_size()
    ));

    if formatter.is_verbose() {
        formatter.blank_line();
        formatter.section("Statistics");
        display_compile_statistics(&formatter, &export.statistics);
        formatter.detail(
            "Compression",
            if export.statistics.compressed { "Yes" } else { "No" },
        );
        if !config.metadata.is_empty() {
            formatter.detail("Metadata", "Set");
        }
    }

    Ok(())
}

/// Read every input; unreadable files are reported and skipped.
async fn read_inputs(config: &Config, formatter: &OutputFormatter) -> Vec<InputFile> {
    let reader = InputReader::new();
    let (results, stats) = reader
        .read_all(&config.inputs, config.effective_jobs())
        .await;

    formatter.debug(&format!(
        "Read {} file(s) ({}) in {:.2}s",
        stats.success_count,
        stats.format_total_size(),
        stats.total_time.as_secs_f64()
    ));

    results
        .into_iter()
        .filter_map(|result| match result {
            Ok(file) => Some(file),
            Err(err) => {
                formatter.warning(&format!("Skipping input: {err}"));
                None
            }
        })
        .collect()
}

fn output_delivery(config: &Config) -> FileDelivery {
    let output = config.output_path();
    let dir = output
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    FileDelivery::new(dir, config.overwrite_mode)
}

fn output_filename(config: &Config) -> String {
    config
        .output_path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| pagestitch::config::DEFAULT_OUTPUT_NAME.to_string())
}
