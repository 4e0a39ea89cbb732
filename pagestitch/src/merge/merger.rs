//! Page set compilation.
//!
//! This module turns a finalized [`PageSet`] into a single output PDF by
//! copying each referenced page, in order, out of its source document.

use lopdf::Document;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::{CompressionLevel, Config, Metadata};
use crate::error::{Result, StitchError};
use crate::merge::metadata::MetadataManager;
use crate::merge::pages::OutputBuilder;
use crate::page_set::PageSet;
use crate::source::{SourceDocument, SourceRegistry};
use crate::utils::format_file_size;

/// Output options for a compile.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Stream compression applied before serializing.
    pub compression: CompressionLevel,

    /// Document information written to `/Info`.
    pub metadata: Metadata,
}

impl From<&Config> for CompileOptions {
    fn from(config: &Config) -> Self {
        Self {
            compression: config.compression,
            metadata: config.metadata.clone(),
        }
    }
}

/// Statistics about a compile.
#[derive(Debug, Clone)]
pub struct CompileStatistics {
    /// Pages in the output document.
    pub pages: usize,

    /// Distinct source documents attached.
    pub sources_attached: usize,

    /// Serialized size in bytes.
    pub output_size: u64,

    /// Total time taken for the compile.
    pub compile_time: Duration,

    /// Whether compression was applied.
    pub compressed: bool,
}

impl CompileStatistics {
    /// Format output size as human-readable string.
    pub fn format_output_size(&self) -> String {
        format_file_size(self.output_size)
    }
}

/// Result of a compile.
#[derive(Debug, Clone)]
pub struct CompiledDocument {
    /// Serialized PDF.
    pub bytes: Vec<u8>,

    /// Statistics about the compile.
    pub statistics: CompileStatistics,
}

/// Compiles page sets into output PDFs.
#[derive(Debug, Clone, Default)]
pub struct MergeCompiler {
    options: CompileOptions,
    metadata_manager: MetadataManager,
}

impl MergeCompiler {
    /// Create a compiler with the given options.
    pub fn new(options: CompileOptions) -> Self {
        Self {
            options,
            metadata_manager: MetadataManager::new(),
        }
    }

    /// Options in use.
    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    /// Compile `page_set` into a PDF byte stream.
    ///
    /// Every source the page set references is resolved before any output is
    /// built. Each source is attached at most once no matter how many of its
    /// pages are used.
    ///
    /// # Arguments
    ///
    /// * `page_set` - Pages to emit, in output order
    /// * `registry` - Registry the page set's sources live in
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The page set is empty ([`StitchError::EmptyPageSet`])
    /// - A source is no longer registered ([`StitchError::MissingSource`])
    /// - A page cannot be copied ([`StitchError::Copy`])
    /// - The output cannot be serialized ([`StitchError::Serialize`])
    ///
    /// No partial output is produced on error.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pagestitch::merge::MergeCompiler;
    /// # use pagestitch::{PageSet, SourceRegistry};
    /// # fn example(page_set: &PageSet, registry: &SourceRegistry) -> Result<(), Box<dyn std::error::Error>> {
    /// let compiler = MergeCompiler::default();
    /// let compiled = compiler.compile(page_set, registry)?;
    /// println!("Compiled {} pages ({})",
    ///          compiled.statistics.pages,
    ///          compiled.statistics.format_output_size());
    /// # Ok(())
    /// # }
    /// ```
    pub fn compile(&self, page_set: &PageSet, registry: &SourceRegistry) -> Result<CompiledDocument> {
        let start = Instant::now();

        if page_set.is_empty() {
            return Err(StitchError::EmptyPageSet);
        }

        let sources = resolve_sources(page_set, registry)?;

        let mut builder = OutputBuilder::new();
        for (entry, source) in page_set.iter().zip(&sources) {
            builder.push_page(source, entry.page_index())?;
        }

        let sources_attached = builder.sources_attached();
        let mut document = builder.finish();
        self.finalize(&mut document);

        let bytes = serialize(&mut document)?;
        let statistics = CompileStatistics {
            pages: page_set.len(),
            sources_attached,
            output_size: bytes.len() as u64,
            compile_time: start.elapsed(),
            compressed: self.options.compression != CompressionLevel::None,
        };

        tracing::info!(
            pages = statistics.pages,
            sources = statistics.sources_attached,
            bytes = statistics.output_size,
            elapsed_ms = statistics.compile_time.as_millis() as u64,
            "compiled page set"
        );

        Ok(CompiledDocument { bytes, statistics })
    }

    /// Apply metadata and compression.
    fn finalize(&self, document: &mut Document) {
        self.metadata_manager
            .set_metadata(document, &self.options.metadata);

        match self.options.compression {
            CompressionLevel::None => {}
            CompressionLevel::Standard => {
                document.compress();
            }
            CompressionLevel::Maximum => {
                document.compress();
                document.prune_objects();
            }
        }

        document.renumber_objects();
    }
}

/// Look up the source of every entry, in page set order.
fn resolve_sources(page_set: &PageSet, registry: &SourceRegistry) -> Result<Vec<Arc<SourceDocument>>> {
    page_set
        .iter()
        .map(|entry| {
            registry
                .get(entry.source_id())
                .map_err(|_| StitchError::MissingSource {
                    source_id: entry.source_id().clone(),
                })
        })
        .collect()
}

fn serialize(document: &mut Document) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    document
        .save_to(&mut bytes)
        .map_err(|e| StitchError::serialize(e.to_string()))?;
    Ok(bytes)
}
