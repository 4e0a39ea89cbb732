//! Output compilation.
//!
//! This module turns a page set into one PDF with:
//! - Page copying across source documents
//! - One attachment per source, however many of its pages are used
//! - Inherited attribute materialization
//! - Metadata management
//! - Order preservation
//!
//! # Examples
//!
//! ```no_run
//! use pagestitch::merge::{CompileOptions, MergeCompiler};
//! use pagestitch::config::CompressionLevel;
//! # use pagestitch::{PageSet, SourceRegistry};
//!
//! # fn example(page_set: &PageSet, registry: &SourceRegistry) -> Result<(), Box<dyn std::error::Error>> {
//! let compiler = MergeCompiler::new(CompileOptions {
//!     compression: CompressionLevel::Maximum,
//!     ..Default::default()
//! });
//! let compiled = compiler.compile(page_set, registry)?;
//! println!("Compiled {} pages", compiled.statistics.pages);
//! # Ok(())
//! # }
//! ```

pub mod merger;
pub mod metadata;
pub mod pages;

pub use merger::{CompileOptions, CompileStatistics, CompiledDocument, MergeCompiler};
pub use metadata::MetadataManager;
pub use pages::OutputBuilder;

use crate::error::Result;
use crate::page_set::PageSet;
use crate::source::SourceRegistry;

/// Compile a page set with default options.
///
/// Convenience function that creates a compiler and returns the output bytes.
///
/// # Errors
///
/// Returns an error if any compile step fails.
pub fn compile(page_set: &PageSet, registry: &SourceRegistry) -> Result<Vec<u8>> {
    let compiled = MergeCompiler::default().compile(page_set, registry)?;
    Ok(compiled.bytes)
}
