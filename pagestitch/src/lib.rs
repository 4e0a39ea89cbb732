//! pagestitch - Reorder, delete and merge pages from several PDF documents.
//!
//! This library holds the page model and merge pipeline behind a page
//! editor. It supports:
//!
//! - Loading PDFs, deduplicated by content fingerprint
//! - One bounded-size preview image per page
//! - An ordered page set with move, remove and clear edits
//! - Compiling the page set into a single output PDF
//! - Concurrent multi-file loading with per-file failure reporting
//!
//! # Examples
//!
//! ## Session
//!
//! ```no_run
//! use pagestitch::{Edit, Session};
//! use pagestitch::io::{FileDelivery, InputReader};
//! use pagestitch::config::OverwriteMode;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (files, _stats) = InputReader::new().read_all(&paths, 4).await;
//!
//! let mut session = Session::default();
//! let report = session
//!     .load(files.into_iter().collect::<Result<_, _>>()?)
//!     .await;
//! println!("Loaded {} pages", report.pages_added());
//!
//! session.apply(&"remove:1".parse::<Edit>()?)?;
//! session.apply(&"move:0:right".parse::<Edit>()?)?;
//!
//! let delivery = FileDelivery::new(".", OverwriteMode::NoClobber);
//! let export = session.export("merged", &delivery).await?;
//! println!("Wrote {}", export.path.display());
//! # Ok(())
//! # }
//! ```
//!
//! ## Using Individual Components
//!
//! ```no_run
//! use pagestitch::{MergeCompiler, PageSet, PreviewPipeline, SourceRegistry};
//! use std::sync::Arc;
//!
//! # fn example(bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let mut registry = SourceRegistry::new();
//! let source = registry.register("input.pdf", bytes)?;
//!
//! let previews = PreviewPipeline::default().render_previews(&source)?;
//! let mut page_set = PageSet::new();
//! for (index, preview) in previews.into_iter().enumerate().rev() {
//!     page_set = page_set.append(&source, index, Arc::new(preview))?;
//! }
//!
//! let compiled = MergeCompiler::default().compile(&page_set, &registry)?;
//! println!("Reversed into {} bytes", compiled.bytes.len());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod output;
pub mod page_set;
pub mod preview;
pub mod session;
pub mod source;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use config::Config;
pub use error::{Result, StitchError};
pub use merge::{CompileOptions, CompiledDocument, MergeCompiler};
pub use page_set::{Direction, Edit, PageId, PageReference, PageSet};
pub use preview::{FrameRenderer, PageRenderer, Preview, PreviewFormat, PreviewPipeline, PreviewSettings};
pub use session::{FileOutcome, LoadReport, Session};
pub use source::{SourceDocument, SourceId, SourceRegistry};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
