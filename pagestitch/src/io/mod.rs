//! I/O operations for pagestitch.
//!
//! This module handles all file I/O including:
//! - Reading input files into memory
//! - Delivering compiled PDFs to disk
//! - Writing page previews
//!
//! # Examples
//!
//! ```no_run
//! use pagestitch::io::{Delivery, FileDelivery, InputReader};
//! use pagestitch::config::OverwriteMode;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let input = InputReader::new().read(Path::new("input.pdf")).await?;
//!
//! let delivery = FileDelivery::new(".", OverwriteMode::Force);
//! delivery.offer(input.bytes, "copy.pdf").await?;
//! # Ok(())
//! # }
//! ```

pub mod reader;
pub mod writer;

pub use reader::{InputFile, InputReader, ReadResult, ReadStatistics};
pub use writer::{Delivery, FileDelivery, MemoryDelivery, write_previews};

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Append `.pdf` to `path` unless it already ends in `.pdf` (any case).
///
/// An empty path becomes [`DEFAULT_OUTPUT_NAME`](crate::config::DEFAULT_OUTPUT_NAME).
pub fn with_pdf_extension(path: &Path) -> PathBuf {
    if path.as_os_str().is_empty() {
        return PathBuf::from(crate::config::DEFAULT_OUTPUT_NAME);
    }

    let has_pdf_extension = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if has_pdf_extension {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".pdf");
    PathBuf::from(name)
}
