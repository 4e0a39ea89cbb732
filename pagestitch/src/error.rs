//! Error types for pagestitch.
//!
//! Every fallible operation in the crate returns [`StitchError`]. Errors are
//! grouped by how far they are allowed to propagate:
//!
//! - **Per-file errors** (`Decode`, `Render`): abort loading a single input
//!   file; the rest of a multi-file load continues.
//! - **Export errors** (`MissingSource`, `Copy`, `Serialize`, `EmptyPageSet`):
//!   abort the whole export, nothing is delivered.
//! - **Invariant violations** (`InvalidPageIndex`, `IndexOutOfRange`): a
//!   caller handed the core an index it never should have produced.

use std::io;
use std::path::PathBuf;

use crate::source::SourceId;

/// Result type alias for pagestitch operations.
pub type Result<T> = std::result::Result<T, StitchError>;

/// Main error type for pagestitch operations.
#[derive(Debug, thiserror::Error)]
pub enum StitchError {
    /// Input bytes are not a PDF the container codec can decode.
    #[error("Failed to decode PDF: {name}\n  Reason: {reason}")]
    Decode {
        /// Display name of the input.
        name: String,
        /// Reason reported by the decoder.
        reason: String,
    },

    /// A page could not be rasterized into a preview.
    #[error("Failed to render page {} of {name}\n  Reason: {reason}", .page + 1)]
    Render {
        /// Display name of the source document.
        name: String,
        /// 0-based page index.
        page: usize,
        /// Reason reported by the renderer.
        reason: String,
    },

    /// A rendered bitmap could not be encoded.
    #[error("Failed to encode preview: {reason}")]
    Encode {
        /// Reason reported by the encoder.
        reason: String,
    },

    /// A page reference was requested for a page the source does not have.
    #[error(
        "Invalid page index {page_index} for source {source_id}\n  \
         Source has {page_count} page(s)"
    )]
    InvalidPageIndex {
        /// Source the reference would point at.
        source_id: SourceId,
        /// Requested 0-based page index.
        page_index: usize,
        /// Page count of the source.
        page_count: usize,
    },

    /// A position in the page set does not exist.
    #[error("Index {index} is out of range for a page set of {len} page(s)")]
    IndexOutOfRange {
        /// Requested position.
        index: usize,
        /// Current length of the page set.
        len: usize,
    },

    /// The page set references a source that is no longer registered.
    #[error("Page set references source {source_id}, which is not loaded")]
    MissingSource {
        /// Unresolved source identity.
        source_id: SourceId,
    },

    /// Registry lookup for an unknown source.
    #[error("No source registered with id {source_id}")]
    SourceNotFound {
        /// Requested source identity.
        source_id: SourceId,
    },

    /// Export was requested with nothing to export.
    #[error("The page set is empty; add pages before exporting")]
    EmptyPageSet,

    /// Copying a page into the output document failed.
    #[error("Failed to copy page {} of source {source_id}\n  Reason: {reason}", .page_index + 1)]
    Copy {
        /// Source being copied from.
        source_id: SourceId,
        /// 0-based page index.
        page_index: usize,
        /// Details about the failure.
        reason: String,
    },

    /// The output document could not be serialized.
    #[error("Failed to serialize output document: {reason}")]
    Serialize {
        /// Details about the failure.
        reason: String,
    },

    /// Input file was not found.
    #[error("File not found: {}", .path.display())]
    FileNotFound {
        /// Path to the file that was not found.
        path: PathBuf,
    },

    /// Output file already exists and overwrite is not allowed.
    #[error(
        "Output file already exists: {}\n  \
         Use --force to overwrite or choose a different output name",
        .path.display()
    )]
    OutputExists {
        /// Path to the existing output file.
        path: PathBuf,
    },

    /// Failed to write an output file.
    #[error("Failed to write to output file: {}\n  Reason: {source}", .path.display())]
    FailedToWrite {
        /// Path being written to.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// An edit could not be parsed.
    #[error("Invalid edit '{edit}': {reason}")]
    InvalidEdit {
        /// Edit as written by the user.
        edit: String,
        /// What is wrong with it.
        reason: String,
    },

    /// Invalid configuration.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what's wrong with the configuration.
        message: String,
    },

    /// Generic I/O error.
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// Generic error with a custom message.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl From<lopdf::Error> for StitchError {
    fn from(err: lopdf::Error) -> Self {
        Self::other(err.to_string())
    }
}

impl From<image::ImageError> for StitchError {
    fn from(err: image::ImageError) -> Self {
        Self::Encode {
            reason: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for StitchError {
    fn from(err: anyhow::Error) -> Self {
        Self::invalid_config(format!("{err:#}"))
    }
}

impl StitchError {
    /// Create a Decode error.
    pub fn decode(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a Render error.
    pub fn render(name: impl Into<String>, page: usize, reason: impl Into<String>) -> Self {
        Self::Render {
            name: name.into(),
            page,
            reason: reason.into(),
        }
    }

    /// Create a Copy error.
    pub fn copy(source_id: SourceId, page_index: usize, reason: impl Into<String>) -> Self {
        Self::Copy {
            source_id,
            page_index,
            reason: reason.into(),
        }
    }

    /// Create a Serialize error.
    pub fn serialize(reason: impl Into<String>) -> Self {
        Self::Serialize {
            reason: reason.into(),
        }
    }

    /// Create an InvalidEdit error.
    pub fn invalid_edit(edit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEdit {
            edit: edit.into(),
            reason: reason.into(),
        }
    }

    /// Create an InvalidConfig error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create an OutputExists error.
    pub fn output_exists(path: PathBuf) -> Self {
        Self::OutputExists { path }
    }

    /// Create an Other error with a custom message.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Check if this error only affects a single input file.
    ///
    /// Recoverable errors are reported per file during a load; the rest of
    /// the batch keeps going.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Render { .. } | Self::Encode { .. } | Self::FileNotFound { .. }
        )
    }

    /// Check if this error should stop all processing immediately.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidPageIndex { .. }
                | Self::IndexOutOfRange { .. }
                | Self::MissingSource { .. }
                | Self::Copy { .. }
                | Self::Serialize { .. }
                | Self::FailedToWrite { .. }
        )
    }

    /// Get the process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. } => 2,
            Self::Decode { .. } => 3,
            Self::Render { .. } => 3,
            Self::Encode { .. } => 3,
            Self::OutputExists { .. } => 4,
            Self::FailedToWrite { .. } => 5,
            Self::Io { .. } => 5,
            Self::MissingSource { .. } => 6,
            Self::SourceNotFound { .. } => 6,
            Self::Copy { .. } => 6,
            Self::Serialize { .. } => 6,
            Self::InvalidPageIndex { .. } => 70,
            Self::IndexOutOfRange { .. } => 70,
            Self::EmptyPageSet => 1,
            Self::InvalidEdit { .. } => 1,
            Self::InvalidConfig { .. } => 1,
            Self::Other { .. } => 1,
        }
    }
}
