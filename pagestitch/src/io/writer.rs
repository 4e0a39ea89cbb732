//! Output delivery.
//!
//! This module hands compiled bytes to their destination with:
//! - Atomic writes (write to temp file, then rename)
//! - Overwrite protection
//! - `.pdf` extension enforcement
//! - Preview image export
//!
//! # Examples
//!
//! ```no_run
//! use pagestitch::io::writer::{Delivery, FileDelivery};
//! use pagestitch::config::OverwriteMode;
//!
//! # async fn example(bytes: Vec<u8>) -> Result<(), Box<dyn std::error::Error>> {
//! let delivery = FileDelivery::new("out", OverwriteMode::Force);
//! let path = delivery.offer(bytes, "merged").await?;
//! assert!(path.ends_with("merged.pdf"));
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::task;

use crate::config::OverwriteMode;
use crate::error::{Result, StitchError};
use crate::io::with_pdf_extension;
use crate::page_set::PageSet;

/// Write buffer size.
const BUFFER_SIZE: usize = 8192;

/// Destination for a compiled document.
///
/// The delivery takes ownership of the bytes and releases them once the
/// hand-off is done.
pub trait Delivery {
    /// Offer `bytes` as a file named `filename` (`.pdf` appended when
    /// missing). Returns where the file ended up.
    fn offer(&self, bytes: Vec<u8>, filename: &str) -> impl Future<Output = Result<PathBuf>> + Send;
}

/// Writes deliveries into a directory on disk.
#[derive(Debug, Clone)]
pub struct FileDelivery {
    dir: PathBuf,
    overwrite_mode: OverwriteMode,
}

impl FileDelivery {
    /// Deliver into `dir`.
    pub fn new(dir: impl Into<PathBuf>, overwrite_mode: OverwriteMode) -> Self {
        Self {
            dir: dir.into(),
            overwrite_mode,
        }
    }

    /// Target directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path a delivery named `filename` would be written to.
    pub fn target_path(&self, filename: &str) -> PathBuf {
        self.dir.join(with_pdf_extension(Path::new(filename)))
    }

    /// Check that a delivery named `filename` would be accepted.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::OutputExists`] if the target exists and the
    /// overwrite mode forbids replacing it, or [`StitchError::InvalidConfig`]
    /// if the target directory does not exist.
    pub async fn can_write(&self, filename: &str) -> Result<()> {
        let path = self.target_path(filename);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && tokio::fs::metadata(parent).await.is_err() {
                return Err(StitchError::invalid_config(format!(
                    "Output directory does not exist: {}",
                    parent.display()
                )));
            }
        }

        if self.overwrite_mode == OverwriteMode::NoClobber
            && tokio::fs::try_exists(&path).await.unwrap_or(false)
        {
            return Err(StitchError::output_exists(path));
        }

        Ok(())
    }
}

impl Delivery for FileDelivery {
    async fn offer(&self, bytes: Vec<u8>, filename: &str) -> Result<PathBuf> {
        self.can_write(filename).await?;

        let path = self.target_path(filename);
        let size = bytes.len();

        let written = task::spawn_blocking(move || write_atomic(&path, &bytes).map(|()| path))
            .await
            .map_err(|e| StitchError::other(format!("Write task failed: {e}")))??;

        tracing::info!(path = %written.display(), bytes = size, "delivered output");
        Ok(written)
    }
}

/// Write to a uniquely named temp file beside `path`, then rename over it.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let failed = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| StitchError::FailedToWrite { path, source }
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let temp = tempfile::Builder::new()
        .prefix(".pagestitch-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(failed(dir))?;

    let mut writer = std::io::BufWriter::with_capacity(BUFFER_SIZE, temp.as_file());
    writer.write_all(bytes).map_err(failed(temp.path()))?;
    writer.flush().map_err(failed(temp.path()))?;
    drop(writer);

    // on failure the temp file is removed when the error drops it
    temp.persist(path).map_err(|e| failed(path)(e.error))?;

    Ok(())
}

/// Keeps deliveries in memory.
#[derive(Debug, Default)]
pub struct MemoryDelivery {
    delivered: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryDelivery {
    /// Create an empty delivery sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything delivered so far, as `(filename, bytes)` pairs.
    pub fn take(&self) -> Vec<(String, Vec<u8>)> {
        match self.delivered.lock() {
            Ok(mut delivered) => std::mem::take(&mut *delivered),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl Delivery for MemoryDelivery {
    async fn offer(&self, bytes: Vec<u8>, filename: &str) -> Result<PathBuf> {
        let path = with_pdf_extension(Path::new(filename));
        let name = path.display().to_string();

        match self.delivered.lock() {
            Ok(mut delivered) => delivered.push((name, bytes)),
            Err(poisoned) => poisoned.into_inner().push((name, bytes)),
        }

        Ok(path)
    }
}

/// Write the preview of every page set entry into `dir`.
///
/// Files are named by output position: `page-001.jpg`, `page-002.jpg`, …
///
/// # Errors
///
/// Returns [`StitchError::FailedToWrite`] for the first file that cannot be
/// written.
pub async fn write_previews(page_set: &PageSet, dir: &Path) -> Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| StitchError::FailedToWrite {
            path: dir.to_path_buf(),
            source,
        })?;

    let mut written = Vec::with_capacity(page_set.len());
    for (position, entry) in page_set.iter().enumerate() {
        let preview = entry.preview();
        let path = dir.join(format!(
            "page-{:03}.{}",
            position + 1,
            preview.format().extension()
        ));

        tokio::fs::write(&path, preview.bytes())
            .await
            .map_err(|source| StitchError::FailedToWrite {
                path: path.clone(),
                source,
            })?;
        written.push(path);
    }

    tracing::debug!(dir = %dir.display(), previews = written.len(), "wrote previews");
    Ok(written)
}
