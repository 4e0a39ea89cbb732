//! Input file reading.
//!
//! This module reads input files into memory with support for:
//! - Sequential and parallel reading
//! - Results kept in input order
//! - Read statistics
//!
//! Decoding happens later in the session, so a file that reads fine but is
//! not a PDF still produces an [`InputFile`].
//!
//! # Examples
//!
//! ```no_run
//! use pagestitch::io::reader::InputReader;
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let reader = InputReader::new();
//! let paths = vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")];
//! let (results, stats) = reader.read_all(&paths, 4).await;
//! println!("Read {} files ({})", stats.success_count, stats.format_total_size());
//! # Ok(())
//! # }
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::error::{Result, StitchError};
use crate::utils::format_file_size;

/// Batches up to this size are read sequentially.
const SEQUENTIAL_THRESHOLD: usize = 3;

/// An input file held in memory.
#[derive(Debug, Clone)]
pub struct InputFile {
    /// Display name (the file name component of the path).
    pub name: String,

    /// Path the file was read from.
    pub path: PathBuf,

    /// Raw file contents.
    pub bytes: Vec<u8>,
}

impl InputFile {
    /// Wrap bytes that did not come from disk.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        Self {
            path: PathBuf::from(&name),
            name,
            bytes,
        }
    }
}

/// Result of reading one file.
pub type ReadResult = Result<InputFile>;

/// Statistics for a batch read.
#[derive(Debug, Clone)]
pub struct ReadStatistics {
    /// Number of files read.
    pub success_count: usize,

    /// Number of files that could not be read.
    pub failure_count: usize,

    /// Total time taken for all reads.
    pub total_time: Duration,

    /// Total size of the files read.
    pub total_size: u64,
}

impl ReadStatistics {
    fn from_results(results: &[ReadResult], total_time: Duration) -> Self {
        let success_count = results.iter().filter(|r| r.is_ok()).count();
        let total_size = results
            .iter()
            .flatten()
            .map(|file| file.bytes.len() as u64)
            .sum();

        Self {
            success_count,
            failure_count: results.len() - success_count,
            total_time,
            total_size,
        }
    }

    /// Format total size as human-readable string.
    pub fn format_total_size(&self) -> String {
        format_file_size(self.total_size)
    }
}

/// Reads input files asynchronously.
#[derive(Debug, Clone, Copy, Default)]
pub struct InputReader;

impl InputReader {
    /// Create a new reader.
    pub fn new() -> Self {
        Self
    }

    /// Read a single file.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::FileNotFound`] if the path does not exist, and
    /// [`StitchError::Io`] for any other read failure.
    pub async fn read(&self, path: &Path) -> ReadResult {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => StitchError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => StitchError::Io { source: e },
        })?;

        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        tracing::debug!(path = %path.display(), bytes = bytes.len(), "read input file");

        Ok(InputFile {
            name,
            path: path.to_path_buf(),
            bytes,
        })
    }

    /// Read files one at a time in the order provided.
    pub async fn read_sequential(&self, paths: &[PathBuf]) -> Vec<ReadResult> {
        let mut results = Vec::with_capacity(paths.len());

        for path in paths {
            results.push(self.read(path).await);
        }

        results
    }

    /// Read files concurrently with at most `workers` in flight.
    ///
    /// Results come back in the same order as `paths`.
    pub async fn read_parallel(&self, paths: &[PathBuf], workers: usize) -> Vec<ReadResult> {
        use futures::stream::{self, StreamExt};

        let tasks = paths.iter().map(|path| async move { self.read(path).await });

        stream::iter(tasks)
            .buffered(workers.max(1))
            .collect::<Vec<_>>()
            .await
    }

    /// Read all files, choosing sequential or parallel reading by batch size.
    ///
    /// # Returns
    ///
    /// One result per path, in input order, plus aggregate statistics.
    pub async fn read_all(
        &self,
        paths: &[PathBuf],
        max_workers: usize,
    ) -> (Vec<ReadResult>, ReadStatistics) {
        let start = Instant::now();

        let results = if paths.len() <= SEQUENTIAL_THRESHOLD {
            self.read_sequential(paths).await
        } else {
            self.read_parallel(paths, max_workers).await
        };

        let stats = ReadStatistics::from_results(&results, start.elapsed());
        (results, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("file{i}.pdf"));
                std::fs::write(&path, format!("contents {i}")).unwrap();
                path
            })
            .collect()
    }

    #[tokio::test]
    async fn test_read_single_file() {
        let dir = TempDir::new().unwrap();
        let paths = write_files(&dir, 1);

        let file = InputReader::new().read(&paths[0]).await.unwrap();
        assert_eq!(file.name, "file0.pdf");
        assert_eq!(file.bytes, b"contents 0");
    }

    #[tokio::test]
    async fn test_read_missing_file() {
        let err = InputReader::new()
            .read(Path::new("/nonexistent/file.pdf"))
            .await
            .unwrap_err();
        assert!(matches!(err, StitchError::FileNotFound { .. }));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_parallel_read_keeps_order() {
        let dir = TempDir::new().unwrap();
        let mut paths = write_files(&dir, 6);
        paths.insert(2, dir.path().join("missing.pdf"));

        let (results, stats) = InputReader::new().read_all(&paths, 3).await;

        assert_eq!(results.len(), 7);
        assert!(results[2].is_err());
        assert_eq!(results[3].as_ref().unwrap().name, "file2.pdf");
        assert_eq!(stats.success_count, 6);
        assert_eq!(stats.failure_count, 1);
    }

    #[test]
    fn test_from_bytes() {
        let file = InputFile::from_bytes("upload.pdf", vec![1, 2, 3]);
        assert_eq!(file.name, "upload.pdf");
        assert_eq!(file.path, PathBuf::from("upload.pdf"));
    }
}
