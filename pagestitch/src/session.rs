//! The editing session.
//!
//! A [`Session`] owns the source registry, the current page set, the preview
//! pipeline and the compiler. Every operation takes `&mut self`, so a load
//! can never overlap an export or another load.
//!
//! Loading a batch of files works per file and all-or-nothing: a file either
//! contributes all of its pages or none. Files that fail to decode or render
//! are reported in the [`LoadReport`] and do not affect the rest of the
//! batch. Distinct new files are decoded and rendered concurrently; results
//! are committed in input order.

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;

use crate::config::Config;
use crate::error::{Result, StitchError};
use crate::io::{Delivery, InputFile};
use crate::merge::{CompileOptions, CompileStatistics, CompiledDocument, MergeCompiler};
use crate::page_set::{Edit, PageSet};
use crate::preview::{Preview, PreviewPipeline};
use crate::source::{SourceDocument, SourceId, SourceRegistry};

/// What happened to one file of a load.
#[derive(Debug)]
pub enum FileOutcome {
    /// The file's pages were appended.
    Loaded {
        /// File name.
        name: String,
        /// Identity of the source the pages came from.
        source_id: SourceId,
        /// Number of pages appended.
        pages_added: usize,
        /// True if the content was already loaded and was not decoded again.
        reused: bool,
    },
    /// The file contributed no pages.
    Failed {
        /// File name.
        name: String,
        /// Why it failed.
        error: StitchError,
    },
}

impl FileOutcome {
    /// File name this outcome is about.
    pub fn name(&self) -> &str {
        match self {
            Self::Loaded { name, .. } | Self::Failed { name, .. } => name,
        }
    }
}

/// Per-file results of a load, in input order.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// One outcome per input file.
    pub files: Vec<FileOutcome>,
}

impl LoadReport {
    /// Number of files whose pages were appended.
    pub fn loaded_count(&self) -> usize {
        self.files
            .iter()
            .filter(|outcome| matches!(outcome, FileOutcome::Loaded { .. }))
            .count()
    }

    /// Number of files that contributed nothing.
    pub fn failed_count(&self) -> usize {
        self.files.len() - self.loaded_count()
    }

    /// Total pages appended by this load.
    pub fn pages_added(&self) -> usize {
        self.files
            .iter()
            .map(|outcome| match outcome {
                FileOutcome::Loaded { pages_added, .. } => *pages_added,
                FileOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    /// Failed files and their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &StitchError)> {
        self.files.iter().filter_map(|outcome| match outcome {
            FileOutcome::Failed { name, error } => Some((name.as_str(), error)),
            FileOutcome::Loaded { .. } => None,
        })
    }

    /// Check whether every file loaded.
    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Result of an export.
#[derive(Debug, Clone)]
pub struct ExportReport {
    /// Where the delivery put the file.
    pub path: PathBuf,
    /// Statistics about the compile.
    pub statistics: CompileStatistics,
}

type Decoded = Result<(SourceDocument, Vec<Preview>)>;

/// How a file of a batch gets its pages.
enum Plan {
    /// New content; decoded by job number.
    Decode(usize),
    /// Content already loaded, or decoded earlier in the same batch.
    Known,
}

/// Owner of all state for one merge.
#[derive(Debug)]
pub struct Session {
    registry: SourceRegistry,
    page_set: PageSet,
    pipeline: PreviewPipeline,
    compiler: MergeCompiler,
    jobs: usize,
}

impl Session {
    /// Create a session from its parts.
    pub fn new(pipeline: PreviewPipeline, compiler: MergeCompiler) -> Self {
        Self {
            registry: SourceRegistry::new(),
            page_set: PageSet::new(),
            pipeline,
            compiler,
            jobs: 1,
        }
    }

    /// Create a session configured from `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            PreviewPipeline::new(config.preview),
            MergeCompiler::new(CompileOptions::from(config)),
        )
        .with_jobs(config.effective_jobs())
    }

    /// Decode at most `jobs` files at once.
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Loaded sources.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Current page set.
    pub fn page_set(&self) -> &PageSet {
        &self.page_set
    }

    /// Load a batch of files, appending their pages in input order.
    ///
    /// Never fails as a whole: per-file failures are reported in the
    /// returned [`LoadReport`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use pagestitch::Session;
    /// # use pagestitch::io::InputFile;
    /// # async fn example(mut session: Session, a: Vec<u8>, b: Vec<u8>) {
    /// let report = session
    ///     .load(vec![InputFile::from_bytes("a.pdf", a), InputFile::from_bytes("b.pdf", b)])
    ///     .await;
    /// for (name, error) in report.failures() {
    ///     eprintln!("Skipped {name}: {error}");
    /// }
    /// # }
    /// ```
    pub async fn load(&mut self, files: Vec<InputFile>) -> LoadReport {
        let mut names = Vec::with_capacity(files.len());
        let mut ids: Vec<SourceId> = Vec::with_capacity(files.len());
        let mut plans = Vec::with_capacity(files.len());
        let mut jobs = Vec::new();

        for file in files {
            let id = SourceId::of(&file.bytes);

            if self.registry.contains(&id) || ids.contains(&id) {
                plans.push(Plan::Known);
            } else {
                plans.push(Plan::Decode(jobs.len()));
                jobs.push((file.name.clone(), file.bytes));
            }

            names.push(file.name);
            ids.push(id);
        }

        tracing::debug!(
            files = names.len(),
            to_decode = jobs.len(),
            jobs = self.jobs,
            "loading batch"
        );

        let mut decoded: Vec<Option<Decoded>> =
            self.decode_all(jobs).await.into_iter().map(Some).collect();

        let mut failed: HashMap<SourceId, StitchError> = HashMap::new();
        let mut report = LoadReport::default();

        for ((name, id), plan) in names.into_iter().zip(ids).zip(plans) {
            let outcome = match plan {
                Plan::Decode(job) => match decoded[job].take() {
                    Some(Ok((document, previews))) => self.commit_new(name, document, previews),
                    Some(Err(error)) => {
                        let outcome = FileOutcome::Failed {
                            error: repeat_failure(&error, &name),
                            name,
                        };
                        failed.insert(id, error);
                        outcome
                    }
                    None => FileOutcome::Failed {
                        error: StitchError::other("decode result already consumed"),
                        name,
                    },
                },
                Plan::Known => match failed.get(&id) {
                    Some(error) => FileOutcome::Failed {
                        error: repeat_failure(error, &name),
                        name,
                    },
                    None => self.commit_known(name, &id).await,
                },
            };

            match &outcome {
                FileOutcome::Loaded {
                    name,
                    pages_added,
                    reused,
                    ..
                } => tracing::info!(file = %name, pages = pages_added, reused, "loaded file"),
                FileOutcome::Failed { name, error } => {
                    tracing::warn!(file = %name, %error, "file skipped")
                }
            }

            report.files.push(outcome);
        }

        report
    }

    /// Decode and render every job, at most `self.jobs` at a time.
    async fn decode_all(&self, jobs: Vec<(String, Vec<u8>)>) -> Vec<Decoded> {
        let tasks = jobs.into_iter().map(|(name, bytes)| {
            let pipeline = self.pipeline.clone();
            async move {
                task::spawn_blocking(move || -> Decoded {
                    let document = SourceDocument::decode(name, &bytes)?;
                    drop(bytes);
                    let previews = pipeline.render_previews(&document)?;
                    Ok((document, previews))
                })
                .await
                .unwrap_or_else(|e| Err(StitchError::other(format!("Load task failed: {e}"))))
            }
        });

        stream::iter(tasks).buffered(self.jobs).collect().await
    }

    /// Register a freshly decoded source and append its pages.
    fn commit_new(&mut self, name: String, document: SourceDocument, previews: Vec<Preview>) -> FileOutcome {
        let previews: Vec<Arc<Preview>> = previews.into_iter().map(Arc::new).collect();

        let page_set = match append_pages(&self.page_set, &document, &previews) {
            Ok(page_set) => page_set,
            Err(error) => return FileOutcome::Failed { name, error },
        };

        let source = self.registry.insert(document);
        self.page_set = page_set;

        FileOutcome::Loaded {
            name,
            source_id: source.id().clone(),
            pages_added: source.page_count(),
            reused: false,
        }
    }

    /// Append the pages of an already registered source again.
    ///
    /// The document is not decoded again, but the new references get
    /// previews of their own.
    async fn commit_known(&mut self, name: String, id: &SourceId) -> FileOutcome {
        let source = match self.registry.get(id) {
            Ok(source) => source,
            Err(error) => return FileOutcome::Failed { name, error },
        };

        let pipeline = self.pipeline.clone();
        let rendered = task::spawn_blocking({
            let source = Arc::clone(&source);
            move || pipeline.render_previews(&source)
        })
        .await
        .unwrap_or_else(|e| Err(StitchError::other(format!("Render task failed: {e}"))));

        let previews: Vec<Arc<Preview>> = match rendered {
            Ok(previews) => previews.into_iter().map(Arc::new).collect(),
            Err(error) => return FileOutcome::Failed { name, error },
        };

        match append_pages(&self.page_set, &source, &previews) {
            Ok(page_set) => {
                self.page_set = page_set;
                FileOutcome::Loaded {
                    name,
                    source_id: id.clone(),
                    pages_added: source.page_count(),
                    reused: true,
                }
            }
            Err(error) => FileOutcome::Failed { name, error },
        }
    }

    /// Apply one edit to the page set.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::IndexOutOfRange`] for a removal past the end;
    /// the page set is unchanged in that case.
    pub fn apply(&mut self, edit: &Edit) -> Result<()> {
        self.page_set = self.page_set.apply(edit)?;
        tracing::debug!(%edit, pages = self.page_set.len(), "applied edit");
        Ok(())
    }

    /// Apply edits in order, stopping at the first failure.
    ///
    /// Edits before the failing one stay applied.
    pub fn apply_all(&mut self, edits: &[Edit]) -> Result<()> {
        edits.iter().try_for_each(|edit| self.apply(edit))
    }

    /// Compile the current page set without delivering it.
    pub fn compile(&self) -> Result<CompiledDocument> {
        self.compiler.compile(&self.page_set, &self.registry)
    }

    /// Compile the current page set and hand it to `delivery` as `filename`.
    ///
    /// # Errors
    ///
    /// Any compile error aborts the export before anything is delivered.
    /// Delivery errors are returned as is.
    pub async fn export<D: Delivery>(&mut self, filename: &str, delivery: &D) -> Result<ExportReport> {
        let CompiledDocument { bytes, statistics } = self.compile()?;
        let path = delivery.offer(bytes, filename).await?;

        Ok(ExportReport { path, statistics })
    }

    /// Drop every page and release every source.
    pub fn reset(&mut self) {
        self.page_set = self.page_set.clear();
        self.registry.clear();
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(PreviewPipeline::default(), MergeCompiler::default())
    }
}

/// The error reported for a repeat, under `name`, of a file that failed
/// earlier in the same batch.
fn repeat_failure(error: &StitchError, name: &str) -> StitchError {
    match error {
        StitchError::Decode { reason, .. } => StitchError::decode(name, reason.clone()),
        StitchError::Render { page, reason, .. } => StitchError::render(name, *page, reason.clone()),
        other => StitchError::other(other.to_string()),
    }
}

fn append_pages(page_set: &PageSet, source: &SourceDocument, previews: &[Arc<Preview>]) -> Result<PageSet> {
    previews
        .iter()
        .enumerate()
        .try_fold(page_set.clone(), |set, (page_index, preview)| {
            set.append(source, page_index, Arc::clone(preview))
        })
}
