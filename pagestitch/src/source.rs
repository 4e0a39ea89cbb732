//! Loaded source documents and the registry that owns them.
//!
//! A [`SourceDocument`] is created the first time a given byte stream is
//! decoded and never changes afterwards. The [`SourceRegistry`] keys sources
//! by a SHA-256 fingerprint of their bytes, so uploading the same file twice
//! reuses the decoded document instead of decoding it again.
//!
//! Fingerprint collisions are not handled: two different byte streams with
//! the same SHA-256 digest would be treated as one source.

use lopdf::Document;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StitchError};

/// Content identity of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Fingerprint a byte stream.
    pub fn of(bytes: &[u8]) -> Self {
        let digest = Sha256::digest(bytes);
        Self(format!("{digest:x}"))
    }

    /// Full hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for display.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short())
    }
}

/// A decoded PDF that provides pages.
#[derive(Debug)]
pub struct SourceDocument {
    id: SourceId,
    name: String,
    byte_len: u64,
    document: Document,
    page_count: usize,
}

impl SourceDocument {
    /// Decode `bytes` into a source document.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Decode`] if the bytes are not a PDF, if the
    /// PDF is encrypted, or if it has no pages.
    pub fn decode(name: impl Into<String>, bytes: &[u8]) -> Result<Self> {
        let name = name.into();
        let id = SourceId::of(bytes);

        let document =
            Document::load_mem(bytes).map_err(|e| StitchError::decode(&name, e.to_string()))?;

        if document.trailer.has(b"Encrypt") {
            return Err(StitchError::decode(
                &name,
                "PDF is encrypted; decrypt it before loading",
            ));
        }

        let page_count = document.get_pages().len();
        if page_count == 0 {
            return Err(StitchError::decode(&name, "PDF has no pages"));
        }

        tracing::debug!(source = %id, %name, page_count, "decoded source document");

        Ok(Self {
            id,
            name,
            byte_len: bytes.len() as u64,
            document,
            page_count,
        })
    }

    /// Content identity.
    pub fn id(&self) -> &SourceId {
        &self.id
    }

    /// Display name (usually the file name it was loaded from).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Size of the original byte stream.
    pub fn byte_len(&self) -> u64 {
        self.byte_len
    }

    /// Decoded document handle.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_count
    }
}

/// Owner of every loaded source document, keyed by content identity.
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: HashMap<SourceId, Arc<SourceDocument>>,
    order: Vec<SourceId>,
}

impl SourceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a byte stream, decoding it only if it is new.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Decode`] if the bytes are new and cannot be
    /// decoded. The registry is unchanged in that case.
    pub fn register(&mut self, name: &str, bytes: &[u8]) -> Result<Arc<SourceDocument>> {
        let id = SourceId::of(bytes);
        if let Some(existing) = self.sources.get(&id) {
            tracing::debug!(source = %id, name, "source already registered");
            return Ok(Arc::clone(existing));
        }

        let document = SourceDocument::decode(name, bytes)?;
        Ok(self.insert(document))
    }

    /// Store an already decoded document.
    ///
    /// If a document with the same identity is already registered, the new
    /// one is dropped and the existing entry is returned.
    pub fn insert(&mut self, document: SourceDocument) -> Arc<SourceDocument> {
        if let Some(existing) = self.sources.get(document.id()) {
            return Arc::clone(existing);
        }

        let id = document.id().clone();
        let document = Arc::new(document);
        self.sources.insert(id.clone(), Arc::clone(&document));
        self.order.push(id);
        document
    }

    /// Look up a source.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::SourceNotFound`] for unknown ids.
    pub fn get(&self, id: &SourceId) -> Result<Arc<SourceDocument>> {
        self.sources
            .get(id)
            .cloned()
            .ok_or_else(|| StitchError::SourceNotFound {
                source_id: id.clone(),
            })
    }

    /// Check whether a source is registered.
    pub fn contains(&self, id: &SourceId) -> bool {
        self.sources.contains_key(id)
    }

    /// Number of registered sources.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Iterate over sources in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<SourceDocument>> {
        self.order.iter().filter_map(|id| self.sources.get(id))
    }

    /// Release every decoded document.
    ///
    /// Page sets referencing these sources become dangling; clear them first.
    pub fn clear(&mut self) {
        tracing::debug!(sources = self.sources.len(), "clearing source registry");
        self.sources.clear();
        self.order.clear();
    }
}
