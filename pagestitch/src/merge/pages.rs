//! Page copying into the output document.
//!
//! This module handles the page-level work of a compile:
//! - Attaching each source document once, renumbered into the output's id space
//! - Materializing inherited page attributes
//! - Importing the objects a page references, without following links into
//!   other pages
//! - Dropping links to pages that did not make it into the output
//! - Building the flat output page tree

use lopdf::{Dictionary, Document, Object, ObjectId, dictionary};
use std::collections::{HashMap, HashSet};

use crate::error::{Result, StitchError};
use crate::source::{SourceDocument, SourceId};
use crate::utils::{self, INHERITABLE_ATTRIBUTES};

/// Output PDF version used when no source asks for a newer one.
const MIN_OUTPUT_VERSION: &str = "1.5";

/// A source document renumbered into the output's object-id space.
struct Attached {
    document: Document,
    page_ids: Vec<ObjectId>,
    /// Every `/Page` and `/Pages` node of the source tree.
    tree_ids: HashSet<ObjectId>,
}

/// Builds the output document one page at a time.
pub struct OutputBuilder {
    document: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    attached: HashMap<SourceId, Attached>,
}

impl OutputBuilder {
    /// Create an empty output document.
    pub fn new() -> Self {
        let mut document = Document::with_version(MIN_OUTPUT_VERSION);
        let pages_id = document.new_object_id();

        Self {
            document,
            pages_id,
            kids: Vec::new(),
            attached: HashMap::new(),
        }
    }

    /// Number of distinct sources attached so far.
    pub fn sources_attached(&self) -> usize {
        self.attached.len()
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Copy page `page_index` of `source` and append it to the output.
    ///
    /// # Errors
    ///
    /// Returns [`StitchError::Copy`] if the page does not exist in the source
    /// or its dictionary cannot be read.
    pub fn push_page(&mut self, source: &SourceDocument, page_index: usize) -> Result<ObjectId> {
        self.attach(source);

        let Self {
            document: output,
            pages_id,
            kids,
            attached,
        } = self;

        let copy_error = |reason: String| StitchError::copy(source.id().clone(), page_index, reason);

        let attached = attached
            .get(source.id())
            .ok_or_else(|| copy_error("source is not attached".to_string()))?;

        let source_page_id = *attached.page_ids.get(page_index).ok_or_else(|| {
            copy_error(format!(
                "page index out of range (source has {} pages)",
                attached.page_ids.len()
            ))
        })?;

        let source_page = attached
            .document
            .get_dictionary(source_page_id)
            .map_err(|e| copy_error(e.to_string()))?;

        let page = materialize_page(&attached.document, source_page, *pages_id);

        // a page used twice gets a fresh object sharing content and resources
        let page_id = if output.objects.contains_key(&source_page_id) {
            output.new_object_id()
        } else {
            source_page_id
        };

        // /Parent already points at the output tree
        let imported: usize = page
            .iter()
            .filter(|(key, _)| key.as_slice() != b"Parent")
            .map(|(_, value)| {
                utils::copy_references(output, &attached.document, value, &attached.tree_ids)
            })
            .sum();
        output.objects.insert(page_id, Object::Dictionary(page));
        kids.push(Object::Reference(page_id));

        tracing::debug!(
            source = %source.id(),
            page = page_index + 1,
            output_page = kids.len(),
            imported,
            "copied page"
        );

        Ok(page_id)
    }

    /// Attach `source` unless it already is.
    fn attach(&mut self, source: &SourceDocument) {
        if self.attached.contains_key(source.id()) {
            return;
        }

        let mut document = source.document().clone();
        document.renumber_objects_with(self.document.max_id + 1);
        self.document.max_id = self.document.max_id.max(document.max_id);

        if document.version > self.document.version {
            self.document.version = document.version.clone();
        }

        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();
        let tree_ids = document
            .objects
            .iter()
            .filter(|(_, object)| utils::is_page_tree_node(object))
            .map(|(id, _)| *id)
            .chain(page_ids.iter().copied())
            .collect();

        tracing::debug!(source = %source.id(), name = source.name(), "attached source");

        self.attached.insert(
            source.id().clone(),
            Attached {
                document,
                page_ids,
                tree_ids,
            },
        );
    }

    /// Finish the page tree and catalog, returning the output document.
    ///
    /// Links to source pages that were never pushed (annotation `/P`,
    /// destinations) are removed so no reference dangles.
    pub fn finish(self) -> Document {
        let Self {
            mut document,
            pages_id,
            kids,
            attached,
        } = self;

        let dangling: HashSet<ObjectId> = attached
            .values()
            .flat_map(|source| source.tree_ids.iter().copied())
            .filter(|id| !document.objects.contains_key(id))
            .collect();
        if !dangling.is_empty() {
            let dropped: usize = document
                .objects
                .values_mut()
                .map(|object| utils::drop_references(object, &dangling))
                .sum();
            tracing::debug!(dropped, "dropped links to pages outside the output");
        }

        let count = kids.len() as i64;
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        document.trailer.set("Root", catalog_id);

        document
    }
}

impl Default for OutputBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Clone a page dictionary, pulling inherited attributes onto the page and
/// pointing it at the output page tree.
fn materialize_page(source: &Document, page: &Dictionary, parent: ObjectId) -> Dictionary {
    let mut materialized = page.clone();

    for key in INHERITABLE_ATTRIBUTES {
        if materialized.has(key) {
            continue;
        }
        if let Some(value) = utils::inherited_attribute(source, page, key) {
            materialized.set(key, value.clone());
        }
    }

    materialized.set("Parent", Object::Reference(parent));
    materialized
}
