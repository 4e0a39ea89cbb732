//! Integration tests for compiling page sets straight from a registry.

use lopdf::Document;
use pagestitch::config::{CompressionLevel, Metadata};
use pagestitch::merge::{CompileOptions, MetadataManager};
use pagestitch::{MergeCompiler, PageSet, PreviewPipeline, SourceRegistry, StitchError};
use std::sync::Arc;

use crate::common::{page_labels, pdf_bytes};

/// Registry holding `A` (3 pages) and `B` (2 pages), plus a page set of
/// `(label, page)` picks.
fn fixture(picks: &[(&str, usize)]) -> (SourceRegistry, PageSet) {
    let mut registry = SourceRegistry::new();
    let a = registry.register("a.pdf", &pdf_bytes("A", 3)).unwrap();
    let b = registry.register("b.pdf", &pdf_bytes("B", 2)).unwrap();

    let pipeline = PreviewPipeline::default();
    let a_previews = pipeline.render_previews(&a).unwrap();
    let b_previews = pipeline.render_previews(&b).unwrap();

    let page_set = picks.iter().fold(PageSet::new(), |set, &(label, page)| {
        let (source, previews) = if label == "A" {
            (&a, &a_previews)
        } else {
            (&b, &b_previews)
        };
        set.append(source, page, Arc::new(previews[page].clone()))
            .unwrap()
    });

    (registry, page_set)
}

#[test]
fn test_output_follows_page_set_order() {
    let (registry, page_set) = fixture(&[("B", 1), ("A", 0), ("B", 0), ("A", 2)]);

    let compiled = MergeCompiler::default().compile(&page_set, &registry).unwrap();
    assert_eq!(page_labels(&compiled.bytes), ["B-1", "A-0", "B-0", "A-2"]);
}

#[test]
fn test_repeated_page_is_copied_each_time() {
    let (registry, page_set) = fixture(&[("A", 1), ("A", 1), ("A", 1)]);

    let compiled = MergeCompiler::default().compile(&page_set, &registry).unwrap();
    let doc = Document::load_mem(&compiled.bytes).unwrap();

    let pages: Vec<_> = doc.get_pages().into_values().collect();
    assert_eq!(pages.len(), 3);
    assert_ne!(pages[0], pages[1]);
    assert_ne!(pages[1], pages[2]);
    assert_eq!(page_labels(&compiled.bytes), ["A-1", "A-1", "A-1"]);
}

#[test]
fn test_same_page_set_gives_same_pages() {
    let (registry, page_set) = fixture(&[("A", 2), ("B", 0), ("A", 0)]);
    let compiler = MergeCompiler::default();

    let first = compiler.compile(&page_set, &registry).unwrap();
    let second = compiler.compile(&page_set, &registry).unwrap();

    assert_eq!(page_labels(&first.bytes), page_labels(&second.bytes));
    assert_eq!(first.statistics.pages, second.statistics.pages);
}

#[test]
fn test_sources_are_not_modified_by_compile() {
    let (registry, page_set) = fixture(&[("A", 0), ("A", 1)]);
    let before: Vec<_> = registry
        .iter()
        .map(|source| source.document().objects.len())
        .collect();

    MergeCompiler::default().compile(&page_set, &registry).unwrap();

    let after: Vec<_> = registry
        .iter()
        .map(|source| source.document().objects.len())
        .collect();
    assert_eq!(before, after);
}

#[test]
fn test_released_source_is_reported() {
    let (mut registry, page_set) = fixture(&[("A", 0)]);
    registry.clear();

    let err = MergeCompiler::default()
        .compile(&page_set, &registry)
        .unwrap_err();
    assert!(matches!(err, StitchError::MissingSource { .. }));
}

#[test]
fn test_empty_page_set_is_rejected() {
    let (registry, _) = fixture(&[]);

    let err = MergeCompiler::default()
        .compile(&PageSet::new(), &registry)
        .unwrap_err();
    assert!(matches!(err, StitchError::EmptyPageSet));
}

#[test]
fn test_compression_levels_keep_pages() {
    let (registry, page_set) = fixture(&[("B", 1), ("A", 1)]);

    for compression in [
        CompressionLevel::None,
        CompressionLevel::Standard,
        CompressionLevel::Maximum,
    ] {
        let compiler = MergeCompiler::new(CompileOptions {
            compression,
            ..Default::default()
        });
        let compiled = compiler.compile(&page_set, &registry).unwrap();

        assert_eq!(page_labels(&compiled.bytes), ["B-1", "A-1"], "{compression:?}");
        assert_eq!(
            compiled.statistics.compressed,
            compression != CompressionLevel::None
        );
    }
}

#[test]
fn test_metadata_is_written() {
    let (registry, page_set) = fixture(&[("A", 0)]);
    let metadata = Metadata::new(
        Some("Stitched".to_string()),
        Some("Tester".to_string()),
        None,
        Some("pdf, merge".to_string()),
    );
    let compiler = MergeCompiler::new(CompileOptions {
        metadata: metadata.clone(),
        ..Default::default()
    });

    let compiled = compiler.compile(&page_set, &registry).unwrap();
    let doc = Document::load_mem(&compiled.bytes).unwrap();

    assert_eq!(MetadataManager::new().get_metadata(&doc), metadata);
}

#[test]
fn test_convenience_compile() {
    let (registry, page_set) = fixture(&[("A", 2), ("A", 1)]);

    let bytes = pagestitch::merge::compile(&page_set, &registry).unwrap();
    assert_eq!(page_labels(&bytes), ["A-2", "A-1"]);
}
