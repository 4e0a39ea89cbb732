//! Integration tests for loading, editing and exporting through a session.

use pagestitch::config::{CompressionLevel, Config};
use pagestitch::io::{InputFile, MemoryDelivery};
use pagestitch::{Direction, Edit, FileOutcome, Session, StitchError};
use std::path::PathBuf;

use crate::common::{input, page_labels};

#[tokio::test]
async fn test_reorder_delete_and_merge() {
    let mut session = Session::default();
    let report = session
        .load(vec![input("a.pdf", "A", 3), input("b.pdf", "B", 2)])
        .await;
    assert!(report.is_success());
    assert_eq!(report.pages_added(), 5);

    // A-0 A-1 A-2 B-0 B-1 -> A-0 A-2 B-0 B-1 -> A-2 A-0 B-0 B-1
    session.apply(&Edit::Remove { index: 1 }).unwrap();
    session
        .apply(&Edit::Move {
            index: 0,
            direction: Direction::Right,
        })
        .unwrap();

    let delivery = MemoryDelivery::new();
    let export = session.export("stitched", &delivery).await.unwrap();
    assert_eq!(export.path, PathBuf::from("stitched.pdf"));
    assert_eq!(export.statistics.pages, 4);
    assert_eq!(export.statistics.sources_attached, 2);

    let delivered = delivery.take();
    assert_eq!(delivered.len(), 1);
    assert_eq!(delivered[0].0, "stitched.pdf");
    assert_eq!(page_labels(&delivered[0].1), ["A-2", "A-0", "B-0", "B-1"]);
}

#[tokio::test]
async fn test_bad_file_in_batch_is_skipped() {
    let mut session = Session::default().with_jobs(4);
    let report = session
        .load(vec![
            input("one.pdf", "one", 1),
            InputFile::from_bytes("notes.txt", b"plain text".to_vec()),
            input("two.pdf", "two", 2),
        ])
        .await;

    assert_eq!(report.loaded_count(), 2);
    assert_eq!(report.failed_count(), 1);
    let (name, error) = report.failures().next().unwrap();
    assert_eq!(name, "notes.txt");
    assert!(matches!(error, StitchError::Decode { .. }));

    let compiled = session.compile().unwrap();
    assert_eq!(page_labels(&compiled.bytes), ["one-0", "two-0", "two-1"]);
}

#[tokio::test]
async fn test_same_file_twice_shares_one_source() {
    let mut session = Session::default();
    let report = session
        .load(vec![input("a.pdf", "A", 2), input("copy.pdf", "A", 2)])
        .await;

    assert!(matches!(
        report.files[1],
        FileOutcome::Loaded { reused: true, .. }
    ));
    assert_eq!(session.registry().len(), 1);
    assert_eq!(session.page_set().len(), 4);

    let compiled = session.compile().unwrap();
    assert_eq!(compiled.statistics.sources_attached, 1);
    assert_eq!(page_labels(&compiled.bytes), ["A-0", "A-1", "A-0", "A-1"]);
}

#[tokio::test]
async fn test_moves_at_the_edges_are_no_ops() {
    let mut session = Session::default();
    session.load(vec![input("a.pdf", "A", 3)]).await;
    let before = session.page_set().clone();

    session
        .apply_all(&[
            Edit::Move {
                index: 0,
                direction: Direction::Left,
            },
            Edit::Move {
                index: 2,
                direction: Direction::Right,
            },
            Edit::Move {
                index: 9,
                direction: Direction::Left,
            },
        ])
        .unwrap();

    assert_eq!(session.page_set(), &before);
}

#[tokio::test]
async fn test_clear_then_export_fails_without_delivering() {
    let mut session = Session::default();
    session.load(vec![input("a.pdf", "A", 2)]).await;
    session.apply(&Edit::Clear).unwrap();

    let delivery = MemoryDelivery::new();
    let err = session.export("empty", &delivery).await.unwrap_err();

    assert!(matches!(err, StitchError::EmptyPageSet));
    assert!(delivery.take().is_empty());
}

#[tokio::test]
async fn test_loading_after_edits_appends() {
    let mut session = Session::default();
    session.load(vec![input("a.pdf", "A", 2)]).await;
    session.apply(&Edit::Remove { index: 0 }).unwrap();
    session.load(vec![input("b.pdf", "B", 1)]).await;

    let compiled = session.compile().unwrap();
    assert_eq!(page_labels(&compiled.bytes), ["A-1", "B-0"]);
}

#[tokio::test]
async fn test_session_from_config() {
    let config = Config {
        inputs: vec![PathBuf::from("a.pdf")],
        compression: CompressionLevel::None,
        jobs: Some(2),
        ..Default::default()
    };
    let mut session = Session::from_config(&config);
    session.load(vec![input("a.pdf", "A", 1)]).await;

    let compiled = session.compile().unwrap();
    assert!(!compiled.statistics.compressed);
    assert_eq!(page_labels(&compiled.bytes), ["A-0"]);
}
