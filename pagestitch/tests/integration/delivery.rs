//! Integration tests for reading inputs and delivering output to disk.

use pagestitch::Session;
use pagestitch::config::{self, OverwriteMode};
use pagestitch::io::{Delivery, FileDelivery, InputReader, write_previews};
use pagestitch::{Edit, StitchError};
use std::path::PathBuf;
use tempfile::TempDir;

use crate::common::{input, page_labels, pdf_bytes};

#[tokio::test]
async fn test_read_load_and_write() {
    let dir = TempDir::new().unwrap();
    let paths: Vec<PathBuf> = ["x", "y"]
        .iter()
        .map(|label| {
            let path = dir.path().join(format!("{label}.pdf"));
            std::fs::write(&path, pdf_bytes(label, 2)).unwrap();
            path
        })
        .collect();

    let (results, stats) = InputReader::new().read_all(&paths, 2).await;
    assert_eq!(stats.success_count, 2);
    let files = results.into_iter().collect::<Result<Vec<_>, _>>().unwrap();

    let mut session = Session::default();
    session.load(files).await;
    session.apply(&Edit::Remove { index: 0 }).unwrap();

    let delivery = FileDelivery::new(dir.path(), OverwriteMode::NoClobber);
    let export = session.export("out", &delivery).await.unwrap();

    assert_eq!(export.path, dir.path().join("out.pdf"));
    let written = std::fs::read(&export.path).unwrap();
    assert_eq!(page_labels(&written), ["x-1", "y-0", "y-1"]);
    let leftovers = std::fs::read_dir(dir.path())
        .unwrap()
        .filter(|entry| {
            let name = entry.as_ref().unwrap().file_name();
            name.to_string_lossy().ends_with(".tmp")
        })
        .count();
    assert_eq!(leftovers, 0);
}

#[tokio::test]
async fn test_no_clobber_keeps_existing_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("merged.pdf");
    std::fs::write(&target, b"keep me").unwrap();

    let delivery = FileDelivery::new(dir.path(), OverwriteMode::NoClobber);
    let err = delivery
        .offer(pdf_bytes("new", 1), config::DEFAULT_OUTPUT_NAME)
        .await
        .unwrap_err();

    assert!(matches!(err, StitchError::OutputExists { .. }));
    assert_eq!(std::fs::read(&target).unwrap(), b"keep me");
}

#[tokio::test]
async fn test_force_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let target = dir.path().join("merged.pdf");
    std::fs::write(&target, b"old").unwrap();

    let delivery = FileDelivery::new(dir.path(), OverwriteMode::Force);
    let path = delivery
        .offer(pdf_bytes("new", 1), "merged.pdf")
        .await
        .unwrap();

    assert_eq!(path, target);
    assert_eq!(page_labels(&std::fs::read(&target).unwrap()), ["new-0"]);
}

#[tokio::test]
async fn test_missing_output_directory() {
    let dir = TempDir::new().unwrap();
    let delivery = FileDelivery::new(dir.path().join("nope"), OverwriteMode::Force);

    let err = delivery.offer(pdf_bytes("a", 1), "a").await.unwrap_err();
    assert!(matches!(err, StitchError::InvalidConfig { .. }));
}

#[tokio::test]
async fn test_previews_follow_output_order() {
    let dir = TempDir::new().unwrap();
    let mut session = Session::default();
    session
        .load(vec![input("a.pdf", "A", 2), input("b.pdf", "B", 1)])
        .await;
    session.apply(&Edit::Remove { index: 1 }).unwrap();

    let written = write_previews(session.page_set(), &dir.path().join("thumbs"))
        .await
        .unwrap();

    let names: Vec<_> = written
        .iter()
        .map(|path| path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["page-001.jpg", "page-002.jpg"]);
    assert_eq!(
        std::fs::read(&written[1]).unwrap(),
        session.page_set().entries()[1].preview().bytes()
    );
}

#[tokio::test]
async fn test_edit_script_drives_session() {
    let dir = TempDir::new().unwrap();
    let script = dir.path().join("edits.json");
    std::fs::write(
        &script,
        r#"[
            {"op": "move", "index": 2, "direction": "left"},
            {"op": "remove", "index": 0}
        ]"#,
    )
    .unwrap();

    let edits = config::read_edit_script(&script).unwrap();
    let mut session = Session::default();
    session.load(vec![input("a.pdf", "A", 3)]).await;
    session.apply_all(&edits).unwrap();

    let compiled = session.compile().unwrap();
    assert_eq!(page_labels(&compiled.bytes), ["A-2", "A-1"]);
}
