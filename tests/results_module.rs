mod support;

use loadrun::orchestration::StartIntent;
use loadrun::results::{archive_file_name, build_archive, ResultsError, ResultsStore};
use std::fs;
use std::io::{Cursor, Read};
use support::harness;
use zip::ZipArchive;

#[test]
fn engine_archives_the_files_a_worker_left_behind() {
    let h = harness(false);
    let started = h
        .engine
        .start_run(&StartIntent::new("shop", "stress"))
        .expect("start");
    let results_dir = h
        .engine
        .paths()
        .results_root()
        .join("shop/stress")
        .join(&started.run_id);
    fs::write(results_dir.join("a.txt"), b"alpha").expect("a");
    fs::write(results_dir.join("b.csv"), b"Type,Name\nGET,/\n").expect("b");

    let (file_name, bytes) = h.engine.archive(&started.run_id).expect("archive");
    assert_eq!(file_name, format!("{}_results.zip", started.run_id));

    let mut archive = ZipArchive::new(Cursor::new(bytes)).expect("zip");
    assert_eq!(archive.len(), 2);
    for (name, expected) in [("a.txt", &b"alpha"[..]), ("b.csv", &b"Type,Name\nGET,/\n"[..])] {
        let mut entry = archive.by_name(name).expect("entry");
        assert!(!entry.is_dir());
        let mut body = Vec::new();
        entry.read_to_end(&mut body).expect("read");
        assert_eq!(body, expected);
    }

    assert_eq!(
        h.engine.list_completed().expect("completed"),
        vec![started.run_id.clone()]
    );
}

#[test]
fn unknown_runs_have_no_archive_or_report() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = ResultsStore::new(dir.path());
    assert!(matches!(
        build_archive(&store, "shop__stress-20260101120000"),
        Err(ResultsError::NotFound { .. })
    ));
    let err = store.read_report("nonsense").expect_err("invalid id");
    assert_eq!(err.kind(), "validation");
    assert_eq!(archive_file_name("x__y-1"), "x__y-1_results.zip");
}
