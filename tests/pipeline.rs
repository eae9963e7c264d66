use std::fs::{self, create_dir_all};
use std::path::{Path, PathBuf};

use repo_flatten::assemble::EntryContent;
use repo_flatten::config::RenderConfig;
use repo_flatten::contract::{Classification, MockHistoryQuery, SortMode};
use repo_flatten::history::REVISION_MARKER;
use repo_flatten::pipeline::render;
use repo_flatten::RenderError;
use tempfile::tempdir;

/// Builds a small repository tree with every classification represented.
fn fixture(root: &Path) {
    create_dir_all(root.join("src/util")).unwrap();
    create_dir_all(root.join("data")).unwrap();
    create_dir_all(root.join(".git/objects")).unwrap();

    fs::write(root.join("README.md"), "# Demo\n\nHello.\n").unwrap();
    fs::write(root.join("src/main.rs"), "fn main() {\n    util::run();\n}\n").unwrap();
    fs::write(root.join("src/util/mod.rs"), "pub fn run() {}\n").unwrap();
    fs::write(root.join("data/small.csv"), "a,b\n1,2\n").unwrap();
    fs::write(root.join("data/big.csv"), "x,y\n".repeat(20_000)).unwrap();
    fs::write(root.join("logo.png"), [0x89, b'P', b'N', b'G', 0, 0]).unwrap();
    fs::write(root.join(".git/HEAD"), "ref: refs/heads/main\n").unwrap();
    fs::write(root.join(".git/objects/blob"), [0u8; 16]).unwrap();
}

fn config(sort: SortMode) -> RenderConfig {
    RenderConfig {
        sort,
        ..RenderConfig::default()
    }
}

fn bulk_log(revisions: &[(i64, &[&str])]) -> String {
    revisions
        .iter()
        .map(|(ts, paths)| format!("{REVISION_MARKER}{ts}\n\n{}\n", paths.join("\n")))
        .collect()
}

#[tokio::test]
async fn filename_mode_never_queries_history() {
    let tmp = tempdir().unwrap();
    fixture(tmp.path());

    let mut history = MockHistoryQuery::new();
    history.expect_bulk_log().times(0);
    history.expect_path_log().times(0);

    let assembly = render(&config(SortMode::Filename), tmp.path(), None, &history)
        .await
        .expect("render should succeed");

    let order: Vec<&str> = assembly.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        order,
        vec!["README.md", "data/small.csv", "logo.png", "src/main.rs", "src/util/mod.rs"]
    );
}

#[tokio::test]
async fn age_mode_orders_by_history_and_pins_readme() {
    let tmp = tempdir().unwrap();
    fixture(tmp.path());

    let mut history = MockHistoryQuery::new();
    history.expect_bulk_log().times(1).returning(|_| {
        Ok(bulk_log(&[
            (100, &["src/util/mod.rs"]),
            (200, &["logo.png", "src/main.rs"]),
            (300, &["README.md", "src/main.rs"]),
        ]))
    });
    // Only data/small.csv is missing from the bulk log; skipped files are never queried.
    history
        .expect_path_log()
        .times(1)
        .returning(|_, path| {
            assert_eq!(path, "data/small.csv");
            Ok(String::new())
        });

    let assembly = render(&config(SortMode::Age), tmp.path(), None, &history)
        .await
        .expect("render should succeed");

    let order: Vec<&str> = assembly.entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        order,
        vec!["README.md", "src/util/mod.rs", "src/main.rs", "logo.png", "data/small.csv"]
    );
}

#[tokio::test]
async fn summary_counts_add_up_to_discovered_candidates() {
    let tmp = tempdir().unwrap();
    fixture(tmp.path());
    let explicit: Vec<PathBuf> = vec![
        "README.md".into(),
        "data/big.csv".into(),
        "data/small.csv".into(),
        "logo.png".into(),
        ".git/HEAD".into(),
        "does/not/exist.txt".into(),
    ];

    let history = MockHistoryQuery::new();
    let assembly = render(
        &config(SortMode::Filename),
        tmp.path(),
        Some(explicit.as_slice()),
        &history,
    )
    .await
    .expect("render should succeed");

    let s = assembly.summary;
    assert_eq!(s.considered, 5);
    assert_eq!(s.rendered, 3);
    assert_eq!(s.text, 2);
    assert_eq!(s.binary, 1);
    assert_eq!(s.ignored, 1);
    assert_eq!(s.too_large, 1);
    assert_eq!(s.rendered + s.ignored + s.too_large, s.considered);
    assert_eq!(s.text + s.binary, s.rendered);

    let skipped: Vec<(&str, Classification)> = assembly
        .skipped
        .iter()
        .map(|f| (f.path.as_str(), f.reason))
        .collect();
    assert_eq!(
        skipped,
        vec![
            (".git/HEAD", Classification::Ignored),
            ("data/big.csv", Classification::TooLarge),
        ]
    );
}

#[tokio::test]
async fn entries_carry_line_counts_or_binary_marker() {
    let tmp = tempdir().unwrap();
    fixture(tmp.path());

    let history = MockHistoryQuery::new();
    let assembly = render(&config(SortMode::Filename), tmp.path(), None, &history)
        .await
        .unwrap();

    let main = assembly.entries.iter().find(|e| e.path == "src/main.rs").unwrap();
    assert_eq!(main.line_count(), Some(3));
    match &main.content {
        EntryContent::Text { language, .. } => assert_eq!(language.as_str(), "rust"),
        EntryContent::Binary => panic!("main.rs should be text"),
    }

    let logo = assembly.entries.iter().find(|e| e.path == "logo.png").unwrap();
    assert_eq!(logo.classification, Classification::Binary);
    assert!(logo.is_binary());
    assert_eq!(logo.line_count(), None);
}

#[tokio::test]
async fn raising_max_bytes_includes_large_data() {
    let tmp = tempdir().unwrap();
    fixture(tmp.path());

    let config = RenderConfig {
        sort: SortMode::Filename,
        max_bytes: 1_000_000,
        ..RenderConfig::default()
    };
    let history = MockHistoryQuery::new();
    let assembly = render(&config, tmp.path(), None, &history).await.unwrap();

    assert_eq!(assembly.summary.too_large, 0);
    assert!(assembly.entries.iter().any(|e| e.path == "data/big.csv"));
}

#[tokio::test]
async fn missing_root_is_fatal() {
    let tmp = tempdir().unwrap();
    let history = MockHistoryQuery::new();
    let err = render(
        &config(SortMode::Filename),
        &tmp.path().join("nope"),
        None,
        &history,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, RenderError::RepositoryNotFound(_)));
}
