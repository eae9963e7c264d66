use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::{self, create_dir_all};
use tempfile::{tempdir, TempDir};

/// Creates a tiny working tree for the CLI to render.
fn create_repo() -> TempDir {
    let dir = tempdir().expect("Creating temp repo failed");
    create_dir_all(dir.path().join("src")).unwrap();
    fs::write(dir.path().join("README.md"), "# Tiny <repo>\n").unwrap();
    fs::write(dir.path().join("src/lib.rs"), "pub fn answer() -> u32 { 42 }\n").unwrap();
    fs::write(dir.path().join("icon.ico"), [0u8, 1, 2, 3]).unwrap();
    dir
}

fn repo_flatten() -> Command {
    let mut cmd = Command::cargo_bin("repo-flatten").expect("Binary exists");
    cmd.env_remove("REPO_FLATTEN_MAX_BYTES")
        .env_remove("REPO_FLATTEN_SORT")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn render_html_to_file_reports_summary() {
    let repo = create_repo();
    let out_dir = tempdir().unwrap();
    let out = out_dir.path().join("repo.html");

    repo_flatten()
        .arg("render")
        .arg(repo.path())
        .args(["--sort", "filename", "--out"])
        .arg(&out)
        .assert()
        .success()
        .stderr(predicate::str::contains("\"rendered\": 3"));

    let html = fs::read_to_string(&out).expect("document written");
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("# Tiny &lt;repo&gt;"));
    assert!(html.contains("pub fn answer()"));
    assert!(html.contains("Binary file (4 bytes) not shown."));
    let readme = html.find("id=\"file-readme-md\"").unwrap();
    let lib = html.find("id=\"file-src-lib-rs\"").unwrap();
    assert!(readme < lib);
}

#[test]
fn render_cxml_to_stdout() {
    let repo = create_repo();

    repo_flatten()
        .arg("render")
        .arg(repo.path())
        .args(["--sort", "filename", "--format", "cxml"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("<documents>"))
        .stdout(predicate::str::contains("<source>src/lib.rs</source>"))
        .stdout(predicate::str::contains("icon.ico").not());
}

#[test]
fn explicit_paths_limit_the_document() {
    let repo = create_repo();

    repo_flatten()
        .arg("render")
        .arg(repo.path())
        .args(["--sort", "filename", "--format", "cxml", "--path", "src/lib.rs"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<source>src/lib.rs</source>"))
        .stdout(predicate::str::contains("README.md").not());
}

#[test]
fn missing_source_fails() {
    let dir = tempdir().unwrap();

    repo_flatten()
        .arg("render")
        .arg(dir.path().join("absent"))
        .assert()
        .failure();
}

#[test]
fn invalid_sort_value_is_rejected() {
    let repo = create_repo();

    repo_flatten()
        .arg("render")
        .arg(repo.path())
        .args(["--sort", "random"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("random"));
}
