//! Integration tests for the CLI: apply, check, and validate against a
//! temporary rules directory.

use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

const STYLE_DOC: &str =
    "---\ndescription: Python style guide\nglobs: \"*.py\"\n---\n\n## Code Style\n- Use black for formatting\n";

/// Lay out a rules directory and a batch file appending one bullet.
fn setup_workspace() -> (TempDir, String, String) {
    let dir = TempDir::new().unwrap();
    let rules_dir = dir.path().join("rules");
    fs::create_dir_all(&rules_dir).unwrap();

    let doc_path = rules_dir.join("python-style.mdc");
    fs::write(&doc_path, STYLE_DOC).unwrap();

    let batch = serde_json::json!({
        "operations": [
            {
                "kind": "addition",
                "target_path": doc_path.to_str().unwrap(),
                "content": "- Line length is 100 characters\n",
                "anchor": "- Use black for formatting"
            }
        ]
    });
    let batch_path = dir.path().join("batch.json");
    fs::write(&batch_path, serde_json::to_string_pretty(&batch).unwrap()).unwrap();

    let rules = rules_dir.to_str().unwrap().to_string();
    let batch = batch_path.to_str().unwrap().to_string();
    (dir, rules, batch)
}

fn run(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_mdc-merge"))
        .args(args)
        .output()
        .unwrap()
}

#[test]
fn apply_writes_merged_document() {
    let (dir, rules_dir, batch) = setup_workspace();
    let output = run(&["apply", "--rules-dir", &rules_dir, "--batch", &batch]);
    assert!(output.status.success());

    let written =
        fs::read_to_string(Path::new(&rules_dir).join("python-style.mdc")).unwrap();
    assert!(written.contains("- Use black for formatting\n- Line length is 100 characters\n"));
    drop(dir);
}

#[test]
fn dry_run_leaves_files_untouched() {
    let (dir, rules_dir, batch) = setup_workspace();
    let output = run(&["apply", "--rules-dir", &rules_dir, "--batch", &batch, "--dry-run"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("applied"));
    assert!(stdout.contains("dry run"));

    let on_disk =
        fs::read_to_string(Path::new(&rules_dir).join("python-style.mdc")).unwrap();
    assert_eq!(on_disk, STYLE_DOC);
    drop(dir);
}

#[test]
fn check_reports_diff_without_writing() {
    let (dir, rules_dir, batch) = setup_workspace();
    let output = run(&["check", "--rules-dir", &rules_dir, "--batch", &batch]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("+- Line length is 100 characters"));

    let on_disk =
        fs::read_to_string(Path::new(&rules_dir).join("python-style.mdc")).unwrap();
    assert_eq!(on_disk, STYLE_DOC);
    drop(dir);
}

#[test]
fn apply_creates_new_document_with_parents() {
    let dir = TempDir::new().unwrap();
    let rules_dir = dir.path().join("rules");
    let target = rules_dir.join("testing.mdc");

    let batch = serde_json::json!({
        "operations": [
            {
                "kind": "create_file",
                "target_path": target.to_str().unwrap(),
                "content": "# Testing Standards\n",
                "file_description": "Testing conventions",
                "file_globs": ["tests/**"]
            }
        ]
    });
    let batch_path = dir.path().join("batch.json");
    fs::write(&batch_path, serde_json::to_string(&batch).unwrap()).unwrap();

    let output = run(&[
        "apply",
        "--rules-dir",
        rules_dir.to_str().unwrap(),
        "--batch",
        batch_path.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let written = fs::read_to_string(&target).unwrap();
    assert!(written.starts_with("---\ndescription: Testing conventions\nglobs: \"tests/**\"\n---\n"));
    assert!(written.ends_with("# Testing Standards\n"));
}

#[test]
fn validate_rejects_malformed_batch() {
    let dir = TempDir::new().unwrap();
    let batch_path = dir.path().join("batch.json");
    fs::write(&batch_path, r#"{"operations": []}"#).unwrap();

    let output = run(&["validate", batch_path.to_str().unwrap()]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("batch contains no operations"));
}

#[test]
fn validate_accepts_well_formed_batch() {
    let (_dir, _rules_dir, batch) = setup_workspace();
    let output = run(&["validate", &batch]);
    assert!(output.status.success());
}
