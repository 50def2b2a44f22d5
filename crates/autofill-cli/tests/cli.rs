use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const LETTER: &str = "Signed: Jane Doe\nReach me at jane@example.com or 555-123-4567.\n";

const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><title>Claim</title></head>
<body>
  <form id="claim">
    <label for="full">Full Name</label>
    <input type="text" id="full">
    <input type="text" placeholder="Your email" name="contact">
    <input type="text" name="phone1">
  </form>
</body>
</html>"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: TempDir::new().unwrap(),
        };
        ws.write("config.json", "{}");
        ws.write("letter.txt", LETTER);
        ws.write("page.html", PAGE);
        ws
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write(&self, name: &str, content: &str) {
        fs::write(self.path(name), content).unwrap();
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("autofill").unwrap();
        cmd.current_dir(self.dir.path())
            .arg("--config")
            .arg(self.path("config.json"));
        cmd
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

#[test]
fn extract_prints_form_data_as_json() {
    let ws = Workspace::new();
    let output = ws.cmd().args(["extract", "letter.txt"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json[0]["success"], true);
    assert_eq!(json[0]["fileName"], "letter.txt");
    assert_eq!(json[0]["formData"]["email"], "jane@example.com");
    assert_eq!(json[0]["formData"]["name"], "Jane Doe");
    assert!(json[0].get("extractedText").is_none());
}

#[test]
fn extract_all_lists_offsets() {
    let ws = Workspace::new();
    ws.write("two.md", "a@b.com and c@d.com");

    ws.cmd()
        .args(["extract", "two.md", "--all", "--format", "csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("two.md,email,a@b.com,0,7"))
        .stdout(predicate::str::contains("two.md,email,c@d.com,12,19"));
}

#[test]
fn extract_rejects_unsupported_kind() {
    let ws = Workspace::new();
    ws.write("tool.exe", "jane@example.com");

    ws.cmd()
        .args(["extract", "tool.exe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unsupported file type: exe"));
}

#[test]
fn extract_expands_globs() {
    let ws = Workspace::new();
    ws.write("second.txt", "mail second@example.com");

    ws.cmd()
        .args(["extract", "*.txt", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("second@example.com"))
        .stdout(predicate::str::contains("jane@example.com"));
}

#[test]
fn extract_continues_past_unreadable_file() {
    let ws = Workspace::new();
    fs::create_dir(ws.path("folder.txt")).unwrap();

    ws.cmd()
        .args(["extract", "folder.txt", "letter.txt", "--format", "text"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jane@example.com"))
        .stderr(predicate::str::contains("Error processing folder.txt"));
}

#[test]
fn extract_remote_uses_configured_server() {
    let ws = Workspace::new();
    // Nothing listens on the discard port, so the upload fails.
    ws.write(
        "config.json",
        r#"{"decode": {"serverUrl": "http://127.0.0.1:9/process"}}"#,
    );

    ws.cmd()
        .args(["extract", "letter.txt", "--remote"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error processing letter.txt"))
        .stderr(predicate::str::contains("No file could be processed"));

    ws.cmd().args(["extract", "letter.txt"]).assert().success();
}

#[test]
fn fields_lists_classified_controls() {
    let ws = Workspace::new();

    ws.cmd()
        .args(["fields", "page.html"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 3 form fields"))
        .stdout(predicate::str::contains("Full Name"));
}

#[test]
fn fill_writes_filled_page_and_report() {
    let ws = Workspace::new();

    ws.cmd()
        .args([
            "fill",
            "--page",
            "page.html",
            "letter.txt",
            "-o",
            "filled.html",
            "--report",
            "report.json",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("3 fields updated"));

    let filled = read(&ws.path("filled.html"));
    assert!(filled.contains(r#"value="Jane Doe""#));
    assert!(filled.contains(r#"value="jane@example.com""#));
    assert!(filled.contains(r#"value="555-123-4567""#));
    assert!(filled.contains("<title>Claim</title>"));

    let report: serde_json::Value = serde_json::from_str(&read(&ws.path("report.json"))).unwrap();
    assert_eq!(report[0]["fill"]["fieldsChanged"], 3);
}

#[test]
fn fill_continues_past_unreadable_file() {
    let ws = Workspace::new();
    fs::create_dir(ws.path("folder.txt")).unwrap();

    ws.cmd()
        .args(["fill", "--page", "page.html", "folder.txt", "letter.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#"value="jane@example.com""#))
        .stderr(predicate::str::contains("Error processing folder.txt"));
}

#[test]
fn fill_respects_disabled_setting() {
    let ws = Workspace::new();
    ws.write("config.json", r#"{"settings": {"enabled": false}}"#);

    ws.cmd()
        .args(["fill", "--page", "page.html", "letter.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("jane@example.com").not());
}

#[test]
fn config_set_and_get_roundtrip() {
    let ws = Workspace::new();
    fs::remove_file(ws.path("config.json")).unwrap();

    ws.cmd().args(["config", "init"]).assert().success();
    assert!(ws.path("config.json").exists());

    ws.cmd()
        .args(["config", "set", "settings.autoDetect", "false"])
        .assert()
        .success();

    ws.cmd()
        .args(["config", "get", "settings.autoDetect"])
        .assert()
        .success()
        .stdout(predicate::str::diff("false\n"));

    ws.cmd()
        .args(["config", "set", "settings.nope", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}
