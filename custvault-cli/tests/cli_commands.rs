use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

fn custvault_cmd(home: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("custvault"));
    cmd.env("HOME", home)
        .env("USERPROFILE", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

/// Temp home plus a vault root with an initialized config at `<home>/vault.yaml`.
struct Fixture {
    home: TempDir,
    vault: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let fixture = Self {
            home: TempDir::new().expect("home"),
            vault: TempDir::new().expect("vault"),
        };
        fixture
            .cmd()
            .arg("init")
            .arg(fixture.vault.path())
            .args(["--entities", "2,10", "--categories", "FP,RAISED"])
            .assert()
            .success()
            .stdout(contains("2 customers, 2 sections"));
        fixture
    }

    fn config_path(&self) -> PathBuf {
        self.home.path().join("vault.yaml")
    }

    fn cmd(&self) -> Command {
        let mut cmd = custvault_cmd(self.home.path());
        cmd.arg("--config").arg(self.config_path());
        cmd
    }

    fn json(&self, args: &[&str]) -> serde_json::Value {
        let output = self.cmd().args(args).output().expect("run");
        serde_json::from_slice(&output.stdout).expect("parse json")
    }
}

#[test]
fn init_writes_config_file() {
    let fixture = Fixture::new();
    let yaml = fs::read_to_string(fixture.config_path()).expect("read config");
    assert!(yaml.contains("root_path"));
    assert!(yaml.contains("FP"));
}

#[test]
fn init_without_config_flag_uses_home() {
    let home = TempDir::new().expect("home");
    let vault = TempDir::new().expect("vault");
    custvault_cmd(home.path())
        .arg("init")
        .arg(vault.path())
        .assert()
        .success();
    assert!(home.path().join(".custvault").join("config.yaml").exists());
}

#[test]
fn diff_on_empty_root_reports_twelve_added_and_exits_one() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("diff")
        .assert()
        .code(1)
        .stdout(contains("12 added, 0 modified, 0 removed, 0 unchanged"))
        .stdout(contains("CUST-010"));
}

#[test]
fn diff_json_matches_counts() {
    let fixture = Fixture::new();
    let payload = fixture.json(&["diff", "--json"]);
    assert_eq!(payload["counts"]["added"], 12);
    let entries = payload["entries"].as_array().expect("entries");
    assert_eq!(entries.len(), 12);
    assert_eq!(entries[0]["classification"], "added");
    assert_eq!(entries[0]["reason"], "directory missing");
}

#[test]
fn destructive_diff_lists_orphans_as_removed() {
    let fixture = Fixture::new();
    fs::create_dir(fixture.vault.path().join("CUST-099")).expect("mkdir");

    let report = fixture.json(&["diff", "--json"]);
    assert_eq!(report["counts"]["removed"], 0);
    assert_eq!(report["orphans"][0]["id"], 99);

    let destructive = fixture.json(&["diff", "--json", "--destructive"]);
    assert_eq!(destructive["counts"]["removed"], 1);
}

#[test]
fn apply_then_status_is_complete() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .args(["apply", "--dry-run"])
        .assert()
        .success()
        .stdout(contains("[dry-run]"));
    assert!(!fixture.vault.path().join("CUST-002").exists());

    fixture.cmd().arg("apply").assert().success();
    assert!(fixture
        .vault
        .path()
        .join("CUST-002")
        .join("RAISED")
        .join("RAISED-Index.md")
        .exists());

    let status = fixture.json(&["status", "--json"]);
    assert_eq!(status["summary"]["customers"], 2);
    assert_eq!(status["summary"]["complete"], 2);
    assert_eq!(status["customers"][0]["state"], "complete");

    let diff = fixture.json(&["diff", "--json"]);
    assert_eq!(diff["counts"]["added"], 0);
    assert_eq!(diff["counts"]["modified"], 6);
}

#[test]
fn stray_file_at_customer_path_is_reported() {
    let fixture = Fixture::new();
    fs::write(fixture.vault.path().join("CUST-002"), "not a folder").expect("write");

    let diff = fixture.json(&["diff", "--json"]);
    assert_eq!(diff["entries"][0]["classification"], "modified");
    assert_eq!(
        diff["entries"][0]["reason"],
        "file where a directory is expected"
    );

    let status = fixture.json(&["status", "--json"]);
    assert_eq!(status["customers"][0]["state"], "missing");

    fixture
        .cmd()
        .arg("apply")
        .assert()
        .failure()
        .stderr(contains("is not a directory"));
}

#[test]
fn status_table_shows_customers() {
    let fixture = Fixture::new();
    fixture
        .cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(contains("CUST-002"))
        .stdout(contains("MISSING"));
}

#[test]
fn missing_root_fails() {
    let fixture = Fixture::new();
    let yaml = fs::read_to_string(fixture.config_path()).expect("read");
    let moved = fixture.vault.path().join("gone");
    let yaml = yaml.replace(
        &fixture.vault.path().canonicalize().expect("canon").display().to_string(),
        &moved.display().to_string(),
    );
    fs::write(fixture.config_path(), yaml).expect("write");

    fixture
        .cmd()
        .arg("diff")
        .assert()
        .failure()
        .stderr(contains("does not exist"));
}

#[test]
fn missing_config_points_at_init() {
    let home = TempDir::new().expect("home");
    custvault_cmd(home.path())
        .arg("status")
        .assert()
        .failure()
        .stderr(contains("custvault init"));
}

#[test]
fn preview_expands_for_requested_entity() {
    let fixture = Fixture::new();
    let template = fixture.home.path().join("t.md");
    fs::write(&template, "# {{CUST_CODE}}{{IF:CATEGORY}} / {{CATEGORY}}{{ENDIF:CATEGORY}}")
        .expect("write");

    fixture
        .cmd()
        .arg("preview")
        .arg(&template)
        .assert()
        .success()
        .stdout("# CUST-002\n");

    fixture
        .cmd()
        .arg("preview")
        .arg(&template)
        .args(["--entity", "7", "--category", "FP"])
        .assert()
        .success()
        .stdout("# CUST-007 / FP\n");
}

#[test]
fn preview_without_config_defaults_to_entity_one() {
    let home = TempDir::new().expect("home");
    let template = home.path().join("t.md");
    fs::write(&template, "{{CUST_CODE}}").expect("write");
    custvault_cmd(home.path())
        .arg("preview")
        .arg(&template)
        .assert()
        .success()
        .stdout("CUST-001\n");
}

#[test]
fn validate_exit_code_follows_issues() {
    let home = TempDir::new().expect("home");
    let good = home.path().join("good.md");
    let bad = home.path().join("bad.md");
    fs::write(&good, "# {{CUST_CODE}}").expect("write");
    fs::write(&bad, "{{IF:A}}x{{ENDIF:B}}").expect("write");

    custvault_cmd(home.path())
        .arg("validate")
        .arg(&good)
        .assert()
        .success();

    custvault_cmd(home.path())
        .arg("validate")
        .arg(&good)
        .arg(&bad)
        .assert()
        .code(1)
        .stdout(contains("closed as 'B'"));
}

#[test]
fn vars_lists_builtins_and_custom() {
    let fixture = Fixture::new();
    let yaml = fs::read_to_string(fixture.config_path()).expect("read");
    fs::write(
        fixture.config_path(),
        format!("{yaml}variables:\n  REGION: EMEA\n"),
    )
    .expect("write");

    fixture
        .cmd()
        .arg("vars")
        .assert()
        .success()
        .stdout(contains("CUST_CODE"))
        .stdout(contains("REGION"));

    let rows = fixture.json(&["vars", "--json"]);
    let names: Vec<&str> = rows
        .as_array()
        .expect("rows")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"UUID"));
    assert_eq!(names.last(), Some(&"REGION"));
}
