//! End-to-end tests for `apply` and `list` over a temp base directory.

#![allow(clippy::expect_used)]

use std::io::Write as _;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::prelude::*;
use sha1::{Digest, Sha1};
use tempfile::TempDir;

struct Node {
    root: TempDir,
}

impl Node {
    fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let config = format!(
            "base_dir: {}\nreload_command: []\nlog_level: warn\n",
            root.path().join("vcap").display()
        );
        std::fs::write(root.path().join("config.yaml"), config).expect("write config");
        Self { root }
    }

    fn base(&self) -> PathBuf {
        self.root.path().join("vcap")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("job-agent"));
        cmd.env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .arg("--config")
            .arg(self.root.path().join("config.yaml"));
        cmd
    }

    /// Store a gzipped tarball in the blobstore and return its sha1.
    fn put_blob(&self, id: &str, files: &[(&str, &[u8], u32)]) -> String {
        let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (path, content, mode) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder
                .append_data(&mut header, path, *content)
                .expect("append");
        }
        let bytes = builder
            .into_inner()
            .expect("tar")
            .finish()
            .expect("gzip");

        let blobs = self.base().join("data/blobs");
        std::fs::create_dir_all(&blobs).expect("mkdir");
        std::fs::File::create(blobs.join(id))
            .expect("create")
            .write_all(&bytes)
            .expect("write blob");

        let digest = Sha1::digest(&bytes);
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    fn write_manifest(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        std::fs::write(&path, content).expect("write manifest");
        path
    }
}

fn web_manifest(sha1: &str) -> String {
    format!(
        "index: 0\njobs:\n  - name: web\n    version: v1\n    source:\n      blobstore_id: web-blob\n      sha1: {sha1}\n"
    )
}

fn web_payload() -> Vec<(&'static str, &'static [u8], u32)> {
    vec![
        ("bin/run", b"#!/bin/sh\nexit 0\n".as_slice(), 0o644),
        ("monit", b"check process web\n".as_slice(), 0o644),
        ("worker.monit", b"check process web_worker\n".as_slice(), 0o644),
    ]
}

fn mode(path: &Path) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).expect("metadata").permissions().mode() & 0o777
}

#[test]
fn apply_installs_enables_and_registers_job() {
    let node = Node::new();
    let sha1 = node.put_blob("web-blob", &web_payload());
    let manifest = node.write_manifest("state.yaml", &web_manifest(&sha1));

    node.cmd()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .success()
        .stdout(predicate::str::contains("web"));

    let base = node.base();
    let install = base.join("data/jobs/web/v1");
    assert_eq!(mode(&install.join("bin/run")), 0o755);
    assert_eq!(
        std::fs::read_link(base.join("jobs/web")).expect("enable link"),
        install
    );
    assert!(base.join("monit/job/0000_web.monitrc").is_file());
    assert!(base.join("monit/job/0000_web_worker.monitrc").is_file());
    assert_eq!(
        std::fs::read_dir(base.join("data/tmp"))
            .map(Iterator::count)
            .unwrap_or(0),
        0,
        "scratch space must be empty"
    );
}

#[test]
fn list_reports_enabled_bundle_as_json() {
    let node = Node::new();
    let sha1 = node.put_blob("web-blob", &web_payload());
    let manifest = node.write_manifest("state.yaml", &web_manifest(&sha1));
    node.cmd().arg("apply").arg(&manifest).assert().success();

    let output = node
        .cmd()
        .args(["list", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(
        value,
        serde_json::json!([{ "name": "web", "version": "v1", "state": "enabled" }])
    );
}

#[test]
fn apply_with_empty_manifest_removes_installed_jobs() {
    let node = Node::new();
    let sha1 = node.put_blob("web-blob", &web_payload());
    let manifest = node.write_manifest("state.yaml", &web_manifest(&sha1));
    node.cmd().arg("apply").arg(&manifest).assert().success();

    let empty = node.write_manifest("empty.json", r#"{"index":0,"jobs":[]}"#);
    let output = node
        .cmd()
        .args(["apply", "--json"])
        .arg(&empty)
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(
        value["removed"],
        serde_json::json!([{ "name": "web", "version": "v1" }])
    );

    let base = node.base();
    assert!(!base.join("data/jobs/web").exists());
    assert!(std::fs::symlink_metadata(base.join("jobs/web")).is_err());
    assert!(!base.join("monit/job/0000_web.monitrc").exists());
}

#[test]
fn apply_with_wrong_digest_fails_and_installs_nothing() {
    let node = Node::new();
    node.put_blob("web-blob", &web_payload());
    let manifest = node.write_manifest("state.yaml", &web_manifest(&"0".repeat(40)));

    node.cmd()
        .arg("apply")
        .arg(&manifest)
        .assert()
        .failure()
        .stderr(predicate::str::contains("digest mismatch"));

    assert!(!node.base().join("data/jobs/web").exists());
}

#[test]
fn apply_failure_in_json_mode_prints_error_object() {
    let node = Node::new();
    let missing = node.root.path().join("missing.yaml");

    let output = node
        .cmd()
        .args(["apply", "--json"])
        .arg(&missing)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["error"], true);
    assert!(
        value["message"]
            .as_str()
            .expect("message")
            .contains("missing.yaml")
    );
}

#[test]
fn list_on_fresh_node_reports_nothing() {
    let node = Node::new();
    node.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No job bundles installed."));
}

#[test]
fn missing_config_file_is_rejected_before_touching_the_node() {
    let node = Node::new();
    let typo = node.root.path().join("conifg.yaml");
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("job-agent"));
    cmd.env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&typo)
        .arg("list")
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("does not exist")
                .and(predicate::str::contains("conifg.yaml")),
        );
}

#[test]
fn missing_config_from_environment_is_rejected() {
    let node = Node::new();
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("job-agent"));
    cmd.env("NO_COLOR", "1")
        .env("JOB_AGENT_CONFIG", node.root.path().join("absent.yaml"))
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("absent.yaml"));
}
