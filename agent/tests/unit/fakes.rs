//! Shared recording fakes for engine tests.
//!
//! Every fake writes to one [`Journal`] so tests can assert on the global
//! order of collaborator calls. Bundles and supervisor are pure in-memory;
//! the engine's temp directories use the real `OsFileSystem` under a
//! per-test `TempDir`, wrapped so single calls can be made to fail.

#![allow(clippy::expect_used)]

use std::collections::BTreeSet;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use job_agent::application::ports::{
    Blobstore, Bundle, BundleCollection, Compressor, FileSystem, JobSupervisor, ProgressReporter,
};
use job_agent::application::services::job_applier::JobApplier;
use job_agent::domain::{BundleError, BundleId};
use job_agent::infra::OsFileSystem;
use job_models::{Job, JobIndex, JobSource};
use tempfile::TempDir;

// ── Journal ───────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().expect("journal lock").push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().expect("journal lock").clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

pub fn job(name: &str, version: &str) -> Job {
    Job {
        name: name.to_string(),
        version: version.to_string(),
        source: JobSource {
            blobstore_id: format!("blob-{name}-{version}"),
            sha1: "da39a3ee5e6b4b0d3255bfef95601890afd80709".to_string(),
            path_in_archive: String::new(),
        },
    }
}

// ── Bundles ───────────────────────────────────────────────────────────────────

#[derive(Default)]
struct BundleWorld {
    installed: BTreeSet<BundleId>,
    enabled: BTreeSet<BundleId>,
    refuse_disable: BTreeSet<BundleId>,
    refuse_uninstall: BTreeSet<BundleId>,
    refuse_install: bool,
    /// `(relative path, mode)` of every file seen at install time.
    install_snapshots: Vec<(BundleId, Vec<(String, u32)>)>,
}

#[derive(Clone)]
pub struct FakeBundles {
    world: Arc<Mutex<BundleWorld>>,
    journal: Journal,
    install_root: PathBuf,
}

impl FakeBundles {
    pub fn new(journal: &Journal, install_root: &Path) -> Self {
        Self {
            world: Arc::default(),
            journal: journal.clone(),
            install_root: install_root.to_path_buf(),
        }
    }

    /// Mark a bundle as installed, and enabled if asked, without any calls.
    pub fn preinstall(&self, id: &BundleId, enabled: bool) {
        let mut world = self.world.lock().expect("world lock");
        world.installed.insert(id.clone());
        if enabled {
            world.enabled.insert(id.clone());
        }
    }

    pub fn refuse_disable(&self, id: &BundleId) {
        self.world
            .lock()
            .expect("world lock")
            .refuse_disable
            .insert(id.clone());
    }

    pub fn refuse_uninstall(&self, id: &BundleId) {
        self.world
            .lock()
            .expect("world lock")
            .refuse_uninstall
            .insert(id.clone());
    }

    pub fn refuse_install(&self) {
        self.world.lock().expect("world lock").refuse_install = true;
    }

    pub fn installed(&self) -> Vec<BundleId> {
        let world = self.world.lock().expect("world lock");
        world.installed.iter().cloned().collect()
    }

    pub fn enabled(&self, id: &BundleId) -> bool {
        self.world.lock().expect("world lock").enabled.contains(id)
    }

    pub fn install_snapshot(&self, id: &BundleId) -> Option<Vec<(String, u32)>> {
        let world = self.world.lock().expect("world lock");
        world
            .install_snapshots
            .iter()
            .find(|(snap_id, _)| snap_id == id)
            .map(|(_, files)| files.clone())
    }

    pub fn install_path_of(&self, id: &BundleId) -> PathBuf {
        self.install_root.join(&id.name).join(&id.version)
    }

    fn handle(&self, id: BundleId) -> FakeBundle {
        FakeBundle {
            id,
            owner: self.clone(),
        }
    }
}

impl BundleCollection for FakeBundles {
    type Bundle = FakeBundle;

    fn get(&self, job: &Job) -> Result<FakeBundle> {
        Ok(self.handle(BundleId::for_job(job)))
    }

    fn list(&self) -> Result<Vec<FakeBundle>> {
        Ok(self.installed().into_iter().map(|id| self.handle(id)).collect())
    }
}

pub struct FakeBundle {
    id: BundleId,
    owner: FakeBundles,
}

impl FakeBundle {
    fn world(&self) -> std::sync::MutexGuard<'_, BundleWorld> {
        self.owner.world.lock().expect("world lock")
    }
}

impl Bundle for FakeBundle {
    fn id(&self) -> &BundleId {
        &self.id
    }

    fn is_installed(&self) -> Result<bool> {
        Ok(self.world().installed.contains(&self.id))
    }

    fn is_enabled(&self) -> Result<bool> {
        Ok(self.world().enabled.contains(&self.id))
    }

    fn install(&self, source: &Path) -> Result<()> {
        self.owner.journal.record(format!("install {}", self.id));
        let mut world = self.world();
        if world.refuse_install {
            anyhow::bail!("install refused");
        }
        let files = snapshot_modes(source);
        copy_payload(source, &self.owner.install_path_of(&self.id))?;
        world.install_snapshots.push((self.id.clone(), files));
        world.installed.insert(self.id.clone());
        Ok(())
    }

    fn enable(&self) -> Result<()> {
        self.owner.journal.record(format!("enable {}", self.id));
        let mut world = self.world();
        if !world.installed.contains(&self.id) {
            return Err(BundleError::EnableWithoutInstall(self.id.clone()).into());
        }
        world.enabled.insert(self.id.clone());
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        self.owner.journal.record(format!("disable {}", self.id));
        let mut world = self.world();
        if world.refuse_disable.contains(&self.id) {
            anyhow::bail!("disable refused");
        }
        world.enabled.remove(&self.id);
        Ok(())
    }

    fn uninstall(&self) -> Result<()> {
        self.owner.journal.record(format!("uninstall {}", self.id));
        let mut world = self.world();
        if world.refuse_uninstall.contains(&self.id) {
            anyhow::bail!("uninstall refused");
        }
        world.installed.remove(&self.id);
        Ok(())
    }

    fn install_path(&self) -> Result<PathBuf> {
        if !self.world().installed.contains(&self.id) {
            return Err(BundleError::NotInstalled(self.id.clone()).into());
        }
        Ok(self.owner.install_path_of(&self.id))
    }
}

fn snapshot_modes(root: &Path) -> Vec<(String, u32)> {
    let mut files: Vec<(String, u32)> = walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("entry under root")
                .to_string_lossy()
                .to_string();
            let mode = entry.metadata().expect("metadata").permissions().mode() & 0o777;
            (rel, mode)
        })
        .collect();
    files.sort();
    files
}

fn copy_payload(source: &Path, dest: &Path) -> Result<()> {
    for entry in walkdir::WalkDir::new(source) {
        let entry = entry?;
        let target = dest.join(entry.path().strip_prefix(source)?);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// ── Blobstore ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeBlobstore {
    journal: Journal,
    root: PathBuf,
    pub fail: bool,
    cleaned: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeBlobstore {
    pub fn new(journal: &Journal, root: &Path) -> Self {
        Self {
            journal: journal.clone(),
            root: root.to_path_buf(),
            fail: false,
            cleaned: Arc::default(),
        }
    }

    pub fn cleaned(&self) -> Vec<PathBuf> {
        self.cleaned.lock().expect("cleaned lock").clone()
    }
}

impl Blobstore for FakeBlobstore {
    async fn get(&self, blobstore_id: &str, digest: &str) -> Result<PathBuf> {
        self.journal
            .record(format!("blobstore.get {blobstore_id} {digest}"));
        if self.fail {
            anyhow::bail!("blob {blobstore_id} unavailable");
        }
        Ok(self.root.join(format!("{blobstore_id}.tgz")))
    }

    fn clean_up(&self, file: &Path) -> Result<()> {
        self.journal.record(format!("blobstore.clean_up {}", file.display()));
        self.cleaned
            .lock()
            .expect("cleaned lock")
            .push(file.to_path_buf());
        Ok(())
    }
}

// ── Compressor ────────────────────────────────────────────────────────────────

/// Writes `payload` into the target directory; `fail` writes a partial
/// payload and then errors.
#[derive(Clone)]
pub struct FakeCompressor {
    journal: Journal,
    pub payload: Vec<(String, Vec<u8>, u32)>,
    pub fail: bool,
    dirs: Arc<Mutex<Vec<PathBuf>>>,
}

impl FakeCompressor {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            payload: vec![
                ("bin/run".to_string(), b"#!/bin/sh\n".to_vec(), 0o644),
                ("bin/ctl".to_string(), b"#!/bin/sh\n".to_vec(), 0o600),
                ("monit".to_string(), b"check process x\n".to_vec(), 0o644),
            ],
            fail: false,
            dirs: Arc::default(),
        }
    }

    /// Directories handed to `decompress_file_to_dir`, in call order.
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.dirs.lock().expect("dirs lock").clone()
    }
}

impl Compressor for FakeCompressor {
    async fn decompress_file_to_dir(&self, file: &Path, dir: &Path) -> Result<()> {
        self.journal.record(format!("decompress {}", file.display()));
        self.dirs.lock().expect("dirs lock").push(dir.to_path_buf());

        for (rel, content, mode) in &self.payload {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&path, content)?;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(*mode))?;
            if self.fail {
                anyhow::bail!("truncated archive");
            }
        }
        Ok(())
    }
}

// ── File system ───────────────────────────────────────────────────────────────

/// `OsFileSystem` with switches that make `temp_dir` or `chmod` fail.
pub struct FakeFileSystem {
    inner: OsFileSystem,
    pub fail_temp_dir: bool,
    pub fail_chmod: bool,
}

impl FakeFileSystem {
    pub fn new(temp_root: PathBuf) -> Self {
        Self {
            inner: OsFileSystem::with_temp_root(temp_root),
            fail_temp_dir: false,
            fail_chmod: false,
        }
    }
}

impl FileSystem for FakeFileSystem {
    fn temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        if self.fail_temp_dir {
            anyhow::bail!("no space left for temp dir");
        }
        self.inner.temp_dir(prefix)
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        self.inner.remove_all(path)
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        self.inner.glob(pattern)
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        if self.fail_chmod {
            anyhow::bail!("operation not permitted");
        }
        self.inner.chmod(path, mode)
    }

    fn file_exists(&self, path: &Path) -> bool {
        self.inner.file_exists(path)
    }
}

// ── Supervisor ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeSupervisor {
    journal: Journal,
    pub fail_reload: bool,
    /// Registration name whose `add_job` fails.
    pub fail_on: Option<String>,
    added: Arc<Mutex<Vec<(String, JobIndex, PathBuf)>>>,
}

impl FakeSupervisor {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            fail_reload: false,
            fail_on: None,
            added: Arc::default(),
        }
    }

    pub fn added(&self) -> Vec<(String, JobIndex, PathBuf)> {
        self.added.lock().expect("added lock").clone()
    }
}

impl JobSupervisor for FakeSupervisor {
    async fn add_job(&self, name: &str, index: JobIndex, config_path: &Path) -> Result<()> {
        self.journal.record(format!("supervisor.add {name} {index}"));
        if self.fail_on.as_deref() == Some(name) {
            anyhow::bail!("monit rejected {name}");
        }
        self.added
            .lock()
            .expect("added lock")
            .push((name.to_string(), index, config_path.to_path_buf()));
        Ok(())
    }

    async fn remove_all_jobs(&self) -> Result<()> {
        self.journal.record("supervisor.remove_all");
        self.added.lock().expect("added lock").clear();
        Ok(())
    }

    async fn reload(&self) -> Result<()> {
        self.journal.record("supervisor.reload");
        if self.fail_reload {
            anyhow::bail!("reload refused");
        }
        Ok(())
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    messages: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("reporter lock").clone()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.messages
            .lock()
            .expect("reporter lock")
            .push(format!("step: {message}"));
    }

    fn success(&self, message: &str) {
        self.messages
            .lock()
            .expect("reporter lock")
            .push(format!("success: {message}"));
    }

    fn warn(&self, message: &str) {
        self.messages
            .lock()
            .expect("reporter lock")
            .push(format!("warn: {message}"));
    }
}

// ── Harness ───────────────────────────────────────────────────────────────────

pub type FakeApplier<'a> =
    JobApplier<'a, FakeBundles, FakeBlobstore, FakeCompressor, FakeFileSystem, FakeSupervisor>;

/// All collaborators rooted in one temp directory.
pub struct Harness {
    pub root: TempDir,
    pub journal: Journal,
    pub bundles: FakeBundles,
    pub blobstore: FakeBlobstore,
    pub compressor: FakeCompressor,
    pub fs: FakeFileSystem,
    pub supervisor: FakeSupervisor,
}

impl Harness {
    pub fn new() -> Self {
        let root = TempDir::new().expect("tempdir");
        let journal = Journal::default();
        Self {
            bundles: FakeBundles::new(&journal, &root.path().join("installed")),
            blobstore: FakeBlobstore::new(&journal, &root.path().join("blobs")),
            compressor: FakeCompressor::new(&journal),
            fs: FakeFileSystem::new(root.path().join("tmp")),
            supervisor: FakeSupervisor::new(&journal),
            journal,
            root,
        }
    }

    pub fn applier(&self) -> FakeApplier<'_> {
        JobApplier::new(
            &self.bundles,
            &self.blobstore,
            &self.compressor,
            &self.fs,
            &self.supervisor,
        )
    }

    /// Entries left under the engine's temp root.
    pub fn temp_entries(&self) -> usize {
        std::fs::read_dir(self.root.path().join("tmp"))
            .map(Iterator::count)
            .unwrap_or(0)
    }

    /// Create an installed bundle directory holding the given files.
    pub fn install_files(&self, id: &BundleId, files: &[&str]) -> PathBuf {
        let dir = self.bundles.install_path_of(id);
        std::fs::create_dir_all(&dir).expect("mkdir");
        for file in files {
            std::fs::write(dir.join(file), b"check process x\n").expect("write");
        }
        self.bundles.preinstall(id, true);
        dir
    }
}
