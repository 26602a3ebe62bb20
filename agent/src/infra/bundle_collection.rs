//! File-backed bundle store: implements `BundleCollection` and `Bundle`.
//!
//! Layout:
//!
//! ```text
//! <install_root>/<name>/<version>/   installed payload
//! <install_root>/.staging/           payloads being copied into place
//! <enable_root>/<name> -> <install_root>/<name>/<version>
//! ```
//!
//! Install, enable, and disable each finish with a single `rename` or
//! `unlink`, so observers see either the old state or the new one.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use job_models::{Job, validate_job};
use walkdir::WalkDir;

use crate::application::ports::{Bundle, BundleCollection};
use crate::domain::{BundleError, BundleId};
use crate::infra::fs::remove_all;

const STAGING_DIR: &str = ".staging";

/// Bundle registry rooted at an install directory and an enable directory.
#[derive(Debug, Clone)]
pub struct FileBundleCollection {
    install_root: PathBuf,
    enable_root: PathBuf,
}

impl FileBundleCollection {
    #[must_use]
    pub fn new(install_root: PathBuf, enable_root: PathBuf) -> Self {
        Self {
            install_root,
            enable_root,
        }
    }

    fn bundle(&self, id: BundleId) -> FileBundle {
        FileBundle {
            install_path: self.install_root.join(&id.name).join(&id.version),
            enable_path: self.enable_root.join(&id.name),
            staging_root: self.install_root.join(STAGING_DIR),
            enable_root: self.enable_root.clone(),
            id,
        }
    }
}

impl BundleCollection for FileBundleCollection {
    type Bundle = FileBundle;

    fn get(&self, job: &Job) -> Result<FileBundle> {
        validate_job(job).with_context(|| format!("invalid job definition '{}'", job.name))?;
        Ok(self.bundle(BundleId::for_job(job)))
    }

    fn list(&self) -> Result<Vec<FileBundle>> {
        if !self.install_root.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids = Vec::new();
        let walker = WalkDir::new(&self.install_root).min_depth(2).max_depth(2);
        for entry in walker {
            let entry = entry
                .with_context(|| format!("listing bundles in {}", self.install_root.display()))?;
            let Some(name) = entry.path().parent().and_then(Path::file_name) else {
                continue;
            };
            if !entry.file_type().is_dir() || is_hidden(name) || is_hidden(entry.file_name()) {
                continue;
            }
            ids.push(BundleId::new(
                name.to_string_lossy(),
                entry.file_name().to_string_lossy(),
            ));
        }

        ids.sort();
        Ok(ids.into_iter().map(|id| self.bundle(id)).collect())
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

/// One bundle in a `FileBundleCollection`.
#[derive(Debug, Clone)]
pub struct FileBundle {
    id: BundleId,
    install_path: PathBuf,
    enable_path: PathBuf,
    enable_root: PathBuf,
    staging_root: PathBuf,
}

impl FileBundle {
    fn staging_path(&self) -> PathBuf {
        self.staging_root
            .join(format!("{}-{}", self.id.name, self.id.version))
    }

    fn temp_link_path(&self) -> PathBuf {
        self.enable_root.join(format!(".{}.link", self.id.name))
    }
}

impl Bundle for FileBundle {
    fn id(&self) -> &BundleId {
        &self.id
    }

    fn is_installed(&self) -> Result<bool> {
        match std::fs::metadata(&self.install_path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => {
                Err(e).with_context(|| format!("inspecting {}", self.install_path.display()))
            }
        }
    }

    fn is_enabled(&self) -> Result<bool> {
        match std::fs::read_link(&self.enable_path) {
            Ok(target) => Ok(target == self.install_path),
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::InvalidInput) => {
                Ok(false)
            }
            Err(e) => Err(e).with_context(|| format!("reading link {}", self.enable_path.display())),
        }
    }

    fn install(&self, source: &Path) -> Result<()> {
        if self.is_installed()? {
            tracing::debug!(bundle = %self.id, "bundle already installed");
            return Ok(());
        }

        let staging = self.staging_path();
        remove_all(&staging)?;
        copy_tree(source, &staging)?;

        if let Some(parent) = self.install_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        std::fs::rename(&staging, &self.install_path).with_context(|| {
            format!(
                "moving {} into {}",
                staging.display(),
                self.install_path.display()
            )
        })?;
        Ok(())
    }

    fn enable(&self) -> Result<()> {
        if !self.is_installed()? {
            return Err(BundleError::EnableWithoutInstall(self.id.clone()).into());
        }
        if self.is_enabled()? {
            return Ok(());
        }
        if let Ok(meta) = std::fs::symlink_metadata(&self.enable_path)
            && !meta.file_type().is_symlink()
        {
            return Err(BundleError::EnablePathOccupied {
                id: self.id.clone(),
                path: self.enable_path.display().to_string(),
            }
            .into());
        }

        std::fs::create_dir_all(&self.enable_root)
            .with_context(|| format!("creating directory {}", self.enable_root.display()))?;

        let temp_link = self.temp_link_path();
        remove_all(&temp_link)?;
        symlink(&self.install_path, &temp_link)?;
        std::fs::rename(&temp_link, &self.enable_path)
            .with_context(|| format!("activating link {}", self.enable_path.display()))?;
        Ok(())
    }

    fn disable(&self) -> Result<()> {
        // A link pointing at another version belongs to that bundle.
        if !self.is_enabled()? {
            return Ok(());
        }
        std::fs::remove_file(&self.enable_path)
            .with_context(|| format!("removing link {}", self.enable_path.display()))
    }

    fn uninstall(&self) -> Result<()> {
        remove_all(&self.install_path)?;
        if let Some(name_dir) = self.install_path.parent() {
            let is_empty = match std::fs::read_dir(name_dir) {
                Ok(mut entries) => entries.next().is_none(),
                Err(e) => {
                    tracing::warn!(
                        bundle = %self.id,
                        path = %name_dir.display(),
                        error = %e,
                        "failed to read job directory after uninstall"
                    );
                    false
                }
            };
            if is_empty {
                std::fs::remove_dir(name_dir)
                    .with_context(|| format!("removing directory {}", name_dir.display()))?;
            }
        }
        Ok(())
    }

    fn install_path(&self) -> Result<PathBuf> {
        if !self.is_installed()? {
            return Err(BundleError::NotInstalled(self.id.clone()).into());
        }
        Ok(self.install_path.clone())
    }
}

/// Copy a directory tree, preserving file modes and symlinks.
fn copy_tree(source: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(source) {
        let entry = entry.with_context(|| format!("walking {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .with_context(|| format!("relativizing {}", entry.path().display()))?;
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            std::fs::create_dir_all(&target)
                .with_context(|| format!("creating directory {}", target.display()))?;
        } else if file_type.is_symlink() {
            let link = std::fs::read_link(entry.path())
                .with_context(|| format!("reading link {}", entry.path().display()))?;
            symlink(&link, &target)?;
        } else {
            std::fs::copy(entry.path(), &target).with_context(|| {
                format!("copying {} to {}", entry.path().display(), target.display())
            })?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path) -> Result<()> {
    std::os::unix::fs::symlink(target, link)
        .with_context(|| format!("linking {} -> {}", link.display(), target.display()))
}

#[cfg(not(unix))]
fn symlink(_target: &Path, link: &Path) -> Result<()> {
    anyhow::bail!("cannot create {}: symlinks require a unix host", link.display())
}
