//! Filesystem infrastructure: implements the `FileSystem` port.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;

use crate::application::ports::FileSystem;

/// Production filesystem implementation of `FileSystem`.
#[derive(Debug, Default, Clone)]
pub struct OsFileSystem {
    temp_root: Option<PathBuf>,
}

impl OsFileSystem {
    /// Temp directories go to the system temp dir.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Temp directories go under `root`, created on demand.
    #[must_use]
    pub fn with_temp_root(root: PathBuf) -> Self {
        Self {
            temp_root: Some(root),
        }
    }
}

impl FileSystem for OsFileSystem {
    fn temp_dir(&self, prefix: &str) -> Result<PathBuf> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(prefix);
        let dir = match &self.temp_root {
            Some(root) => {
                std::fs::create_dir_all(root)
                    .with_context(|| format!("creating temp root {}", root.display()))?;
                builder
                    .tempdir_in(root)
                    .with_context(|| format!("creating temp dir in {}", root.display()))?
            }
            None => builder.tempdir().context("creating temp dir")?,
        };
        Ok(dir.keep())
    }

    fn remove_all(&self, path: &Path) -> Result<()> {
        remove_all(path)
    }

    fn glob(&self, pattern: &Path) -> Result<Vec<PathBuf>> {
        let (Some(dir), Some(name)) = (pattern.parent(), pattern.file_name()) else {
            anyhow::bail!("invalid glob pattern {}", pattern.display());
        };
        let name = name
            .to_str()
            .with_context(|| format!("glob pattern {} is not valid UTF-8", pattern.display()))?;
        let matcher = compile_glob(name)?;

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| format!("reading directory {}", dir.display()));
            }
        };

        let mut matches = Vec::new();
        for entry in entries {
            let entry = entry.with_context(|| format!("reading directory {}", dir.display()))?;
            if let Some(file_name) = entry.file_name().to_str()
                && matcher.is_match(file_name)
            {
                matches.push(entry.path());
            }
        }
        matches.sort();
        Ok(matches)
    }

    fn chmod(&self, path: &Path, mode: u32) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
                .with_context(|| format!("setting permissions on {}", path.display()))?;
        }
        #[cfg(not(unix))]
        let _ = (path, mode);
        Ok(())
    }

    fn file_exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// Remove a file, symlink, or directory tree. Missing paths are ignored.
///
/// # Errors
///
/// Returns an error if the path exists but cannot be removed.
pub fn remove_all(path: &Path) -> Result<()> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e).with_context(|| format!("inspecting {}", path.display())),
    };
    if meta.is_dir() {
        std::fs::remove_dir_all(path)
            .with_context(|| format!("removing directory {}", path.display()))
    } else {
        std::fs::remove_file(path).with_context(|| format!("removing file {}", path.display()))
    }
}

/// Compile a single-component glob (`*`, `?`) into an anchored regex.
fn compile_glob(pattern: &str) -> Result<Regex> {
    let mut re = String::with_capacity(pattern.len() + 2);
    re.push('^');
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    re.push('$');
    Regex::new(&re).with_context(|| format!("compiling glob pattern {pattern}"))
}
