//! Local blobstore: implements the `Blobstore` port over a directory of blobs.
//!
//! `get` copies the blob into scratch space while hashing it, so the caller
//! always works on a private, verified copy it can release with `clean_up`.

use std::fs::File;
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::Digest;

use crate::application::ports::Blobstore;
use crate::domain::BlobstoreError;

const COPY_BUF_SIZE: usize = 64 * 1024;

/// Blobstore reading blobs from `<store_dir>/<blobstore_id>`.
#[derive(Debug, Clone)]
pub struct LocalBlobstore {
    store_dir: PathBuf,
    scratch_dir: PathBuf,
}

impl LocalBlobstore {
    #[must_use]
    pub fn new(store_dir: PathBuf, scratch_dir: PathBuf) -> Self {
        Self {
            store_dir,
            scratch_dir,
        }
    }
}

impl Blobstore for LocalBlobstore {
    async fn get(&self, blobstore_id: &str, digest: &str) -> Result<PathBuf> {
        validate_blob_id(blobstore_id)?;
        let expected = ExpectedDigest::parse(digest)?;

        let id = blobstore_id.to_string();
        let source = self.store_dir.join(blobstore_id);
        let scratch = self.scratch_dir.clone();
        tokio::task::spawn_blocking(move || copy_and_verify(&id, &source, &scratch, &expected))
            .await
            .context("spawn_blocking for blob fetch")?
    }

    fn clean_up(&self, file: &Path) -> Result<()> {
        match std::fs::remove_file(file) {
            Err(e) if e.kind() != ErrorKind::NotFound => {
                Err(e).with_context(|| format!("removing fetched blob {}", file.display()))
            }
            _ => Ok(()),
        }
    }
}

fn validate_blob_id(id: &str) -> Result<(), BlobstoreError> {
    if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\', '\0']) {
        return Err(BlobstoreError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Digest a blob is verified against.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ExpectedDigest {
    Sha1(String),
    Sha256(String),
}

impl ExpectedDigest {
    /// Accepts a bare 40-hex sha1 or `sha256:<64 hex>`.
    fn parse(digest: &str) -> Result<Self, BlobstoreError> {
        let unsupported = || BlobstoreError::UnsupportedDigest(digest.to_string());
        if let Some(hex) = digest.strip_prefix("sha256:") {
            return is_hex(hex, 64)
                .then(|| Self::Sha256(hex.to_ascii_lowercase()))
                .ok_or_else(unsupported);
        }
        let hex = digest.strip_prefix("sha1:").unwrap_or(digest);
        is_hex(hex, 40)
            .then(|| Self::Sha1(hex.to_ascii_lowercase()))
            .ok_or_else(unsupported)
    }

    fn hex(&self) -> &str {
        match self {
            Self::Sha1(hex) | Self::Sha256(hex) => hex,
        }
    }

    fn hasher(&self) -> BlobHasher {
        match self {
            Self::Sha1(_) => BlobHasher::Sha1(sha1::Sha1::new()),
            Self::Sha256(_) => BlobHasher::Sha256(sha2::Sha256::new()),
        }
    }
}

fn is_hex(value: &str, len: usize) -> bool {
    value.len() == len && value.bytes().all(|b| b.is_ascii_hexdigit())
}

enum BlobHasher {
    Sha1(sha1::Sha1),
    Sha256(sha2::Sha256),
}

impl BlobHasher {
    fn update(&mut self, bytes: &[u8]) {
        match self {
            Self::Sha1(h) => h.update(bytes),
            Self::Sha256(h) => h.update(bytes),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            Self::Sha1(h) => hex_encode(&h.finalize()),
            Self::Sha256(h) => hex_encode(&h.finalize()),
        }
    }
}

fn copy_and_verify(
    id: &str,
    source: &Path,
    scratch_dir: &Path,
    expected: &ExpectedDigest,
) -> Result<PathBuf> {
    let mut input = match File::open(source) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(BlobstoreError::NotFound(id.to_string()).into());
        }
        Err(e) => return Err(e).with_context(|| format!("opening {}", source.display())),
    };

    std::fs::create_dir_all(scratch_dir)
        .with_context(|| format!("creating directory {}", scratch_dir.display()))?;
    // Dropped (and deleted) on every early return below.
    let mut output = tempfile::Builder::new()
        .prefix("blob-")
        .tempfile_in(scratch_dir)
        .with_context(|| format!("creating scratch file in {}", scratch_dir.display()))?;

    let mut hasher = expected.hasher();
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = input
            .read(&mut buf)
            .with_context(|| format!("reading {}", source.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        output
            .write_all(&buf[..n])
            .context("writing fetched blob")?;
    }
    output.flush().context("flushing fetched blob")?;

    let actual = hasher.finalize_hex();
    if actual != expected.hex() {
        return Err(BlobstoreError::DigestMismatch {
            id: id.to_string(),
            expected: expected.hex().to_string(),
            actual,
        }
        .into());
    }

    let (_, path) = output.keep().context("persisting fetched blob")?;
    tracing::debug!(blob = id, path = %path.display(), "fetched blob");
    Ok(path)
}

/// Lowercase hex encoding.
fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(char::from(HEX[(b >> 4) as usize]));
        out.push(char::from(HEX[(b & 0xf) as usize]));
    }
    out
}
