//! Archive infrastructure: implements the `Compressor` port for `.tgz` payloads.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

use crate::application::ports::Compressor;

/// Extracts gzip-compressed tarballs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarGzCompressor;

impl Compressor for TarGzCompressor {
    async fn decompress_file_to_dir(&self, file: &Path, dir: &Path) -> Result<()> {
        let file: PathBuf = file.to_path_buf();
        let dir: PathBuf = dir.to_path_buf();
        tokio::task::spawn_blocking(move || unpack_tgz(&file, &dir))
            .await
            .context("spawn_blocking for decompress")?
    }
}

/// Unpack `file` into `dir`. Entries escaping `dir` are skipped by `tar`.
fn unpack_tgz(file: &Path, dir: &Path) -> Result<()> {
    let input = File::open(file).with_context(|| format!("opening {}", file.display()))?;
    let mut archive = tar::Archive::new(GzDecoder::new(BufReader::new(input)));
    archive.set_preserve_permissions(true);
    archive
        .unpack(dir)
        .with_context(|| format!("extracting {} into {}", file.display(), dir.display()))
}
