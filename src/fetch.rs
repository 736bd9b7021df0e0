// Copyright 2025
// Licensed under the Elastic License v2.0

//! Access to the downloaded MedGen release files.
//!
//! Fetching the release from the NCBI FTP server (with retry, resumption
//! and checksum verification) is an external collaborator's job; this
//! module is its consuming interface. A dataset's file is looked up in the
//! download directory — plain or gzipped — and opened as a buffered text
//! stream with transparent decompression.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;

use crate::datasets::Dataset;
use crate::error::EtlError;

/// Locate the source file for `ds` under `download_dir`. The plain file
/// wins over a `.gz` sibling when both are present.
pub fn resolve(download_dir: &Path, ds: Dataset) -> Result<PathBuf> {
    let plain = download_dir.join(ds.source_file());
    if plain.is_file() {
        return Ok(plain);
    }
    let gz = download_dir.join(format!("{}.gz", ds.source_file()));
    if gz.is_file() {
        return Ok(gz);
    }
    Err(EtlError::load(format!(
        "source file {} (or {}.gz) not found in {}",
        ds.source_file(),
        ds.source_file(),
        download_dir.display()
    ))
    .into())
}

/// Open a source file as a buffered reader, decompressing `.gz` on the fly.
pub fn open(path: &Path) -> Result<Box<dyn BufRead + Send>> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("gz")) {
        Ok(Box::new(BufReader::new(GzDecoder::new(BufReader::new(
            file,
        )))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    #[test]
    fn test_resolve_prefers_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MRSTY.RRF"), "x").unwrap();
        std::fs::write(dir.path().join("MRSTY.RRF.gz"), "y").unwrap();
        let path = resolve(dir.path(), Dataset::SemanticTypes).unwrap();
        assert_eq!(path.file_name().unwrap(), "MRSTY.RRF");
    }

    #[test]
    fn test_resolve_falls_back_to_gz() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("MGDEF.RRF.gz"), "y").unwrap();
        let path = resolve(dir.path(), Dataset::Definitions).unwrap();
        assert_eq!(path.file_name().unwrap(), "MGDEF.RRF.gz");
    }

    #[test]
    fn test_resolve_missing_file_is_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve(dir.path(), Dataset::Concepts).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<EtlError>(),
            Some(EtlError::Load { .. })
        ));
    }

    #[test]
    fn test_open_gz_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("MRREL.RRF.gz");
        let mut enc = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        enc.write_all(b"C0001|A1|SCUI|RB|C0002|\n").unwrap();
        enc.finish().unwrap();

        let mut reader = open(&path).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "C0001|A1|SCUI|RB|C0002|\n");
    }

    #[test]
    fn test_open_plain_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("NAMES.RRF");
        std::fs::write(&path, "a|b|\n").unwrap();
        let mut reader = open(&path).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line, "a|b|\n");
    }
}
