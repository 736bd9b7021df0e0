// Copyright 2025
// Licensed under the Elastic License v2.0

//! COPY text encoder and the per-dataset producer task.
//!
//! One typed record becomes one `FORMAT text` row: tab-separated data
//! columns in staging order, `\N` for NULL, backslash escapes inside
//! values, the original source line as the trailing `raw_record` column.
//! The producer runs on a blocking thread, batching rows into ~64 KiB
//! chunks pushed through a bounded channel, so neither side ever holds a
//! full dataset.

use std::path::Path;

use anyhow::{Context, Result};
use bytes::{BufMut, Bytes, BytesMut};
use tokio::sync::mpsc;

use crate::datasets::Dataset;
use crate::fetch;
use crate::parser::records::{
    ConceptRecord, DefinitionRecord, NameRecord, Record, RelationshipRecord, SemanticTypeRecord,
    SourceLinkRecord,
};

/// Target size of one channel message.
pub const CHUNK_TARGET: usize = 64 * 1024;

/// Channel depth; with `CHUNK_TARGET` this bounds in-flight data at ~2 MiB.
pub const CHANNEL_DEPTH: usize = 32;

/// Escape a value per the COPY text rules: backslash, tab, LF and CR become
/// two-character sequences so no literal delimiter or newline survives.
fn escape_into(value: &str, buf: &mut BytesMut) {
    for &b in value.as_bytes() {
        match b {
            b'\\' => buf.put_slice(b"\\\\"),
            b'\t' => buf.put_slice(b"\\t"),
            b'\n' => buf.put_slice(b"\\n"),
            b'\r' => buf.put_slice(b"\\r"),
            _ => buf.put_u8(b),
        }
    }
}

/// Append one encoded row to `buf`.
pub fn encode_row<T: Record>(record: &T, buf: &mut BytesMut) {
    let fields = record.copy_fields();
    let expected = T::dataset().columns().len();
    assert_eq!(
        fields.len(),
        expected,
        "{} record emitted {} columns, staging DDL has {}",
        T::dataset(),
        fields.len(),
        expected
    );
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b'\t');
        }
        match field {
            Some(value) => escape_into(value, buf),
            None => buf.put_slice(b"\\N"),
        }
    }
    buf.put_u8(b'\t');
    escape_into(record.raw_record(), buf);
    buf.put_u8(b'\n');
}

/// Parse, encode and stream one dataset's file into `tx`.
///
/// Runs on a blocking thread. On error the failure is also pushed through
/// the channel so the consuming COPY aborts (and rolls back) instead of
/// committing a truncated snapshot.
pub fn stream_dataset(
    ds: Dataset,
    path: &Path,
    max_errors: u64,
    tx: mpsc::Sender<Result<Bytes>>,
) -> Result<()> {
    let result = match ds {
        Dataset::Concepts => pump::<ConceptRecord>(path, max_errors, &tx),
        Dataset::Names => pump::<NameRecord>(path, max_errors, &tx),
        Dataset::Definitions => pump::<DefinitionRecord>(path, max_errors, &tx),
        Dataset::SemanticTypes => pump::<SemanticTypeRecord>(path, max_errors, &tx),
        Dataset::Relationships => pump::<RelationshipRecord>(path, max_errors, &tx),
        Dataset::SourceLinks => pump::<SourceLinkRecord>(path, max_errors, &tx),
    };
    if let Err(ref e) = result {
        let _ = tx.blocking_send(Err(anyhow::anyhow!("record stream aborted: {:#}", e)));
    }
    result
}

fn pump<T: Record>(
    path: &Path,
    max_errors: u64,
    tx: &mpsc::Sender<Result<Bytes>>,
) -> Result<()> {
    let reader = fetch::open(path)
        .with_context(|| format!("failed to open {} for {}", path.display(), T::dataset()))?;
    let mut buf = BytesMut::with_capacity(CHUNK_TARGET + 4096);

    for item in crate::parser::records::<T, _>(reader, max_errors) {
        let record = item?;
        encode_row(&record, &mut buf);
        if buf.len() >= CHUNK_TARGET && tx.blocking_send(Ok(buf.split().freeze())).is_err() {
            // receiver went away; the loader reports the real failure
            return Ok(());
        }
    }
    if !buf.is_empty() {
        let _ = tx.blocking_send(Ok(buf.split().freeze()));
    }
    Ok(())
}
