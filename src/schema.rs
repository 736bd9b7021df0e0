// Copyright 2025
// Licensed under the Elastic License v2.0

//! DDL for staging, production, and audit tables.
//!
//! Staging tables are UNLOGGED with no indexes: they exist for one run and
//! take the full write volume of a snapshot. Production tables carry the
//! surrogate key, the soft-delete flag, and the lifecycle timestamps; their
//! indexes are created unnamed so PostgreSQL's auto-naming keeps a rebuilt
//! `<prod>_new` from colliding with the generation it replaces.

use crate::datasets::Dataset;

/// Staging DDL: dataset columns (business key NOT NULL) plus `raw_record`.
pub fn staging_ddl(ds: Dataset) -> String {
    let mut cols: Vec<String> = ds
        .columns()
        .iter()
        .map(|c| {
            if c.business_key {
                format!("{} TEXT NOT NULL", c.name)
            } else {
                format!("{} TEXT", c.name)
            }
        })
        .collect();
    cols.push("raw_record TEXT".to_string());
    format!(
        "CREATE UNLOGGED TABLE {} (\n    {}\n)",
        ds.staging_table(),
        cols.join(",\n    ")
    )
}

/// Production DDL for `table` (used for the live table and `<prod>_new`).
pub fn production_ddl(ds: Dataset, table: &str) -> String {
    let cols: Vec<String> = ds
        .columns()
        .iter()
        .map(|c| {
            if c.business_key {
                format!("{} TEXT NOT NULL", c.name)
            } else {
                format!("{} TEXT", c.name)
            }
        })
        .collect();
    format!(
        "CREATE TABLE {table} (\n    \
         id BIGSERIAL PRIMARY KEY,\n    \
         {cols},\n    \
         raw_record TEXT,\n    \
         is_active BOOLEAN NOT NULL DEFAULT TRUE,\n    \
         first_seen_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),\n    \
         last_updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()\n)",
        table = table,
        cols = cols.join(",\n    ")
    )
}

/// Index DDL for `table`: the unique business-key index plus per-dataset
/// lookup indexes. Index names are left to the server.
pub fn production_index_ddls(ds: Dataset, table: &str) -> Vec<String> {
    let bk = ds.business_key().join(", ");
    let mut ddls = vec![format!("CREATE UNIQUE INDEX ON {} ({})", table, bk)];
    match ds {
        // cui2 lookups walk relationships backwards
        Dataset::Relationships => {
            ddls.push(format!("CREATE INDEX ON {} (cui2)", table));
        }
        // names and source links are most often fetched per concept
        Dataset::Names | Dataset::SourceLinks => {
            ddls.push(format!("CREATE INDEX ON {} (cui)", table));
        }
        _ => {}
    }
    ddls
}

pub const ETL_AUDIT_LOG_DDL: &str = "\
CREATE TABLE IF NOT EXISTS etl_audit_log (
    log_id          BIGSERIAL PRIMARY KEY,
    run_id          UUID        NOT NULL,
    package_version TEXT        NOT NULL,
    started_at      TIMESTAMPTZ NOT NULL,
    finished_at     TIMESTAMPTZ,
    mode            TEXT        NOT NULL,
    status          TEXT        NOT NULL,
    source_files    JSONB,
    error_message   TEXT
)";

pub const ETL_RUN_DETAILS_DDL: &str = "\
CREATE TABLE IF NOT EXISTS etl_run_details (
    detail_id     BIGSERIAL PRIMARY KEY,
    log_id        BIGINT NOT NULL REFERENCES etl_audit_log (log_id),
    dataset       TEXT   NOT NULL,
    rows_read     BIGINT NOT NULL DEFAULT 0,
    rows_inserted BIGINT NOT NULL DEFAULT 0,
    rows_updated  BIGINT NOT NULL DEFAULT 0,
    rows_deleted  BIGINT NOT NULL DEFAULT 0,
    bytes_loaded  BIGINT NOT NULL DEFAULT 0,
    duration_ms   BIGINT NOT NULL DEFAULT 0
)";

pub const ETL_RUN_DETAILS_INDEX_DDL: &str =
    "CREATE INDEX IF NOT EXISTS etl_run_details_log_id_idx ON etl_run_details (log_id)";
