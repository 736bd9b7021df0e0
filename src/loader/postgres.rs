// Copyright 2025
// Licensed under the Elastic License v2.0

//! # PostgreSQL driver
//!
//! Bulk ingestion goes through the server's native `COPY FROM STDIN`
//! protocol into UNLOGGED staging tables; the CDC diff is computed in SQL
//! with an MD5 row hash; promotion is either a rename-based atomic swap
//! (full mode) or a single delete→update→insert transaction (delta mode).
//! A session advisory lock taken at connect serializes runs against the
//! same target.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use futures::SinkExt;
use tokio::sync::mpsc;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, CopyInSink, NoTls};
use tracing::{debug, error, info};

use crate::datasets::Dataset;
use crate::error::EtlError;
use crate::schema;

use super::{ChangeCounts, LoadMode, LoadReport, Loader, RunDetail, RunInfo, RunStatus};

/// Session lock key serializing loader runs against one target database.
const ADVISORY_LOCK_KEY: i64 = 0x4d47_4c4f_4144; // "MGLOAD"

/// How many duplicate business keys to quote in a `Data` error.
const DUPLICATE_KEY_SAMPLE: usize = 5;

pub struct PostgresLoader {
    dsn: String,
    statement_timeout: Duration,
    client: Option<Client>,
}

/// Classify a driver error: lost sessions are connection errors, canceled
/// statements are timeouts, everything else failed the load.
fn classify(context: &str, err: tokio_postgres::Error) -> anyhow::Error {
    if err.is_closed() {
        return EtlError::connection_with_cause(context.to_string(), err).into();
    }
    if err.code() == Some(&SqlState::QUERY_CANCELED) {
        return EtlError::timed_out(context.to_string(), err).into();
    }
    EtlError::load_with_cause(context.to_string(), err).into()
}

async fn table_exists(client: &Client, table: &str) -> Result<bool> {
    let row = client
        .query_one("SELECT to_regclass($1)::text", &[&table])
        .await
        .map_err(|e| classify("failed to check table existence", e))?;
    let name: Option<String> = row.get(0);
    Ok(name.is_some())
}

// --- SQL builders -----------------------------------------------------------
//
// Pure string builders so the diff and apply statements can be pinned by
// unit tests without a live server.

fn join_condition(ds: Dataset, left: &str, right: &str) -> String {
    ds.business_key()
        .iter()
        .map(|k| format!("{left}.{k} = {right}.{k}"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

/// MD5 over the data columns. `raw_record` stays out of the hash: formatting
/// drift in the source line alone does not warrant an update.
fn row_hash(ds: Dataset, alias: &str) -> String {
    let cols = ds
        .columns()
        .iter()
        .map(|c| format!("{alias}.{}", c.name))
        .collect::<Vec<_>>()
        .join(", ");
    format!("MD5(ROW({})::text)", cols)
}

fn data_columns(ds: Dataset) -> String {
    let mut cols: Vec<&str> = ds.columns().iter().map(|c| c.name).collect();
    cols.push("raw_record");
    cols.join(", ")
}

pub(crate) fn duplicate_keys_sql(ds: Dataset) -> String {
    let bk = ds.business_key().join(", ");
    format!(
        "SELECT {bk}, COUNT(*) FROM {staging} \
         GROUP BY {bk} HAVING COUNT(*) > 1 ORDER BY {bk} LIMIT {limit}",
        bk = bk,
        staging = ds.staging_table(),
        limit = DUPLICATE_KEY_SAMPLE
    )
}

pub(crate) fn cdc_deletes_sql(ds: Dataset) -> String {
    format!(
        "INSERT INTO {deletes} (id) \
         SELECT p.id FROM {prod} p LEFT JOIN {staging} s ON {join} \
         WHERE s.{bk0} IS NULL AND p.is_active = TRUE",
        deletes = ds.cdc_deletes_table(),
        prod = ds.production_table(),
        staging = ds.staging_table(),
        join = join_condition(ds, "p", "s"),
        bk0 = ds.business_key()[0]
    )
}

pub(crate) fn cdc_updates_sql(ds: Dataset) -> String {
    format!(
        "INSERT INTO {updates} \
         SELECT s.* FROM {staging} s JOIN {prod} p ON {join} \
         WHERE (p.is_active = TRUE AND {s_hash} <> {p_hash}) OR p.is_active = FALSE",
        updates = ds.cdc_updates_table(),
        staging = ds.staging_table(),
        prod = ds.production_table(),
        join = join_condition(ds, "s", "p"),
        s_hash = row_hash(ds, "s"),
        p_hash = row_hash(ds, "p")
    )
}

pub(crate) fn cdc_inserts_sql(ds: Dataset) -> String {
    format!(
        "INSERT INTO {inserts} \
         SELECT s.* FROM {staging} s LEFT JOIN {prod} p ON {join} \
         WHERE p.id IS NULL",
        inserts = ds.cdc_inserts_table(),
        staging = ds.staging_table(),
        prod = ds.production_table(),
        join = join_condition(ds, "s", "p")
    )
}

pub(crate) fn full_insert_sql(ds: Dataset) -> String {
    let cols = data_columns(ds);
    format!(
        "INSERT INTO {prod}_new ({cols}) SELECT {cols} FROM {staging}",
        prod = ds.production_table(),
        cols = cols,
        staging = ds.staging_table()
    )
}

pub(crate) fn delta_delete_sql(ds: Dataset) -> String {
    format!(
        "UPDATE {prod} SET is_active = FALSE, last_updated_at = NOW() \
         WHERE id IN (SELECT id FROM {deletes})",
        prod = ds.production_table(),
        deletes = ds.cdc_deletes_table()
    )
}

pub(crate) fn delta_update_sql(ds: Dataset) -> String {
    // business-key columns are equal on both sides by the join; updating a
    // row always reactivates it
    let mut set_parts: Vec<String> = ds
        .columns()
        .iter()
        .filter(|c| !c.business_key)
        .map(|c| format!("{0} = s.{0}", c.name))
        .collect();
    set_parts.push("raw_record = s.raw_record".to_string());
    set_parts.push("is_active = TRUE".to_string());
    set_parts.push("last_updated_at = NOW()".to_string());
    format!(
        "UPDATE {prod} p SET {set} FROM {updates} s WHERE {join}",
        prod = ds.production_table(),
        set = set_parts.join(", "),
        updates = ds.cdc_updates_table(),
        join = join_condition(ds, "p", "s")
    )
}

pub(crate) fn delta_insert_sql(ds: Dataset) -> String {
    let cols = data_columns(ds);
    format!(
        "INSERT INTO {prod} ({cols}) SELECT {cols} FROM {inserts}",
        prod = ds.production_table(),
        cols = cols,
        inserts = ds.cdc_inserts_table()
    )
}

// ----------------------------------------------------------------------------

impl PostgresLoader {
    pub fn new(dsn: &str, statement_timeout: Duration) -> Self {
        Self {
            dsn: dsn.to_string(),
            statement_timeout,
            client: None,
        }
    }

    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| EtlError::connection("database connection not established").into())
    }

    fn client_mut(&mut self) -> Result<&mut Client> {
        self.client
            .as_mut()
            .ok_or_else(|| EtlError::connection("database connection not established").into())
    }

    async fn apply_full(&mut self, ds: Dataset) -> Result<ChangeCounts> {
        let client = self.client_mut()?;
        let prod = ds.production_table();
        let new_table = format!("{}_new", prod);
        let backup = ds.backup_table();
        info!("Applying full load for {} with atomic swap...", prod);

        // a crashed run may have left a half-built table behind
        client
            .batch_execute(&format!("DROP TABLE IF EXISTS {} CASCADE", new_table))
            .await
            .map_err(|e| classify("failed to drop stale rebuild table", e))?;
        client
            .batch_execute(&schema::production_ddl(ds, &new_table))
            .await
            .map_err(|e| classify("failed to create rebuild table", e))?;

        let inserted = client
            .execute(&full_insert_sql(ds), &[])
            .await
            .map_err(|e| classify("failed to populate rebuild table", e))?;

        // indexes after the load: the bulk insert stays index-free
        for ddl in schema::production_index_ddls(ds, &new_table) {
            client
                .batch_execute(&ddl)
                .await
                .map_err(|e| classify("failed to index rebuild table", e))?;
        }

        let tx = client
            .transaction()
            .await
            .map_err(|e| classify("failed to open swap transaction", e))?;
        tx.batch_execute(&format!(
            "DROP TABLE IF EXISTS {backup} CASCADE;\n\
             ALTER TABLE IF EXISTS {prod} RENAME TO {backup};\n\
             ALTER TABLE {new_table} RENAME TO {prod}",
        ))
        .await
        .map_err(|e| classify("atomic swap failed", e))?;
        tx.commit()
            .await
            .map_err(|e| classify("failed to commit atomic swap", e))?;

        info!("Atomic swap complete for {}: {} rows", prod, inserted);
        Ok(ChangeCounts {
            inserted,
            ..ChangeCounts::default()
        })
    }

    async fn apply_delta(&mut self, ds: Dataset) -> Result<ChangeCounts> {
        let client = self.client_mut()?;
        let prod = ds.production_table();
        info!("Applying delta load for {}...", prod);

        if !table_exists(client, prod).await? {
            info!("Production table {} does not exist, creating it", prod);
            client
                .batch_execute(&schema::production_ddl(ds, prod))
                .await
                .map_err(|e| classify("failed to create production table", e))?;
            for ddl in schema::production_index_ddls(ds, prod) {
                client
                    .batch_execute(&ddl)
                    .await
                    .map_err(|e| classify("failed to index production table", e))?;
            }
        }

        let tx = client
            .transaction()
            .await
            .map_err(|e| classify("failed to open delta transaction", e))?;

        // deactivations first so unique-constraint slots are free before the
        // updates and inserts land
        let deleted = tx
            .execute(&delta_delete_sql(ds), &[])
            .await
            .map_err(|e| classify("delta soft-delete failed", e))?;
        let updated = tx
            .execute(&delta_update_sql(ds), &[])
            .await
            .map_err(|e| classify("delta update failed", e))?;
        let inserted = tx
            .execute(&delta_insert_sql(ds), &[])
            .await
            .map_err(|e| classify("delta insert failed", e))?;

        tx.commit()
            .await
            .map_err(|e| classify("failed to commit delta apply", e))?;

        info!(
            "Delta apply complete for {}: {} inserts, {} updates, {} soft deletes",
            prod, inserted, updated, deleted
        );
        Ok(ChangeCounts {
            inserted,
            updated,
            deleted,
        })
    }
}

#[async_trait]
impl Loader for PostgresLoader {
    fn name(&self) -> &'static str {
        "postgres"
    }

    async fn connect(&mut self) -> Result<()> {
        if self.client.is_some() {
            return Ok(());
        }
        info!("Connecting to PostgreSQL...");
        let (client, connection) = tokio_postgres::connect(&self.dsn, NoTls)
            .await
            .map_err(|e| EtlError::connection_with_cause("failed to connect to PostgreSQL", e))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                error!("postgres connection error: {}", e);
            }
        });

        let row = client
            .query_one("SELECT pg_try_advisory_lock($1)", &[&ADVISORY_LOCK_KEY])
            .await
            .map_err(|e| classify("failed to acquire the loader lock", e))?;
        let locked: bool = row.get(0);
        if !locked {
            return Err(EtlError::connection(
                "another loader run is active against this target (advisory lock held)",
            )
            .into());
        }

        let timeout_ms = self.statement_timeout.as_millis();
        if timeout_ms > 0 {
            client
                .batch_execute(&format!("SET statement_timeout = {}", timeout_ms))
                .await
                .map_err(|e| classify("failed to set statement timeout", e))?;
        }

        client
            .batch_execute(schema::ETL_AUDIT_LOG_DDL)
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to initialize etl_audit_log", e))?;
        client
            .batch_execute(schema::ETL_RUN_DETAILS_DDL)
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to initialize etl_run_details", e))?;
        client
            .batch_execute(schema::ETL_RUN_DETAILS_INDEX_DDL)
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to index etl_run_details", e))?;

        self.client = Some(client);
        info!("Connection established");
        Ok(())
    }

    async fn initialize_staging(&mut self, datasets: &[Dataset]) -> Result<()> {
        let client = self.client()?;
        for ds in datasets {
            debug!("Initializing staging table {}", ds.staging_table());
            client
                .batch_execute(&format!(
                    "DROP TABLE IF EXISTS {} CASCADE",
                    ds.staging_table()
                ))
                .await
                .map_err(|e| classify("failed to drop staging table", e))?;
            client
                .batch_execute(&schema::staging_ddl(*ds))
                .await
                .map_err(|e| classify("failed to create staging table", e))?;
        }
        Ok(())
    }

    async fn bulk_load(
        &mut self,
        dataset: Dataset,
        mut rows: mpsc::Receiver<Result<Bytes>>,
    ) -> Result<LoadReport> {
        let client = self.client_mut()?;
        let staging = dataset.staging_table();
        info!("Bulk loading into {}...", staging);

        let tx = client
            .transaction()
            .await
            .map_err(|e| classify("failed to open bulk-load transaction", e))?;
        let copy_sql = format!(
            "COPY {} FROM STDIN WITH (FORMAT text, DELIMITER E'\\t', NULL E'\\\\N', ENCODING 'UTF8')",
            staging
        );
        let sink: CopyInSink<Bytes> = tx
            .copy_in(&copy_sql)
            .await
            .map_err(|e| classify("COPY failed to start", e))?;
        futures::pin_mut!(sink);

        let mut bytes_total: u64 = 0;
        while let Some(chunk) = rows.recv().await {
            // an Err here aborts the COPY; dropping the transaction rolls
            // the partial load back
            let chunk = chunk.context("record stream failed during bulk load")?;
            bytes_total += chunk.len() as u64;
            sink.send(chunk)
                .await
                .map_err(|e| classify("COPY write failed", e))?;
        }
        let rows_loaded = sink
            .finish()
            .await
            .map_err(|e| classify("COPY failed", e))?;
        tx.commit()
            .await
            .map_err(|e| classify("failed to commit bulk load", e))?;

        info!(
            "Bulk load into {} complete: {} rows, {} bytes",
            staging, rows_loaded, bytes_total
        );
        Ok(LoadReport {
            rows: rows_loaded,
            bytes: bytes_total,
        })
    }

    async fn execute_cdc(&mut self, dataset: Dataset) -> Result<ChangeCounts> {
        let client = self.client()?;
        let bk = dataset.business_key();
        info!(
            "Executing CDC for {} using key ({})...",
            dataset,
            bk.join(", ")
        );

        // duplicate business keys would make the diff ambiguous and break
        // production uniqueness
        let dup_rows = client
            .query(&duplicate_keys_sql(dataset), &[])
            .await
            .map_err(|e| classify("duplicate-key check failed", e))?;
        if !dup_rows.is_empty() {
            let keys: Vec<String> = dup_rows
                .iter()
                .map(|row| {
                    (0..bk.len())
                        .map(|i| row.get::<_, String>(i))
                        .collect::<Vec<_>>()
                        .join("|")
                })
                .collect();
            return Err(EtlError::data_with_keys(
                format!("duplicate business keys in {}", dataset.staging_table()),
                keys,
            )
            .into());
        }

        client
            .batch_execute(&format!(
                "DROP TABLE IF EXISTS {ins};\n\
                 DROP TABLE IF EXISTS {upd};\n\
                 DROP TABLE IF EXISTS {del};\n\
                 CREATE UNLOGGED TABLE {ins} (LIKE {staging} INCLUDING DEFAULTS);\n\
                 CREATE UNLOGGED TABLE {upd} (LIKE {staging} INCLUDING DEFAULTS);\n\
                 CREATE UNLOGGED TABLE {del} (id BIGINT)",
                ins = dataset.cdc_inserts_table(),
                upd = dataset.cdc_updates_table(),
                del = dataset.cdc_deletes_table(),
                staging = dataset.staging_table()
            ))
            .await
            .map_err(|e| classify("failed to prepare cdc tables", e))?;

        let counts = if table_exists(client, dataset.production_table()).await? {
            let deleted = client
                .execute(&cdc_deletes_sql(dataset), &[])
                .await
                .map_err(|e| classify("cdc delete scan failed", e))?;
            let updated = client
                .execute(&cdc_updates_sql(dataset), &[])
                .await
                .map_err(|e| classify("cdc update scan failed", e))?;
            let inserted = client
                .execute(&cdc_inserts_sql(dataset), &[])
                .await
                .map_err(|e| classify("cdc insert scan failed", e))?;
            ChangeCounts {
                inserted,
                updated,
                deleted,
            }
        } else {
            info!(
                "Production table {} does not exist; treating the whole snapshot as inserts",
                dataset.production_table()
            );
            let inserted = client
                .execute(
                    &format!(
                        "INSERT INTO {} SELECT s.* FROM {} s",
                        dataset.cdc_inserts_table(),
                        dataset.staging_table()
                    ),
                    &[],
                )
                .await
                .map_err(|e| classify("cdc insert scan failed", e))?;
            ChangeCounts {
                inserted,
                ..ChangeCounts::default()
            }
        };

        info!(
            "CDC complete for {}: {} inserts, {} updates, {} deletes",
            dataset, counts.inserted, counts.updated, counts.deleted
        );
        Ok(counts)
    }

    async fn apply_changes(&mut self, dataset: Dataset, mode: LoadMode) -> Result<ChangeCounts> {
        match mode {
            LoadMode::Full => self.apply_full(dataset).await,
            LoadMode::Delta => self.apply_delta(dataset).await,
        }
    }

    async fn cleanup(&mut self) -> Result<()> {
        let client = self.client()?;
        info!("Dropping per-run staging and cdc tables");
        for ds in Dataset::ALL {
            client
                .batch_execute(&format!(
                    "DROP TABLE IF EXISTS {staging} CASCADE;\n\
                     DROP TABLE IF EXISTS {ins};\n\
                     DROP TABLE IF EXISTS {upd};\n\
                     DROP TABLE IF EXISTS {del}",
                    staging = ds.staging_table(),
                    ins = ds.cdc_inserts_table(),
                    upd = ds.cdc_updates_table(),
                    del = ds.cdc_deletes_table()
                ))
                .await
                .map_err(|e| classify("cleanup failed", e))?;
        }
        // the <prod>_backup tables stay for one generation; the next full
        // load's swap drops them
        Ok(())
    }

    async fn log_run_start(&mut self, run: &RunInfo) -> Result<i64> {
        let client = self.client()?;
        let started_at = Utc::now();
        let mode = run.mode.to_string();
        let status = RunStatus::Running.to_string();
        let row = client
            .query_one(
                "INSERT INTO etl_audit_log \
                 (run_id, package_version, started_at, mode, status, source_files) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING log_id",
                &[
                    &run.run_id,
                    &run.package_version,
                    &started_at,
                    &mode,
                    &status,
                    &run.source_files,
                ],
            )
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to record run start", e))?;
        let log_id: i64 = row.get(0);
        info!("ETL run recorded, log_id={}", log_id);
        Ok(log_id)
    }

    async fn log_run_detail(&mut self, log_id: i64, detail: &RunDetail) -> Result<()> {
        let client = self.client()?;
        client
            .execute(
                "INSERT INTO etl_run_details \
                 (log_id, dataset, rows_read, rows_inserted, rows_updated, rows_deleted, \
                  bytes_loaded, duration_ms) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
                &[
                    &log_id,
                    &detail.dataset.as_str(),
                    &(detail.rows_read as i64),
                    &(detail.counts.inserted as i64),
                    &(detail.counts.updated as i64),
                    &(detail.counts.deleted as i64),
                    &(detail.bytes_loaded as i64),
                    &(detail.duration_ms as i64),
                ],
            )
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to record run detail", e))?;
        debug!("Recorded run detail for {}", detail.dataset);
        Ok(())
    }

    async fn log_run_finish(
        &mut self,
        log_id: i64,
        status: RunStatus,
        error_message: Option<&str>,
    ) -> Result<()> {
        let client = self.client()?;
        let finished_at = Utc::now();
        let status_text = status.to_string();
        client
            .execute(
                "UPDATE etl_audit_log \
                 SET finished_at = $1, status = $2, error_message = $3 \
                 WHERE log_id = $4",
                &[&finished_at, &status_text, &error_message, &log_id],
            )
            .await
            .map_err(|e| EtlError::audit_with_cause("failed to record run finish", e))?;
        info!("ETL run finished, log_id={}, status={}", log_id, status);
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // dropping the session releases the advisory lock and aborts any
        // open transaction
        if self.client.take().is_some() {
            info!("Database connection closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_keys_sql_samples_staging() {
        let sql = duplicate_keys_sql(Dataset::Definitions);
        assert_eq!(
            sql,
            "SELECT cui, source, COUNT(*) FROM staging_definitions \
             GROUP BY cui, source HAVING COUNT(*) > 1 ORDER BY cui, source LIMIT 5"
        );
    }

    #[test]
    fn test_cdc_deletes_only_active_rows() {
        let sql = cdc_deletes_sql(Dataset::Concepts);
        assert!(sql.contains("INSERT INTO cdc_deletes_concepts (id)"));
        assert!(sql.contains("LEFT JOIN staging_concepts s ON p.cui = s.cui"));
        assert!(sql.contains("WHERE s.cui IS NULL AND p.is_active = TRUE"));
    }

    #[test]
    fn test_cdc_updates_hash_excludes_raw_record() {
        let sql = cdc_updates_sql(Dataset::Concepts);
        assert!(sql.contains("MD5(ROW(s.cui, s.preferred_name, s.definition)::text)"));
        assert!(sql.contains("MD5(ROW(p.cui, p.preferred_name, p.definition)::text)"));
        assert!(!sql.contains("raw_record"));
    }

    #[test]
    fn test_cdc_updates_include_reactivations() {
        let sql = cdc_updates_sql(Dataset::Names);
        assert!(sql.contains("OR p.is_active = FALSE"));
    }

    #[test]
    fn test_cdc_inserts_ignore_soft_deleted_matches() {
        // a row whose bk exists in production (active or not) is never an
        // insert
        let sql = cdc_inserts_sql(Dataset::SourceLinks);
        assert!(sql.contains("WHERE p.id IS NULL"));
        assert!(!sql.contains("is_active"));
    }

    #[test]
    fn test_multi_column_join_condition() {
        let sql = cdc_deletes_sql(Dataset::Relationships);
        assert!(sql.contains(
            "p.cui1 = s.cui1 AND p.relationship = s.relationship \
             AND p.cui2 = s.cui2 AND p.source = s.source"
        ));
    }

    #[test]
    fn test_full_insert_targets_rebuild_table() {
        let sql = full_insert_sql(Dataset::Concepts);
        assert_eq!(
            sql,
            "INSERT INTO concepts_new (cui, preferred_name, definition, raw_record) \
             SELECT cui, preferred_name, definition, raw_record FROM staging_concepts"
        );
    }

    #[test]
    fn test_delta_delete_is_a_soft_delete() {
        let sql = delta_delete_sql(Dataset::SemanticTypes);
        assert!(sql.starts_with("UPDATE semantic_types SET is_active = FALSE"));
        assert!(sql.contains("last_updated_at = NOW()"));
        assert!(sql.contains("(SELECT id FROM cdc_deletes_semantic_types)"));
    }

    #[test]
    fn test_delta_update_reactivates_and_skips_business_key() {
        let sql = delta_update_sql(Dataset::Names);
        assert!(sql.contains("suppressed = s.suppressed"));
        assert!(sql.contains("raw_record = s.raw_record"));
        assert!(sql.contains("is_active = TRUE"));
        // bk columns are not reassigned
        assert!(!sql.contains("cui = s.cui,"));
        assert!(!sql.contains("name = s.name,"));
    }

    #[test]
    fn test_delta_insert_omits_surrogate_and_lifecycle_columns() {
        let sql = delta_insert_sql(Dataset::Definitions);
        assert_eq!(
            sql,
            "INSERT INTO definitions (cui, definition, source, suppressed, raw_record) \
             SELECT cui, definition, source, suppressed, raw_record FROM cdc_inserts_definitions"
        );
    }

    #[test]
    fn test_classify_maps_canceled_to_timeout() {
        // only the shape of the mapping is testable without a server; the
        // SqlState constant itself is pinned here
        assert_eq!(SqlState::QUERY_CANCELED.code(), "57014");
    }
}
