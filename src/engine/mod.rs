// Copyright 2025
// Licensed under the Elastic License v2.0

//! The run orchestrator.
//!
//! One run = one `run_id`: connect, record the start, walk the datasets in
//! dependency order (stage → diff → apply → detail), clean up, record the
//! terminal status, close. Any failure short-circuits to a handler that
//! closes the possibly-poisoned session and writes the `Failed` audit row
//! over a fresh connection before propagating.

use std::path::Path;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::datasets::Dataset;
use crate::encode;
use crate::fetch;
use crate::loader::{create_loader, LoadMode, LoadReport, Loader, RunDetail, RunInfo, RunStatus};

pub struct Engine {
    config: Config,
}

/// What a successful run did, for the stdout summary.
pub struct RunSummary {
    pub run_id: Uuid,
    pub details: Vec<RunDetail>,
    pub wall: Duration,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    pub async fn run(self) -> Result<RunSummary> {
        let started = Instant::now();
        let run_id = Uuid::new_v4();
        info!("Starting MedGen ETL run {} (mode: {})", run_id, self.config.mode);

        let mut loader = create_loader(&self.config.db_dsn, self.config.statement_timeout())?;
        loader.connect().await?;

        let run = RunInfo {
            run_id,
            package_version: env!("CARGO_PKG_VERSION").to_string(),
            mode: self.config.mode,
            source_files: self.source_manifest(),
        };
        let log_id = loader.log_run_start(&run).await?;

        match self.process_datasets(loader.as_mut(), log_id).await {
            Ok(details) => {
                // the terminal status is decided; an audit failure from here
                // on is logged, never promoted
                if let Err(e) = loader
                    .log_run_finish(log_id, RunStatus::Success, None)
                    .await
                {
                    error!("audit finish write failed: {:#}", e);
                }
                let _ = loader.close().await;
                let wall = started.elapsed();
                info!(
                    "ETL run {} finished successfully in {:.1}s",
                    run_id,
                    wall.as_secs_f64()
                );
                Ok(RunSummary {
                    run_id,
                    details,
                    wall,
                })
            }
            Err(e) => {
                error!("ETL run {} failed: {:#}", run_id, e);
                // the session may be mid-transaction or gone; closing it
                // also frees the advisory lock for the audit connection
                let _ = loader.close().await;
                self.record_failure(log_id, &e).await;
                Err(e)
            }
        }
    }

    async fn process_datasets(
        &self,
        loader: &mut dyn Loader,
        log_id: i64,
    ) -> Result<Vec<RunDetail>> {
        let mut details = Vec::with_capacity(Dataset::ALL.len());
        for ds in Dataset::ALL {
            let started = Instant::now();
            info!("--- {} <- {} ---", ds, ds.source_file());

            let path = fetch::resolve(&self.config.download_dir, ds)?;
            loader.initialize_staging(&[ds]).await?;
            let report = self.stage_dataset(loader, ds, &path).await?;

            let counts = match self.config.mode {
                LoadMode::Full => loader.apply_changes(ds, LoadMode::Full).await?,
                LoadMode::Delta => {
                    let cdc = loader.execute_cdc(ds).await?;
                    debug!(
                        "{} change set: {} inserts, {} updates, {} deletes",
                        ds, cdc.inserted, cdc.updated, cdc.deleted
                    );
                    loader.apply_changes(ds, LoadMode::Delta).await?
                }
            };

            let detail = RunDetail {
                dataset: ds,
                rows_read: report.rows,
                counts,
                bytes_loaded: report.bytes,
                duration_ms: started.elapsed().as_millis() as u64,
            };
            if let Err(e) = loader.log_run_detail(log_id, &detail).await {
                error!("audit detail write failed for {}: {:#}", ds, e);
            }
            details.push(detail);
        }
        loader.cleanup().await?;
        Ok(details)
    }

    /// Producer/consumer bulk load: parsing and encoding run on a blocking
    /// thread, the COPY writer consumes a bounded channel. The producer is
    /// joined before its result is read so a parse failure surfaces as the
    /// root cause rather than as the aborted COPY.
    async fn stage_dataset(
        &self,
        loader: &mut dyn Loader,
        ds: Dataset,
        path: &Path,
    ) -> Result<LoadReport> {
        let (tx, rx) = mpsc::channel(encode::CHANNEL_DEPTH);
        let max_errors = self.config.max_parse_errors;
        let file = path.to_path_buf();
        let producer =
            tokio::task::spawn_blocking(move || encode::stream_dataset(ds, &file, max_errors, tx));

        let load_result = loader.bulk_load(ds, rx).await;
        let produce_result = producer
            .await
            .map_err(|e| anyhow::anyhow!("record producer for {} panicked: {}", ds, e))?;
        produce_result?;
        load_result
    }

    /// Best-effort: write the terminal `Failed` row over a fresh connection.
    async fn record_failure(&self, log_id: i64, err: &anyhow::Error) {
        let detail = format!("{:?}", err);
        let outcome = async {
            let mut loader =
                create_loader(&self.config.db_dsn, self.config.statement_timeout())?;
            loader.connect().await?;
            loader
                .log_run_finish(log_id, RunStatus::Failed, Some(&detail))
                .await?;
            loader.close().await
        }
        .await;
        if let Err(audit_err) = outcome {
            // stderr directly: this is the one failure tracing must not eat
            eprintln!(
                "failed to record run failure in audit log: {:#}",
                audit_err
            );
        }
    }

    /// dataset → resolved file name, recorded with the run. Missing files
    /// are left out; the dataset loop reports them properly.
    fn source_manifest(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for ds in Dataset::ALL {
            if let Ok(path) = fetch::resolve(&self.config.download_dir, ds) {
                if let Some(name) = path.file_name() {
                    map.insert(
                        ds.to_string(),
                        serde_json::Value::String(name.to_string_lossy().into_owned()),
                    );
                }
            }
        }
        serde_json::Value::Object(map)
    }
}

/// The compact stdout summary printed after a successful run.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = format!(
        "{:<16} {:>12} {:>12} {:>12} {:>12}\n",
        "dataset", "rows_read", "inserted", "updated", "deleted"
    );
    for d in &summary.details {
        out.push_str(&format!(
            "{:<16} {:>12} {:>12} {:>12} {:>12}\n",
            d.dataset.as_str(),
            d.rows_read,
            d.counts.inserted,
            d.counts.updated,
            d.counts.deleted
        ));
    }
    out.push_str(&format!(
        "run {} completed in {:.1}s\n",
        summary.run_id,
        summary.wall.as_secs_f64()
    ));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::ChangeCounts;

    #[test]
    fn test_format_summary_lists_every_dataset_processed() {
        let summary = RunSummary {
            run_id: Uuid::nil(),
            details: vec![
                RunDetail {
                    dataset: Dataset::Concepts,
                    rows_read: 3,
                    counts: ChangeCounts {
                        inserted: 3,
                        updated: 0,
                        deleted: 0,
                    },
                    bytes_loaded: 120,
                    duration_ms: 5,
                },
                RunDetail {
                    dataset: Dataset::Names,
                    rows_read: 7,
                    counts: ChangeCounts {
                        inserted: 1,
                        updated: 2,
                        deleted: 4,
                    },
                    bytes_loaded: 300,
                    duration_ms: 9,
                },
            ],
            wall: Duration::from_millis(1500),
        };
        let text = format_summary(&summary);
        assert!(text.contains("concepts"));
        assert!(text.contains("names"));
        assert!(text.lines().last().unwrap().contains("1.5s"));
        // header + 2 datasets + footer
        assert_eq!(text.lines().count(), 4);
    }
}
