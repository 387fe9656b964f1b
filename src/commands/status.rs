use std::fs;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::{StatusArgs, resolve_db_path};
use crate::commands::ingest::store::{schema_version, table_counts};
use crate::model::IngestRunSnapshot;
use crate::util::latest_json_with_prefix;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.data_root.join("manifests");
    let db_path = resolve_db_path(&args.data_root, args.db_path.as_ref());

    info!(data_root = %args.data_root.display(), "status requested");

    match latest_json_with_prefix(&manifest_dir, "ingest_run_")? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let snapshot: IngestRunSnapshot = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                path = %path.display(),
                run_id = %snapshot.run_id,
                finished_at = %snapshot.finished_at,
                files_succeeded = snapshot.summary.files_succeeded,
                files_skipped = snapshot.summary.files_skipped,
                files_failed = snapshot.summary.files_failed,
                directories_failed = snapshot.summary.directories_failed,
                records_inserted = snapshot.summary.records_inserted,
                "latest ingest run"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifests found"),
    }

    if !db_path.exists() {
        warn!(path = %db_path.display(), "database file missing");
        return Ok(());
    }

    let connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    let recorded_version = match schema_version(&connection) {
        Ok(Some(version)) => version,
        Ok(None) => {
            warn!(path = %db_path.display(), "schema version not recorded");
            String::new()
        }
        Err(err) => {
            warn!(error = %err, "failed to read schema version");
            String::new()
        }
    };

    match table_counts(&connection) {
        Ok(counts) => {
            for (table, rows) in counts {
                info!(table, rows, "table");
            }
        }
        Err(err) => warn!(error = %err, "database has not been initialized by an ingest run"),
    }
    info!(path = %db_path.display(), schema_version = %recorded_version, "database status");

    Ok(())
}
