use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::error::{ErrorKind, IngestError};
use crate::model::{
    DirectoryReport, DirectoryStatus, FileReport, FileStatus, IngestReport, IngestSummary,
    UploadRequest,
};
use crate::util::{now_utc_string, sha256_file, utc_compact_string};

use super::identity::{FileIdentity, extract_identity};
use super::router::{Route, route_for};
use super::store::{self, DB_SCHEMA_VERSION};

#[derive(Debug)]
pub(crate) struct FileOutcome {
    pub owner_id: String,
    pub records_inserted: usize,
}

/// Runs one upload request to completion. Failures never escape: each is
/// recorded against the directory or file that caused it.
pub(crate) fn ingest(request: &UploadRequest, connection: &mut Connection) -> IngestReport {
    let started_ts = Utc::now();
    let mut report = IngestReport {
        run_id: format!("run-{}", utc_compact_string(started_ts)),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        started_at: now_utc_string(),
        finished_at: String::new(),
        directories: Vec::new(),
        files: Vec::new(),
        summary: IngestSummary::default(),
    };

    for (purpose, directory) in &request.selected_directories {
        ingest_directory(connection, purpose, directory, &mut report);
    }

    report.finished_at = now_utc_string();
    report.summarize();

    info!(
        run_id = %report.run_id,
        succeeded = report.summary.files_succeeded,
        skipped = report.summary.files_skipped,
        failed = report.summary.files_failed,
        directories_failed = report.summary.directories_failed,
        records = report.summary.records_inserted,
        "ingest request finished"
    );

    report
}

fn ingest_directory(
    connection: &mut Connection,
    purpose: &str,
    directory: &Path,
    report: &mut IngestReport,
) {
    let mut directory_report = DirectoryReport {
        purpose: purpose.to_string(),
        directory: directory.display().to_string(),
        status: DirectoryStatus::Processed,
        file_count: 0,
        error: None,
    };

    let Some(route) = route_for(purpose) else {
        warn!(purpose, directory = %directory.display(), "unknown purpose; skipping directory");
        directory_report.status = DirectoryStatus::UnknownPurpose;
        report.directories.push(directory_report);
        return;
    };

    if !directory.is_dir() {
        let err = IngestError::DirectoryNotFound(directory.to_path_buf());
        warn!(purpose, error = %err, "skipping directory");
        directory_report.status = DirectoryStatus::DirectoryNotFound;
        directory_report.error = Some(err.to_string());
        report.directories.push(directory_report);
        return;
    }

    if route.is_passthrough() {
        info!(
            purpose,
            directory = %directory.display(),
            "purpose has no loader yet; passing through"
        );
        directory_report.status = DirectoryStatus::Passthrough;
        report.directories.push(directory_report);
        return;
    }

    let files = match route.list_files(directory) {
        Ok(files) => files,
        Err(err) => {
            warn!(purpose, error = %err, "failed to list directory");
            directory_report.status = DirectoryStatus::Unreadable;
            directory_report.error = Some(err.to_string());
            report.directories.push(directory_report);
            return;
        }
    };

    info!(
        purpose,
        directory = %directory.display(),
        files = files.len(),
        "processing directory"
    );
    directory_report.file_count = files.len();
    report.directories.push(directory_report);

    for path in files {
        report.files.push(ingest_file(connection, route, &path));
    }
}

fn ingest_file(connection: &mut Connection, route: &Route, path: &Path) -> FileReport {
    let mut file_report = FileReport {
        purpose: route.label.to_string(),
        path: path.display().to_string(),
        status: FileStatus::Succeeded,
        error_kind: None,
        error: None,
        owner_id: None,
        records_inserted: 0,
        sha256: None,
    };

    match persist_file(connection, route, path) {
        Ok(outcome) => {
            info!(
                path = %path.display(),
                owner = %outcome.owner_id,
                records = outcome.records_inserted,
                "ingested file"
            );
            file_report.owner_id = Some(outcome.owner_id);
            file_report.records_inserted = outcome.records_inserted;
            match sha256_file(path) {
                Ok(hash) => file_report.sha256 = Some(hash),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "failed to hash ingested file")
                }
            }
        }
        Err(err) => {
            let kind = err.kind();
            warn!(path = %path.display(), kind = kind.as_str(), error = %err, "file not ingested");
            file_report.status = match kind {
                ErrorKind::MalformedFilename => FileStatus::Skipped,
                _ => FileStatus::Failed,
            };
            file_report.error_kind = Some(kind);
            file_report.error = Some(err.to_string());
        }
    }

    file_report
}

/// Identity → ensure material/part → parse → insert, as one transaction.
/// Any error drops the transaction, rolling back everything this file wrote.
pub(crate) fn persist_file(
    connection: &mut Connection,
    route: &Route,
    path: &Path,
) -> Result<FileOutcome, IngestError> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let identity = extract_identity(&stem, route.identity_scope())?;
    let mut owner_id = identity.owner_id().to_string();

    let Some(parser) = route.parser_for(&stem) else {
        return Ok(FileOutcome {
            owner_id,
            records_inserted: 0,
        });
    };

    let tx = connection.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let material = identity.material();
    store::ensure_material(&tx, &material.material_id, &material.vendor)?;
    if let FileIdentity::Part(part) = &identity {
        store::ensure_part(
            &tx,
            &part.part_id,
            &material.material_id,
            &material.vendor,
            &part.part_type,
        )?;
        owner_id = store::stored_part_id(&tx, &part.part_id)?;
    }

    let table = parser.table();
    let records = parser.parse(path)?;
    let records_inserted = store::insert_measurements(&tx, table, &owner_id, &records)?;

    tx.commit()?;
    debug!(table = table.as_str(), owner = %owner_id, records_inserted, "committed file");

    Ok(FileOutcome {
        owner_id,
        records_inserted,
    })
}
