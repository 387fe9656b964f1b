use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// Purpose label → directory, as handed over by the upload front end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UploadRequest {
    #[serde(default)]
    pub selected_directories: BTreeMap<String, PathBuf>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Succeeded,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub purpose: String,
    pub path: String,
    pub status: FileStatus,
    pub error_kind: Option<ErrorKind>,
    pub error: Option<String>,
    pub owner_id: Option<String>,
    pub records_inserted: usize,
    pub sha256: Option<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectoryStatus {
    Processed,
    DirectoryNotFound,
    Unreadable,
    UnknownPurpose,
    Passthrough,
}

#[derive(Debug, Clone, Serialize)]
pub struct DirectoryReport {
    pub purpose: String,
    pub directory: String,
    pub status: DirectoryStatus,
    pub file_count: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    pub files_succeeded: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub directories_failed: usize,
    pub records_inserted: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
    pub run_id: String,
    pub db_schema_version: String,
    pub started_at: String,
    pub finished_at: String,
    pub directories: Vec<DirectoryReport>,
    pub files: Vec<FileReport>,
    pub summary: IngestSummary,
}

impl IngestReport {
    pub fn summarize(&mut self) {
        let mut summary = IngestSummary::default();
        for file in &self.files {
            match file.status {
                FileStatus::Succeeded => summary.files_succeeded += 1,
                FileStatus::Skipped => summary.files_skipped += 1,
                FileStatus::Failed => summary.files_failed += 1,
            }
            summary.records_inserted += file.records_inserted;
        }
        summary.directories_failed = self
            .directories
            .iter()
            .filter(|dir| {
                matches!(
                    dir.status,
                    DirectoryStatus::DirectoryNotFound | DirectoryStatus::Unreadable
                )
            })
            .count();
        self.summary = summary;
    }
}

/// The slice of a written run manifest that `status` reads back.
#[derive(Debug, Clone, Deserialize)]
pub struct IngestRunSnapshot {
    pub run_id: String,
    pub finished_at: String,
    pub summary: IngestSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartRow {
    pub part_id: String,
    pub material_id: String,
    pub vendor: Option<String>,
    pub part_type: Option<String>,
}
