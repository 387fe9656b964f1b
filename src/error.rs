use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

/// Failures local to one file or one directory of an ingest request.
///
/// None of these abort a run; the orchestrator records them against the file
/// or directory that produced them and moves on.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("filename '{stem}' has {found} '_'-delimited segment(s), expected at least {required}")]
    MalformedFilename {
        stem: String,
        found: usize,
        required: usize,
    },

    #[error("{path}: found {found} '{sentinel}' line(s), expected 2")]
    HeaderNotFound {
        path: PathBuf,
        sentinel: &'static str,
        found: usize,
    },

    #[error("{path}: required column '{column}' missing{}", in_sheet(.sheet))]
    RequiredColumnMissing {
        path: PathBuf,
        sheet: Option<String>,
        column: String,
    },

    #[error("directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("database write failed: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed delimited file {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("unreadable spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    #[error("invalid header pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl IngestError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedFilename { .. } => ErrorKind::MalformedFilename,
            Self::HeaderNotFound { .. } => ErrorKind::HeaderNotFound,
            Self::RequiredColumnMissing { .. } => ErrorKind::RequiredColumnMissing,
            Self::DirectoryNotFound(_) => ErrorKind::DirectoryNotFound,
            Self::Persistence(_) => ErrorKind::PersistenceError,
            Self::Io { .. }
            | Self::Csv { .. }
            | Self::Spreadsheet { .. }
            | Self::Pattern(_) => ErrorKind::ParseFailed,
        }
    }
}

fn in_sheet(sheet: &Option<String>) -> String {
    sheet
        .as_ref()
        .map(|name| format!(" in sheet '{name}'"))
        .unwrap_or_default()
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedFilename,
    HeaderNotFound,
    RequiredColumnMissing,
    DirectoryNotFound,
    PersistenceError,
    ParseFailed,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedFilename => "malformed_filename",
            Self::HeaderNotFound => "header_not_found",
            Self::RequiredColumnMissing => "required_column_missing",
            Self::DirectoryNotFound => "directory_not_found",
            Self::PersistenceError => "persistence_error",
            Self::ParseFailed => "parse_failed",
        }
    }
}
