use std::{io, path::PathBuf};

use charming::EchartsError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("report file does not exist: {}", .0.display())]
    MissingReport(PathBuf),
    #[error("report {} is missing required column {column:?}", .path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("report {} lists collection {collection:?} more than once", .path.display())]
    DuplicateCollection { path: PathBuf, collection: String },
    #[error("report {} is malformed: {detail}", .path.display())]
    MalformedReport { path: PathBuf, detail: String },
    #[error("no reports to merge")]
    NoReports,
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("chart rendering failed: {0}")]
    Chart(#[from] EchartsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}
