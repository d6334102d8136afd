//! Resumen JSON de un lote procesado.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch::BatchReport;
use crate::download::DownloadSummary;
use crate::status::{FileStatus, StatusCounts};
use crate::tally::Tally;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("No se pudo escribir el reporte: {0}")]
    Io(#[from] io::Error),
    #[error("No se pudo serializar el reporte: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
pub struct FileSummary {
    pub name: String,
    pub status: FileStatus,
    pub message: String,
    pub metadata_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub generated_at: DateTime<Local>,
    pub files_processed: usize,
    pub metadata_removed: usize,
    pub counts: StatusCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tally: Option<Tally>,
    pub files: Vec<FileSummary>,
}

impl BatchSummary {
    pub fn new(report: &BatchReport, downloads: Option<&DownloadSummary>, tally: Option<Tally>) -> Self {
        let files = report
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| {
                let status = record.status();
                FileSummary {
                    name: record.original_name.clone(),
                    message: status.describe(),
                    status,
                    metadata_count: record.metadata_count(),
                    output_type: record.output_content_type().map(str::to_string),
                    saved_to: downloads
                        .and_then(|downloads| downloads.saved_path(index))
                        .map(Path::to_path_buf),
                }
            })
            .collect();

        Self {
            generated_at: Local::now(),
            files_processed: report.files_processed(),
            metadata_removed: report.metadata_removed,
            counts: report.statuses.counts(),
            tally,
            files,
        }
    }

    pub fn export(&self, path: &Path) -> Result<(), ReportError> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
