//! Estado por archivo: `Processing` pasa a exactamente un estado final.

use serde::Serialize;
use thiserror::Error;

use crate::cleaner::ProtectedReason;
use crate::record::RecordOutcome;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileStatus {
    Processing,
    Success { metadata_count: usize },
    Warning { reason: ProtectedReason },
    Error { message: String },
}

impl FileStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, FileStatus::Processing)
    }

    pub fn key(&self) -> &'static str {
        match self {
            FileStatus::Processing => "processing",
            FileStatus::Success { .. } => "success",
            FileStatus::Warning { .. } => "warning",
            FileStatus::Error { .. } => "error",
        }
    }

    /// Texto que acompaña al nombre del archivo en el listado.
    pub fn describe(&self) -> String {
        match self {
            FileStatus::Processing => "Procesando...".to_string(),
            FileStatus::Success { metadata_count } => {
                format!("{metadata_count} elementos de metadata eliminados")
            }
            FileStatus::Warning { reason } => format!(
                "PDF protegido, no se puede eliminar la metadata ({})",
                reason.description()
            ),
            FileStatus::Error { message } => format!("Error: {message}"),
        }
    }
}

impl From<&RecordOutcome> for FileStatus {
    fn from(outcome: &RecordOutcome) -> Self {
        match outcome {
            RecordOutcome::Cleaned { metadata_count, .. } => FileStatus::Success {
                metadata_count: *metadata_count,
            },
            RecordOutcome::Protected { reason, .. } => FileStatus::Warning { reason: *reason },
            RecordOutcome::Failed { message } => FileStatus::Error {
                message: message.clone(),
            },
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum StatusError {
    #[error("No existe el archivo con índice {0} en el lote")]
    UnknownEntry(usize),
    #[error("El archivo `{0}` ya tiene un estado final")]
    AlreadyFinal(String),
    #[error("`Processing` no es un estado final")]
    NotTerminal,
}

#[derive(Clone, Debug, Serialize)]
pub struct StatusEntry {
    pub name: String,
    pub status: FileStatus,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StatusCounts {
    pub processing: usize,
    pub successes: usize,
    pub warnings: usize,
    pub errors: usize,
}

/// Estados del lote en curso, en el orden de entrada.
#[derive(Clone, Debug, Default)]
pub struct StatusTracker {
    entries: Vec<StatusEntry>,
}

impl StatusTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra un archivo en `Processing` y devuelve su índice.
    pub fn begin(&mut self, name: impl Into<String>) -> usize {
        self.entries.push(StatusEntry {
            name: name.into(),
            status: FileStatus::Processing,
        });
        self.entries.len() - 1
    }

    pub fn finish(&mut self, index: usize, status: FileStatus) -> Result<(), StatusError> {
        if !status.is_terminal() {
            return Err(StatusError::NotTerminal);
        }

        let entry = self
            .entries
            .get_mut(index)
            .ok_or(StatusError::UnknownEntry(index))?;

        if entry.status.is_terminal() {
            return Err(StatusError::AlreadyFinal(entry.name.clone()));
        }

        entry.status = status;
        Ok(())
    }

    pub fn entries(&self) -> &[StatusEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for entry in &self.entries {
            match entry.status {
                FileStatus::Processing => counts.processing += 1,
                FileStatus::Success { .. } => counts.successes += 1,
                FileStatus::Warning { .. } => counts.warnings += 1,
                FileStatus::Error { .. } => counts.errors += 1,
            }
        }
        counts
    }
}
