//! Registro del resultado de cada archivo de un lote.

use std::sync::Arc;

use crate::cleaner::{CleanOutcome, ProtectedReason};
use crate::status::FileStatus;

#[derive(Clone, Debug)]
pub enum RecordOutcome {
    Cleaned {
        bytes: Arc<[u8]>,
        content_type: String,
        metadata_count: usize,
        has_gps: bool,
    },
    Protected {
        original: Arc<[u8]>,
        reason: ProtectedReason,
    },
    Failed {
        message: String,
    },
}

impl From<CleanOutcome> for RecordOutcome {
    fn from(outcome: CleanOutcome) -> Self {
        match outcome {
            CleanOutcome::Cleaned {
                bytes,
                content_type,
                metadata_count,
                summary,
            } => RecordOutcome::Cleaned {
                bytes,
                content_type,
                metadata_count,
                has_gps: summary.is_some_and(|summary| summary.has_gps()),
            },
            CleanOutcome::Protected { original, reason } => {
                RecordOutcome::Protected { original, reason }
            }
        }
    }
}

/// Resultado de procesar un archivo. Hay exactamente uno por entrada del lote.
#[derive(Clone, Debug)]
pub struct ProcessedRecord {
    pub original_name: String,
    pub outcome: RecordOutcome,
}

impl ProcessedRecord {
    pub fn new(original_name: impl Into<String>, outcome: RecordOutcome) -> Self {
        Self {
            original_name: original_name.into(),
            outcome,
        }
    }

    /// Metadata eliminada. Los archivos protegidos o fallidos cuentan cero.
    pub fn metadata_count(&self) -> usize {
        match &self.outcome {
            RecordOutcome::Cleaned { metadata_count, .. } => *metadata_count,
            RecordOutcome::Protected { .. } | RecordOutcome::Failed { .. } => 0,
        }
    }

    /// Tipo de los bytes limpios, que puede diferir del declarado (un GIF
    /// sale como JPEG).
    pub fn output_content_type(&self) -> Option<&str> {
        match &self.outcome {
            RecordOutcome::Cleaned { content_type, .. } => Some(content_type),
            RecordOutcome::Protected { .. } | RecordOutcome::Failed { .. } => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Protected { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, RecordOutcome::Failed { .. })
    }

    /// Bytes que se entregarían al guardar: la copia limpia, o el original
    /// intacto si el PDF quedó protegido.
    pub fn cleaned_bytes(&self) -> Option<&[u8]> {
        match &self.outcome {
            RecordOutcome::Cleaned { bytes, .. } => Some(&bytes[..]),
            RecordOutcome::Protected { original, .. } => Some(&original[..]),
            RecordOutcome::Failed { .. } => None,
        }
    }

    pub fn status(&self) -> FileStatus {
        FileStatus::from(&self.outcome)
    }
}
