//! Limpieza de metadata según el tipo declarado de cada archivo.

pub mod constants;
pub mod image;
pub mod pdf;

use std::io;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::intake::InputFile;
use self::constants::{DEFAULT_JPEG_QUALITY, IMAGE_FAMILY_PREFIX, PDF_TYPE};
use self::image::{ImageCleanError, MetadataSummary, clean_image};
use self::pdf::{DocumentInfo, PdfCleanOutcome, clean_pdf, read_document_info};

pub use pdf::ProtectedReason;

#[derive(Debug, Error)]
pub enum CleanError {
    #[error("No se pudo leer el archivo: {0}")]
    Read(#[from] io::Error),
    #[error(transparent)]
    Image(#[from] ImageCleanError),
}

#[derive(Clone, Copy, Debug)]
pub struct CleanOptions {
    pub jpeg_quality: u8,
}

impl Default for CleanOptions {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// Limpiador que corresponde a un tipo declarado.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CleanerKind {
    Image,
    Pdf,
    PassThrough,
}

impl CleanerKind {
    pub fn for_content_type(content_type: &str) -> Self {
        if content_type.starts_with(IMAGE_FAMILY_PREFIX) {
            CleanerKind::Image
        } else if content_type == PDF_TYPE {
            CleanerKind::Pdf
        } else {
            CleanerKind::PassThrough
        }
    }
}

/// Resultado de limpiar un archivo que no terminó en error.
#[derive(Clone, Debug)]
pub enum CleanOutcome {
    Cleaned {
        bytes: Arc<[u8]>,
        content_type: String,
        metadata_count: usize,
        /// Solo en imágenes con EXIF legible.
        summary: Option<MetadataSummary>,
    },
    Protected {
        original: Arc<[u8]>,
        reason: ProtectedReason,
    },
}

/// Limpia un archivo. Los tipos sin limpiador se devuelven tal cual.
pub fn clean_file(input: &InputFile, options: &CleanOptions) -> Result<CleanOutcome, CleanError> {
    let bytes = input.load()?;

    let outcome = match CleanerKind::for_content_type(input.content_type()) {
        CleanerKind::Image => {
            let cleaned = clean_image(&bytes, input.content_type(), options.jpeg_quality)?;
            CleanOutcome::Cleaned {
                metadata_count: cleaned.metadata_count(),
                content_type: cleaned.content_type.to_string(),
                bytes: Arc::from(cleaned.bytes),
                summary: cleaned.metadata,
            }
        }
        CleanerKind::Pdf => match clean_pdf(&bytes) {
            PdfCleanOutcome::Cleaned {
                bytes: cleaned,
                metadata_count,
            } => CleanOutcome::Cleaned {
                bytes: Arc::from(cleaned),
                content_type: PDF_TYPE.to_string(),
                metadata_count,
                summary: None,
            },
            PdfCleanOutcome::Protected(reason) => CleanOutcome::Protected {
                original: bytes,
                reason,
            },
        },
        CleanerKind::PassThrough => CleanOutcome::Cleaned {
            bytes,
            content_type: input.content_type().to_string(),
            metadata_count: 0,
            summary: None,
        },
    };

    Ok(outcome)
}

/// Metadata presente en un archivo, leída sin modificarlo.
#[derive(Clone, Debug)]
pub enum Inspection {
    Image(Option<MetadataSummary>),
    Pdf(DocumentInfo),
    /// El PDF no se pudo cargar; la limpieza lo devolvería intacto.
    ProtectedPdf,
    Unsupported,
}

impl Inspection {
    /// Elementos que la limpieza eliminaría.
    pub fn metadata_count(&self) -> usize {
        match self {
            Inspection::Image(summary) => summary.as_ref().map_or(0, MetadataSummary::tag_count),
            Inspection::Pdf(info) => info.populated_count(),
            Inspection::ProtectedPdf | Inspection::Unsupported => 0,
        }
    }
}

pub fn inspect_file(input: &InputFile) -> Result<Inspection, CleanError> {
    let bytes = input.load()?;

    let inspection = match CleanerKind::for_content_type(input.content_type()) {
        CleanerKind::Image => Inspection::Image(self::image::read_metadata_summary(&bytes)),
        CleanerKind::Pdf => match read_document_info(&bytes) {
            Ok(info) => Inspection::Pdf(info),
            Err(error) => {
                debug!(name = input.name(), %error, "PDF ilegible al inspeccionar");
                Inspection::ProtectedPdf
            }
        },
        CleanerKind::PassThrough => Inspection::Unsupported,
    };

    Ok(inspection)
}

#[cfg(test)]
mod tests;
