//! Entrega de los archivos limpios con el prefijo `clean_`.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, info};

use crate::record::{ProcessedRecord, RecordOutcome};

pub const CLEAN_PREFIX: &str = "clean_";

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("`{0}` no tiene un archivo limpio para guardar")]
    NotAvailable(String),
    #[error("No se pudo guardar `{name}`: {source}")]
    Io {
        name: String,
        #[source]
        source: io::Error,
    },
}

/// Destino que persiste bytes bajo un nombre sugerido.
pub trait SaveTarget {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Escribe cada archivo en un directorio mediante un temporal y un renombrado.
#[derive(Clone, Debug)]
pub struct DirectorySaveTarget {
    directory: PathBuf,
}

impl DirectorySaveTarget {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

impl SaveTarget for DirectorySaveTarget {
    /// Nunca sobrescribe: si el nombre ya existe se usa `nombre (1).ext`,
    /// `nombre (2).ext`, etc.
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        fs::create_dir_all(&self.directory)?;
        let destination = reserve_free_path(&self.directory, file_name)?;
        let temp_path = temp_path_for(&destination);

        let written = fs::write(&temp_path, bytes).and_then(|()| fs::rename(&temp_path, &destination));
        if let Err(error) = written {
            let _ = fs::remove_file(&temp_path);
            let _ = fs::remove_file(&destination);
            return Err(error);
        }

        Ok(destination)
    }
}

/// Crea un archivo vacío con el primer nombre libre y devuelve su ruta.
fn reserve_free_path(directory: &Path, file_name: &str) -> io::Result<PathBuf> {
    let (stem, extension) = split_extension(file_name);

    for attempt in 0_u32.. {
        let candidate = if attempt == 0 {
            file_name.to_string()
        } else {
            format!("{stem} ({attempt}){extension}")
        };
        let path = directory.join(candidate);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(error) if error.kind() == ErrorKind::AlreadyExists => continue,
            Err(error) => return Err(error),
        }
    }

    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("no hay nombres libres para `{file_name}`"),
    ))
}

/// Separa `nombre.ext` en (`nombre`, `.ext`). Un punto inicial no cuenta
/// como extensión.
fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(index) if index > 0 => file_name.split_at(index),
        _ => (file_name, ""),
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path.file_name().unwrap_or_default().to_string_lossy();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);

    parent.join(format!(".{name}_temp_{nanos}"))
}

/// Nombre de salida: el prefijo seguido del nombre original sin componentes
/// de ruta.
pub fn clean_file_name(original: &str, prefix: &str) -> String {
    let base = original
        .rsplit(['/', '\\'])
        .find(|part| !part.is_empty())
        .unwrap_or("archivo");
    format!("{prefix}{base}")
}

#[derive(Debug, Clone)]
pub struct SavedFile {
    /// Posición del registro en el lote.
    pub index: usize,
    pub original_name: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
pub struct DownloadSummary {
    pub saved: Vec<SavedFile>,
    pub skipped: Vec<String>,
}

impl DownloadSummary {
    pub fn saved_path(&self, index: usize) -> Option<&Path> {
        self.saved
            .iter()
            .find(|file| file.index == index)
            .map(|file| file.path.as_path())
    }
}

pub struct DownloadDispatcher<T> {
    target: T,
    prefix: String,
}

impl<T: SaveTarget> DownloadDispatcher<T> {
    pub fn new(target: T) -> Self {
        Self::with_prefix(target, CLEAN_PREFIX)
    }

    pub fn with_prefix(target: T, prefix: impl Into<String>) -> Self {
        Self {
            target,
            prefix: prefix.into(),
        }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    /// Guarda un registro. Los PDF protegidos se entregan sin cambios; los
    /// fallidos no tienen nada que guardar.
    pub fn download(&mut self, record: &ProcessedRecord) -> Result<PathBuf, DownloadError> {
        let bytes = match &record.outcome {
            RecordOutcome::Cleaned { bytes, .. } => bytes.clone(),
            RecordOutcome::Protected { original, .. } => original.clone(),
            RecordOutcome::Failed { .. } => {
                return Err(DownloadError::NotAvailable(record.original_name.clone()));
            }
        };

        let file_name = clean_file_name(&record.original_name, &self.prefix);
        let path = self
            .target
            .save(&file_name, &bytes)
            .map_err(|source| DownloadError::Io {
                name: record.original_name.clone(),
                source,
            })?;
        drop(bytes);

        debug!(name = %record.original_name, path = %path.display(), "archivo guardado");
        Ok(path)
    }

    /// Guarda todos los registros disponibles, en orden.
    pub fn download_all(
        &mut self,
        records: &[ProcessedRecord],
    ) -> Result<DownloadSummary, DownloadError> {
        let mut summary = DownloadSummary::default();
        for (index, record) in records.iter().enumerate() {
            if record.is_failed() {
                summary.skipped.push(record.original_name.clone());
                continue;
            }

            let path = self.download(record)?;
            summary.saved.push(SavedFile {
                index,
                original_name: record.original_name.clone(),
                path,
            });
        }

        info!(
            saved = summary.saved.len(),
            skipped = summary.skipped.len(),
            "descarga completa"
        );
        Ok(summary)
    }
}
