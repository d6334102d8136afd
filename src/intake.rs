//! Recepción de archivos: convierte rutas en una secuencia ordenada de entradas.

use infer::Infer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("No se indicó ningún archivo")]
    Empty,
}

/// Tipos declarados por extensión, igual que lo haría un selector de archivos.
const EXTENSION_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("jfif", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("ico", "image/x-icon"),
    ("avif", "image/avif"),
    ("heic", "image/heic"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("json", "application/json"),
    ("zip", "application/zip"),
    ("docx", "application/vnd.openxmlformats-officedocument.wordprocessingml.document"),
    ("xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
    ("pptx", "application/vnd.openxmlformats-officedocument.presentationml.presentation"),
];

#[derive(Clone, Debug)]
enum FileSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

/// Archivo de entrada opaco: nombre, tipo declarado y acceso a sus bytes.
///
/// Los archivos en disco se leen al procesarlos, de modo que un archivo
/// ilegible falla solo para sí mismo y no detiene la recepción del lote.
#[derive(Clone, Debug)]
pub struct InputFile {
    name: String,
    content_type: String,
    source: FileSource,
}

impl InputFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            source: FileSource::Memory(bytes.into()),
        }
    }

    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            name,
            content_type: declared_content_type(path),
            source: FileSource::Disk(path.to_path_buf()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.source {
            FileSource::Disk(path) => Some(path),
            FileSource::Memory(_) => None,
        }
    }

    /// Devuelve el contenido completo del archivo.
    pub fn load(&self) -> io::Result<Arc<[u8]>> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(Arc::clone(bytes)),
            FileSource::Disk(path) => fs::read(path).map(Arc::from),
        }
    }
}

/// Determina el tipo declarado: primero por extensión y, si no se reconoce,
/// por inferencia sobre el contenido. Devuelve una cadena vacía si no hay tipo.
pub fn declared_content_type(path: &Path) -> String {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
        .and_then(|ext| {
            EXTENSION_TYPES
                .iter()
                .find(|(known, _)| *known == ext)
                .map(|(_, mime)| mime.to_string())
        });

    by_extension
        .or_else(|| sniff_content_type(path))
        .unwrap_or_default()
}

fn sniff_content_type(path: &Path) -> Option<String> {
    let infer = Infer::new();
    infer
        .get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}

/// Convierte las rutas indicadas en un lote ordenado.
///
/// Los archivos se conservan en el orden recibido; los directorios se
/// expanden en orden de nombre. No se deduplica ni se filtra por tipo.
pub fn collect_batch(paths: &[PathBuf]) -> Result<Vec<InputFile>, IntakeError> {
    if paths.is_empty() {
        return Err(IntakeError::Empty);
    }

    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            expand_directory(path, &mut files);
        } else {
            files.push(InputFile::from_path(path));
        }
    }

    debug!(total = files.len(), "lote recibido");
    Ok(files)
}

fn expand_directory(root: &Path, files: &mut Vec<InputFile>) {
    let walker = WalkDir::new(root).sort_by_file_name();
    for entry in walker {
        match entry {
            Ok(entry) if entry.file_type().is_file() => {
                files.push(InputFile::from_path(entry.path()));
            }
            Ok(_) => {}
            Err(error) => warn!(root = %root.display(), %error, "entrada omitida"),
        }
    }
}
