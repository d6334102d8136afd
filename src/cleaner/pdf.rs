//! Limpieza de PDFs mediante el vaciado del diccionario Info.

use lopdf::{Dictionary, Document, Object};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::debug;

use super::constants::DOCUMENT_INFO_KEYS;

/// Motivo por el que un PDF se devuelve sin modificar.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedReason {
    /// No se pudo interpretar el documento.
    Unreadable,
    /// El documento exige una contraseña de usuario.
    Encrypted,
    /// Se cargó, pero no se pudo volver a serializar.
    Unsavable,
}

impl ProtectedReason {
    pub fn description(self) -> &'static str {
        match self {
            ProtectedReason::Unreadable => "el PDF no se pudo leer",
            ProtectedReason::Encrypted => "el PDF está protegido con contraseña",
            ProtectedReason::Unsavable => "el PDF no se pudo guardar tras limpiarlo",
        }
    }
}

/// Valores de los seis campos conocidos del diccionario Info.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DocumentInfo {
    fields: Vec<(&'static [u8], String)>,
}

impl DocumentInfo {
    pub fn get(&self, key: &[u8]) -> Option<&str> {
        self.fields
            .iter()
            .find(|(known, _)| *known == key)
            .map(|(_, value)| value.as_str())
    }

    /// Campos presentes con un valor no vacío.
    pub fn populated_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .count()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.fields.iter().map(|(key, value)| {
            (
                std::str::from_utf8(key).unwrap_or_default(),
                value.as_str(),
            )
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PdfCleanOutcome {
    Cleaned { bytes: Vec<u8>, metadata_count: usize },
    Protected(ProtectedReason),
}

/// Lee el diccionario Info sin modificar el documento.
pub fn read_document_info(bytes: &[u8]) -> Result<DocumentInfo, lopdf::Error> {
    let mut doc = Document::load_mem(bytes)?;
    if doc.is_encrypted() {
        doc.decrypt("")?;
    }
    Ok(document_info(&doc))
}

/// Cuenta y vacía los campos del diccionario Info y vuelve a serializar el PDF.
///
/// Los documentos cifrados se abren con la contraseña de usuario vacía, como
/// hacen los visores con los PDF que solo restringen permisos.
pub fn clean_pdf(bytes: &[u8]) -> PdfCleanOutcome {
    let mut cleaned = Vec::new();
    match clean_pdf_into(bytes, &mut cleaned) {
        Ok(metadata_count) => PdfCleanOutcome::Cleaned {
            bytes: cleaned,
            metadata_count,
        },
        Err(reason) => PdfCleanOutcome::Protected(reason),
    }
}

fn clean_pdf_into<W: Write>(bytes: &[u8], target: &mut W) -> Result<usize, ProtectedReason> {
    let mut doc = Document::load_mem(bytes).map_err(|error| {
        debug!(%error, "PDF ilegible");
        ProtectedReason::Unreadable
    })?;

    if doc.is_encrypted() {
        doc.decrypt("").map_err(|error| {
            debug!(%error, "PDF cifrado con contraseña");
            ProtectedReason::Encrypted
        })?;
    }

    let metadata_count = document_info(&doc).populated_count();

    if let Some(info) = info_dictionary_mut(&mut doc) {
        for key in DOCUMENT_INFO_KEYS {
            info.set(key, Object::string_literal(""));
        }
    }

    doc.save_to(target).map_err(|error| {
        debug!(%error, "no se pudo serializar el PDF limpio");
        ProtectedReason::Unsavable
    })?;

    Ok(metadata_count)
}

fn document_info(doc: &Document) -> DocumentInfo {
    let Some(dict) = info_dictionary(doc) else {
        return DocumentInfo::default();
    };

    let fields = DOCUMENT_INFO_KEYS
        .iter()
        .filter_map(|key| {
            let value = dict.get(key).ok().and_then(|obj| object_to_string(doc, obj))?;
            Some((*key, value))
        })
        .collect();

    DocumentInfo { fields }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_dictionary_mut(doc: &mut Document) -> Option<&mut Dictionary> {
    match doc.trailer.get(b"Info").ok()?.clone() {
        Object::Reference(reference) => doc.get_object_mut(reference).ok()?.as_dict_mut().ok(),
        Object::Dictionary(_) => doc.trailer.get_mut(b"Info").ok()?.as_dict_mut().ok(),
        _ => None,
    }
}

fn object_to_string(doc: &Document, obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_text_string(bytes)),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .ok()
            .and_then(|inner| object_to_string(doc, inner)),
        _ => None,
    }
}

/// Decodifica una cadena de texto PDF (UTF-16BE con BOM, UTF-8 con BOM o
/// PDFDocEncoding, tratada como Latin-1).
fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }

    bytes.iter().map(|&byte| char::from(byte)).collect()
}
