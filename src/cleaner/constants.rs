//! Valores compartidos por los limpiadores.

pub const PNG_TYPE: &str = "image/png";
pub const JPEG_TYPE: &str = "image/jpeg";
pub const PDF_TYPE: &str = "application/pdf";
pub const IMAGE_FAMILY_PREFIX: &str = "image/";

pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Claves del diccionario Info que se cuentan y se vacían en un PDF.
pub const DOCUMENT_INFO_KEYS: [&[u8]; 6] = [
    b"Title",
    b"Author",
    b"Subject",
    b"Keywords",
    b"Producer",
    b"Creator",
];
