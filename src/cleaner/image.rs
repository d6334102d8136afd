//! Limpieza de imágenes: conteo EXIF de mejor esfuerzo y recodificación de píxeles.

use exif::{Context, In, Tag};
use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageError, ImageReader, RgbImage,
    RgbaImage,
};
use std::collections::HashSet;
use std::io::Cursor;
use thiserror::Error;
use tracing::debug;

use super::constants::{JPEG_TYPE, PNG_TYPE};

#[derive(Debug, Error)]
pub enum ImageCleanError {
    #[error("No se pudo cargar la imagen: {0}")]
    Load(#[source] ImageError),
    #[error("No se pudo generar la imagen limpia: {0}")]
    Encode(#[source] ImageError),
    #[error("No se pudo generar la imagen limpia: el codificador no produjo datos")]
    EmptyOutput,
}

/// Etiquetas EXIF distintas encontradas en una imagen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetadataSummary {
    tags: Vec<Tag>,
    has_gps: bool,
}

impl MetadataSummary {
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// Indica si la imagen conserva coordenadas u otros datos GPS.
    pub fn has_gps(&self) -> bool {
        self.has_gps
    }
}

/// Lee las etiquetas EXIF de la imagen principal.
///
/// Devuelve `None` cuando el contenedor no tiene EXIF, no se puede leer o no
/// aporta ninguna etiqueta. Los punteros entre IFD no cuentan como metadata.
pub fn read_metadata_summary(bytes: &[u8]) -> Option<MetadataSummary> {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => exif,
        Err(error) => {
            debug!(%error, "sin EXIF legible");
            return None;
        }
    };

    let mut seen = HashSet::new();
    let mut tags = Vec::new();
    for field in exif.fields() {
        if field.ifd_num != In::PRIMARY || is_ifd_pointer(field.tag) {
            continue;
        }
        if seen.insert(field.tag) {
            tags.push(field.tag);
        }
    }

    if tags.is_empty() {
        return None;
    }

    let has_gps = tags.iter().any(|tag| tag.context() == Context::Gps);
    Some(MetadataSummary { tags, has_gps })
}

fn is_ifd_pointer(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::ExifIFDPointer | Tag::GPSInfoIFDPointer | Tag::InteropIFDPointer
    )
}

/// Superficie de píxeles RGBA de 8 bits, sin ninguna metadata asociada.
#[derive(Clone, Debug)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }
}

/// Formato de salida de la recodificación.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Jpeg { quality: u8 },
}

impl OutputFormat {
    /// PNG se conserva sin pérdida; cualquier otro tipo se normaliza a JPEG.
    pub fn for_declared_type(content_type: &str, jpeg_quality: u8) -> Self {
        if content_type == PNG_TYPE {
            OutputFormat::Png
        } else {
            OutputFormat::Jpeg {
                quality: jpeg_quality,
            }
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            OutputFormat::Png => PNG_TYPE,
            OutputFormat::Jpeg { .. } => JPEG_TYPE,
        }
    }
}

/// Decodifica la imagen en su tamaño natural, con la orientación EXIF aplicada.
pub fn decode_surface(bytes: &[u8]) -> Result<Surface, ImageCleanError> {
    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|error| ImageCleanError::Load(ImageError::IoError(error)))?;
    let mut decoder = reader.into_decoder().map_err(ImageCleanError::Load)?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder).map_err(ImageCleanError::Load)?;
    image.apply_orientation(orientation);

    Ok(Surface {
        pixels: image.to_rgba8(),
    })
}

/// Codifica la superficie. El codificador solo escribe datos de píxeles.
pub fn encode_surface(surface: &Surface, format: OutputFormat) -> Result<Vec<u8>, ImageCleanError> {
    let mut buffer = Cursor::new(Vec::new());
    let (width, height) = (surface.width(), surface.height());

    match format {
        OutputFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(surface.pixels.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(ImageCleanError::Encode)?,
        OutputFormat::Jpeg { quality } => {
            let rgb: RgbImage = surface.pixels.convert();
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .write_image(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                .map_err(ImageCleanError::Encode)?
        }
    }

    let bytes = buffer.into_inner();
    if bytes.is_empty() {
        return Err(ImageCleanError::EmptyOutput);
    }
    Ok(bytes)
}

#[derive(Clone, Debug)]
pub struct CleanedImage {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub metadata: Option<MetadataSummary>,
}

impl CleanedImage {
    pub fn metadata_count(&self) -> usize {
        self.metadata.as_ref().map_or(0, MetadataSummary::tag_count)
    }
}

/// Cuenta la metadata de la imagen y genera una copia recodificada sin ella.
pub fn clean_image(
    bytes: &[u8],
    declared_type: &str,
    jpeg_quality: u8,
) -> Result<CleanedImage, ImageCleanError> {
    let metadata = read_metadata_summary(bytes);
    let surface = decode_surface(bytes)?;
    let format = OutputFormat::for_declared_type(declared_type, jpeg_quality);
    let cleaned = encode_surface(&surface, format)?;

    debug!(
        width = surface.width(),
        height = surface.height(),
        output = format.content_type(),
        tags = metadata.as_ref().map_or(0, MetadataSummary::tag_count),
        "imagen recodificada"
    );

    Ok(CleanedImage {
        bytes: cleaned,
        content_type: format.content_type(),
        metadata,
    })
}

/// Comprueba que una imagen carece de campos EXIF residuales.
pub fn verify_image_metadata_clean(bytes: &[u8]) -> bool {
    read_metadata_summary(bytes).is_none()
}
