//! Generación de archivos de prueba con metadata conocida.

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder};
use lopdf::encryption::{decrypt_object, get_encryption_key};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat, dictionary};
use std::io::Cursor;

fn ascii_field(tag: Tag, text: &str) -> Field {
    Field {
        tag,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![text.as_bytes().to_vec()]),
    }
}

/// Seis etiquetas distintas repartidas entre los IFD principal, Exif y GPS.
pub fn sample_exif_fields() -> Vec<Field> {
    vec![
        ascii_field(Tag::Make, "Acme"),
        ascii_field(Tag::Model, "X100"),
        ascii_field(Tag::Software, "Editor 1.0"),
        ascii_field(Tag::Artist, "Autor Prueba"),
        ascii_field(Tag::DateTimeOriginal, "2024:01:01 10:00:00"),
        ascii_field(Tag::GPSLatitudeRef, "N"),
    ]
}

pub fn exif_tiff(fields: &[Field]) -> Vec<u8> {
    let mut writer = Writer::new();
    for field in fields {
        writer.push_field(field);
    }
    let mut buffer = Cursor::new(Vec::new());
    writer
        .write(&mut buffer, false)
        .expect("no se pudo escribir el bloque EXIF de prueba");
    buffer.into_inner()
}

fn gradient_rgb(width: u32, height: u32) -> Vec<u8> {
    (0..width * height)
        .flat_map(|i| [(i * 7 % 256) as u8, (i * 3 % 256) as u8, 180])
        .collect()
}

pub fn plain_jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, 90)
        .write_image(
            &gradient_rgb(width, height),
            width,
            height,
            ExtendedColorType::Rgb8,
        )
        .expect("no se pudo codificar el JPEG de prueba");
    buffer
}

/// JPEG con un segmento APP1 EXIF insertado tras el marcador SOI.
pub fn jpeg_with_exif(fields: &[Field]) -> Vec<u8> {
    let jpeg = plain_jpeg(16, 12);
    let tiff = exif_tiff(fields);
    let length = u16::try_from(tiff.len() + 8).expect("bloque EXIF demasiado grande");

    let mut output = Vec::with_capacity(jpeg.len() + tiff.len() + 10);
    output.extend_from_slice(&jpeg[..2]);
    output.extend_from_slice(&[0xFF, 0xE1]);
    output.extend_from_slice(&length.to_be_bytes());
    output.extend_from_slice(b"Exif\0\0");
    output.extend_from_slice(&tiff);
    output.extend_from_slice(&jpeg[2..]);
    output
}

/// PNG RGBA con un bloque `eXIf` antes de los datos de imagen.
pub fn png_with_exif(fields: &[Field]) -> Vec<u8> {
    let (width, height) = (8_u32, 6_u32);
    let pixels: Vec<u8> = (0..width * height)
        .flat_map(|i| [(i * 11 % 256) as u8, (i * 5 % 256) as u8, 90, 255])
        .collect();

    let mut output = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(png::ColorType::Rgba);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder
            .write_header()
            .expect("no se pudo escribir la cabecera PNG");
        writer
            .write_chunk(png::chunk::ChunkType(*b"eXIf"), &exif_tiff(fields))
            .expect("no se pudo escribir el bloque eXIf");
        writer
            .write_image_data(&pixels)
            .expect("no se pudo escribir la imagen PNG");
        writer.finish().expect("no se pudo cerrar el PNG");
    }
    output
}

/// PDF de una página con los campos Info indicados.
pub fn pdf_with_info(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut info = Dictionary::new();
    for (key, value) in entries {
        info.set(*key, Object::string_literal(*value));
    }
    build_pdf(Some(info))
}

pub fn pdf_without_info() -> Vec<u8> {
    build_pdf(None)
}

fn build_pdf(info: Option<Dictionary>) -> Vec<u8> {
    let mut doc = one_page_document();
    if let Some(info) = info {
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }
    save_pdf(&mut doc)
}

/// PDF cifrado con el manejador estándar (RC4 de 40 bits, revisión 2).
///
/// Sin entrada `U` la contraseña de usuario vacía abre el documento, como en
/// los PDF que solo restringen permisos. Con `requires_password` se añade un
/// `U` que no corresponde a la contraseña vacía.
pub fn encrypted_pdf_with_info(entries: &[(&str, &str)], requires_password: bool) -> Vec<u8> {
    let mut doc = one_page_document();

    let mut encrypt = dictionary! {
        "Filter" => "Standard",
        "V" => Object::Integer(1),
        "R" => Object::Integer(2),
        "O" => Object::String(vec![0x5A; 32], StringFormat::Hexadecimal),
        "P" => Object::Integer(-4),
    };
    if requires_password {
        encrypt.set("U", Object::String(vec![0; 32], StringFormat::Hexadecimal));
    }
    let encrypt_id = doc.add_object(encrypt);
    doc.trailer.set("Encrypt", encrypt_id);
    let file_id = Object::String(b"metaremoval-test".to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", vec![file_id.clone(), file_id]);

    let key = get_encryption_key(&doc, "", false).expect("clave de cifrado de prueba");
    let info_id = doc.new_object_id();
    let mut info = Dictionary::new();
    for (field, value) in entries {
        // RC4 es simétrico: descifrar el texto plano lo cifra.
        let cipher = decrypt_object(&key, info_id, &Object::string_literal(*value))
            .expect("no se pudo cifrar el campo de prueba");
        info.set(*field, Object::String(cipher, StringFormat::Hexadecimal));
    }
    doc.objects.insert(info_id, Object::Dictionary(info));
    doc.trailer.set("Info", info_id);

    save_pdf(&mut doc)
}

fn one_page_document() -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let content_id = doc.add_object(Stream::new(dictionary! {}, b"BT ET".to_vec()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(595),
            Object::Integer(842),
        ],
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => Object::Integer(1),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

fn save_pdf(doc: &mut Document) -> Vec<u8> {
    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .expect("no se pudo serializar el PDF de prueba");
    bytes
}
