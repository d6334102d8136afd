use super::constants::{JPEG_TYPE, PNG_TYPE};
use super::image::{
    ImageCleanError, OutputFormat, clean_image, decode_surface, read_metadata_summary,
    verify_image_metadata_clean,
};
use super::pdf::{PdfCleanOutcome, clean_pdf, read_document_info};
use super::{
    CleanError, CleanOptions, CleanOutcome, CleanerKind, Inspection, ProtectedReason, clean_file,
    inspect_file,
};
use crate::intake::InputFile;
use crate::record::ProcessedRecord;
use crate::test_support::{
    encrypted_pdf_with_info, jpeg_with_exif, pdf_with_info, pdf_without_info, plain_jpeg,
    png_with_exif, sample_exif_fields,
};
use exif::{Field, In, Tag, Value};
use lopdf::Document;

#[test]
fn dispatch_follows_declared_type() {
    assert_eq!(CleanerKind::for_content_type("image/jpeg"), CleanerKind::Image);
    assert_eq!(CleanerKind::for_content_type("image/webp"), CleanerKind::Image);
    assert_eq!(CleanerKind::for_content_type("application/pdf"), CleanerKind::Pdf);
    assert_eq!(
        CleanerKind::for_content_type("application/pdf; charset=binary"),
        CleanerKind::PassThrough
    );
    assert_eq!(CleanerKind::for_content_type("text/plain"), CleanerKind::PassThrough);
    assert_eq!(CleanerKind::for_content_type(""), CleanerKind::PassThrough);
}

#[test]
fn output_format_keeps_png_and_normalizes_the_rest() {
    assert_eq!(OutputFormat::for_declared_type(PNG_TYPE, 95), OutputFormat::Png);
    assert_eq!(
        OutputFormat::for_declared_type("image/webp", 95),
        OutputFormat::Jpeg { quality: 95 }
    );
    assert_eq!(OutputFormat::Jpeg { quality: 80 }.content_type(), JPEG_TYPE);
}

#[test]
fn jpeg_metadata_is_counted_and_removed() {
    let original = jpeg_with_exif(&sample_exif_fields());

    let summary = read_metadata_summary(&original).expect("el JPEG de prueba debería tener EXIF");
    assert_eq!(summary.tag_count(), 6);
    assert!(summary.has_gps());

    let cleaned = clean_image(&original, JPEG_TYPE, 95).expect("la limpieza del JPEG falló");
    assert_eq!(cleaned.metadata_count(), 6);
    assert_eq!(cleaned.content_type, JPEG_TYPE);
    assert!(
        verify_image_metadata_clean(&cleaned.bytes),
        "la imagen generada debería quedar sin metadata detectable"
    );
}

#[test]
fn png_metadata_is_counted_and_removed() {
    let original = png_with_exif(&sample_exif_fields());

    let cleaned = clean_image(&original, PNG_TYPE, 95).expect("la limpieza del PNG falló");

    assert_eq!(cleaned.metadata_count(), 6);
    assert_eq!(cleaned.content_type, PNG_TYPE);
    assert!(cleaned.bytes.starts_with(b"\x89PNG"));
    assert!(verify_image_metadata_clean(&cleaned.bytes));
}

#[test]
fn cleaned_png_keeps_natural_dimensions() {
    let original = png_with_exif(&sample_exif_fields());
    let cleaned = clean_image(&original, PNG_TYPE, 95).expect("la limpieza del PNG falló");

    let surface = decode_surface(&cleaned.bytes).expect("la imagen limpia debería decodificarse");
    assert_eq!((surface.width(), surface.height()), (8, 6));
}

#[test]
fn second_pass_finds_no_metadata() {
    let original = jpeg_with_exif(&sample_exif_fields());
    let first = clean_image(&original, JPEG_TYPE, 95).expect("primera pasada");
    let second = clean_image(&first.bytes, JPEG_TYPE, 95).expect("segunda pasada");

    assert_eq!(first.metadata_count(), 6);
    assert_eq!(second.metadata_count(), 0);
    assert!(second.metadata.is_none());
}

#[test]
fn image_without_exif_counts_zero() {
    let cleaned = clean_image(&plain_jpeg(4, 4), JPEG_TYPE, 95).expect("la limpieza falló");
    assert_eq!(cleaned.metadata_count(), 0);
}

#[test]
fn non_png_image_is_normalized_to_jpeg() {
    let original = png_with_exif(&sample_exif_fields());
    let cleaned = clean_image(&original, "image/gif", 95).expect("la limpieza falló");

    assert_eq!(cleaned.content_type, JPEG_TYPE);
    assert!(cleaned.bytes.starts_with(&[0xFF, 0xD8]));
}

#[test]
fn corrupt_image_fails_to_load() {
    let result = clean_image(b"no es una imagen", JPEG_TYPE, 95);
    assert!(matches!(result, Err(ImageCleanError::Load(_))));
}

#[test]
fn pdf_fields_are_counted_and_cleared() {
    let original = pdf_with_info(&[
        ("Title", "Doc"),
        ("Author", "A"),
        ("Subject", ""),
        ("Keywords", ""),
        ("Producer", ""),
        ("Creator", ""),
    ]);

    let PdfCleanOutcome::Cleaned {
        bytes,
        metadata_count,
    } = clean_pdf(&original)
    else {
        panic!("el PDF de prueba no debería quedar protegido");
    };

    assert_eq!(metadata_count, 2);
    let info = read_document_info(&bytes).expect("el PDF limpio debería poder leerse");
    assert_eq!(info.populated_count(), 0);
    for key in super::constants::DOCUMENT_INFO_KEYS {
        assert_eq!(info.get(key), Some(""));
    }
}

#[test]
fn pdf_dates_are_not_counted() {
    let original = pdf_with_info(&[
        ("Creator", "Procesador"),
        ("Producer", "Motor PDF"),
        ("Keywords", "uno dos"),
        ("CreationDate", "D:20240101000000Z"),
    ]);

    let outcome = clean_pdf(&original);
    assert!(matches!(
        outcome,
        PdfCleanOutcome::Cleaned {
            metadata_count: 3,
            ..
        }
    ));
}

#[test]
fn pdf_without_info_is_cleaned_with_zero_count() {
    let outcome = clean_pdf(&pdf_without_info());
    assert!(matches!(
        outcome,
        PdfCleanOutcome::Cleaned {
            metadata_count: 0,
            ..
        }
    ));
}

#[test]
fn unreadable_pdf_is_protected_and_returned_unchanged() {
    let original: &[u8] = b"esto no es un PDF";
    let input = InputFile::new("secreto.pdf", "application/pdf", original.to_vec());

    let outcome = clean_file(&input, &CleanOptions::default()).expect("no debería ser un error");

    match outcome {
        CleanOutcome::Protected { original: bytes, reason } => {
            assert_eq!(reason, ProtectedReason::Unreadable);
            assert_eq!(&*bytes, original);
        }
        other => panic!("se esperaba un PDF protegido, se obtuvo {other:?}"),
    }
}

#[test]
fn unsupported_type_passes_through() {
    let input = InputFile::new("notas.txt", "text/plain", b"hola".to_vec());

    let outcome = clean_file(&input, &CleanOptions::default()).expect("no debería fallar");

    match outcome {
        CleanOutcome::Cleaned {
            bytes,
            metadata_count,
            content_type,
            ..
        } => {
            assert_eq!(&*bytes, b"hola");
            assert_eq!(metadata_count, 0);
            assert_eq!(content_type, "text/plain");
        }
        other => panic!("se esperaba un archivo sin cambios, se obtuvo {other:?}"),
    }
}

#[test]
fn corrupt_image_surfaces_as_clean_error() {
    let input = InputFile::new("roto.jpg", "image/jpeg", b"\xFF\xD8basura".to_vec());

    let result = clean_file(&input, &CleanOptions::default());
    assert!(matches!(result, Err(CleanError::Image(ImageCleanError::Load(_)))));
}

#[test]
fn inspection_reports_without_modifying() {
    let photo = InputFile::new("foto.jpg", "image/jpeg", jpeg_with_exif(&sample_exif_fields()));
    let inspection = inspect_file(&photo).expect("inspección de imagen");
    assert_eq!(inspection.metadata_count(), 6);
    assert!(matches!(&inspection, Inspection::Image(Some(summary)) if summary.has_gps()));

    let document = InputFile::new(
        "informe.pdf",
        "application/pdf",
        pdf_with_info(&[("Title", "Doc"), ("Author", "A")]),
    );
    let inspection = inspect_file(&document).expect("inspección de PDF");
    assert_eq!(inspection.metadata_count(), 2);

    let broken = InputFile::new("roto.pdf", "application/pdf", b"no es un pdf".to_vec());
    assert!(matches!(inspect_file(&broken), Ok(Inspection::ProtectedPdf)));

    let text = InputFile::new("notas.txt", "text/plain", b"hola".to_vec());
    assert!(matches!(inspect_file(&text), Ok(Inspection::Unsupported)));
}

#[test]
fn exif_orientation_is_applied_before_reencoding() {
    let rotated = Field {
        tag: Tag::Orientation,
        ifd_num: In::PRIMARY,
        value: Value::Short(vec![6]),
    };
    let original = jpeg_with_exif(&[rotated]);
    assert_eq!(
        decode_surface(&plain_jpeg(16, 12)).map(|s| (s.width(), s.height())).ok(),
        Some((16, 12))
    );

    let cleaned = clean_image(&original, JPEG_TYPE, 95).expect("la imagen debería limpiarse");
    assert_eq!(cleaned.metadata_count(), 1);

    let surface = decode_surface(&cleaned.bytes).expect("la imagen limpia debería decodificarse");
    assert_eq!((surface.width(), surface.height()), (12, 16));
    assert!(verify_image_metadata_clean(&cleaned.bytes));
}

#[test]
fn permission_restricted_pdf_is_decrypted_and_cleaned() {
    let original = encrypted_pdf_with_info(&[("Title", "Doc"), ("Author", "A")], false);

    let PdfCleanOutcome::Cleaned {
        bytes,
        metadata_count,
    } = clean_pdf(&original)
    else {
        panic!("un PDF sin contraseña de usuario debería limpiarse");
    };

    assert_eq!(metadata_count, 2);
    let cleaned = Document::load_mem(&bytes).expect("el PDF limpio debería cargarse");
    assert!(!cleaned.is_encrypted());

    let info = read_document_info(&bytes).expect("el PDF limpio debería leerse");
    assert_eq!(info.get(b"Title"), Some(""));
    assert_eq!(info.get(b"Author"), Some(""));
    assert_eq!(info.populated_count(), 0);
}

#[test]
fn password_protected_pdf_is_returned_unchanged() {
    let original = encrypted_pdf_with_info(&[("Title", "Doc")], true);
    let input = InputFile::new("cerrado.pdf", "application/pdf", original.clone());

    let outcome = clean_file(&input, &CleanOptions::default()).expect("no debería ser un error");

    match &outcome {
        CleanOutcome::Protected {
            original: bytes,
            reason,
        } => {
            assert_eq!(*reason, ProtectedReason::Encrypted);
            assert_eq!(&bytes[..], &original[..]);
        }
        other => panic!("se esperaba un PDF protegido, se obtuvo {other:?}"),
    }

    let record = ProcessedRecord::new("cerrado.pdf", outcome.into());
    assert!(record.is_protected());
    assert_eq!(record.metadata_count(), 0);
}
