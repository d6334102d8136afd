use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Row, Table};
use console::{Term, style};
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

use crate::batch::{BatchEvent, BatchReport};
use crate::cleaner::Inspection;
use crate::download::DownloadSummary;
use crate::formatting::{format_count, format_size};
use crate::intake::InputFile;
use crate::remote::GlobalStats;
use crate::status::FileStatus;
use crate::tally::animation::FRAME_INTERVAL;
use crate::tally::{CounterAnimation, Tally};

const HEADER_WIDTH: usize = 72;

pub fn render_header() {
    let rule = style("═".repeat(HEADER_WIDTH)).cyan();
    println!("\n{rule}");
    println!(
        "  {}  {}",
        style("MetaRemoval").cyan().bold(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    );
    println!(
        "  {}",
        style("Elimina la metadata EXIF de imágenes y los datos de documento de PDF").white()
    );
    println!("{rule}\n");
}

/// Línea en vivo por cada transición del lote.
pub fn render_event(event: &BatchEvent) {
    match event {
        BatchEvent::Started { total } => {
            println!(
                "{} {}",
                style("▸").cyan(),
                style(format!("Procesando {total} archivo(s)...")).bold()
            );
        }
        BatchEvent::Processing { index, total, name } => {
            println!(
                "  {} {}",
                style(format!("[{index}/{total}]")).dim(),
                style(name).white().bold()
            );
        }
        BatchEvent::Success {
            metadata_count,
            has_gps,
            ..
        } => {
            let status = FileStatus::Success {
                metadata_count: *metadata_count,
            };
            println!("      {} {}", style("✓").green(), style(status.describe()).green());
            if *has_gps {
                println!(
                    "      {} {}",
                    style("⚠").yellow(),
                    style("Contenía datos de ubicación GPS").yellow()
                );
            }
        }
        BatchEvent::Protected { reason, .. } => {
            let status = FileStatus::Warning { reason: *reason };
            println!("      {} {}", style("⚠").yellow(), style(status.describe()).yellow());
        }
        BatchEvent::Failure { error, .. } => {
            let status = FileStatus::Error {
                message: error.clone(),
            };
            println!("      {} {}", style("✗").red(), style(status.describe()).red());
        }
        BatchEvent::Finished {
            files,
            metadata_removed,
            ..
        } => {
            println!(
                "\n{} {}",
                style("■").cyan(),
                style(format!(
                    "Lote completo: {files} archivo(s), {metadata_removed} elementos de metadata eliminados"
                ))
                .bold()
            );
        }
    }
}

pub fn render_results(report: &BatchReport) {
    if report.statuses.is_empty() {
        return;
    }

    let mut table = base_table();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Archivo"),
        header_cell("Estado"),
        header_cell("Detalle"),
    ]);

    for (index, entry) in report.statuses.entries().iter().enumerate() {
        let color = status_color(&entry.status);
        table.add_row(Row::from(vec![
            Cell::new(format!("{:>2}", index + 1)).fg(Color::White),
            Cell::new(&entry.name).fg(Color::White),
            Cell::new(status_badge(&entry.status)).fg(color),
            Cell::new(entry.status.describe()).fg(color),
        ]));
    }

    println!("{table}\n");
}

fn status_badge(status: &FileStatus) -> &'static str {
    match status {
        FileStatus::Processing => "…",
        FileStatus::Success { .. } => "Limpio",
        FileStatus::Warning { .. } => "Protegido",
        FileStatus::Error { .. } => "Error",
    }
}

fn status_color(status: &FileStatus) -> Color {
    match status {
        FileStatus::Processing => Color::White,
        FileStatus::Success { .. } => Color::Green,
        FileStatus::Warning { .. } => Color::Yellow,
        FileStatus::Error { .. } => Color::Red,
    }
}

/// Anima los contadores desde `previous` hasta `current`. Fuera de una
/// terminal solo imprime el valor final.
pub fn render_tally(previous: Tally, current: Tally, duration: Duration) -> io::Result<()> {
    let term = Term::stdout();
    if !term.is_term() || previous == current || duration.is_zero() {
        render_tally_static(current);
        return Ok(());
    }

    let files: Vec<u64> =
        CounterAnimation::new(previous.files_processed, current.files_processed, duration)
            .collect();
    let metadata: Vec<u64> =
        CounterAnimation::new(previous.metadata_removed, current.metadata_removed, duration)
            .collect();

    let frames = files.len().max(metadata.len());
    for frame in 0..frames {
        let files_value = frame_value(&files, frame, current.files_processed);
        let metadata_value = frame_value(&metadata, frame, current.metadata_removed);
        term.clear_line()?;
        term.write_str(&tally_line(files_value, metadata_value))?;
        thread::sleep(FRAME_INTERVAL);
    }
    term.write_line("")?;
    println!();
    Ok(())
}

fn frame_value(frames: &[u64], frame: usize, fallback: u64) -> u64 {
    frames
        .get(frame)
        .or_else(|| frames.last())
        .copied()
        .unwrap_or(fallback)
}

pub fn render_tally_static(tally: Tally) {
    println!(
        "{}\n",
        tally_line(tally.files_processed, tally.metadata_removed)
    );
}

fn tally_line(files: u64, metadata: u64) -> String {
    format!(
        "  {} {}   {} {}",
        style("Archivos procesados").cyan().bold(),
        style(format_count(files)).green().bold(),
        style("Metadata eliminada").cyan().bold(),
        style(format_count(metadata)).green().bold()
    )
}

pub fn render_global_stats(stats: GlobalStats) {
    println!(
        "  {} {} archivos · {} elementos de metadata\n",
        style("Global").dim(),
        style(format_count(stats.total_files)).white(),
        style(format_count(stats.total_meta)).white()
    );
}

pub fn render_downloads(summary: &DownloadSummary) {
    for file in &summary.saved {
        println!(
            "  {} {}",
            style("↓").cyan(),
            style(file.path.display()).white()
        );
    }
    for name in &summary.skipped {
        println!(
            "  {} {}",
            style("·").dim(),
            style(format!("{name} no se guardó (error al procesar)")).dim()
        );
    }
    println!();
}

pub fn render_report_saved(path: &Path) {
    println!(
        "{} {}\n",
        style("Reporte guardado en").dim(),
        style(path.display()).white()
    );
}

pub fn render_inspection(file: &InputFile, size: Option<u64>, inspection: &Inspection) {
    println!("{}", style(file.name()).cyan().bold());
    print_property("Tipo declarado", display_or_unknown(file.content_type()), Color::White);
    if let Some(size) = size {
        print_property("Tamaño", &format_size(size), Color::White);
    }

    match inspection {
        Inspection::Image(Some(summary)) => {
            let tags = summary
                .tags()
                .iter()
                .map(|tag| tag.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            print_property(
                "Etiquetas EXIF",
                &summary.tag_count().to_string(),
                Color::Yellow,
            );
            print_property("Detalle", &tags, Color::White);
            if summary.has_gps() {
                print_property("Ubicación GPS", "Presente", Color::Red);
            }
        }
        Inspection::Image(None) => {
            print_property("Etiquetas EXIF", "Ninguna", Color::Green);
        }
        Inspection::Pdf(info) => {
            let count = info.populated_count();
            let color = if count == 0 { Color::Green } else { Color::Yellow };
            print_property("Campos de documento", &count.to_string(), color);
            for (key, value) in info.entries().filter(|(_, value)| !value.is_empty()) {
                print_property(key, value, Color::White);
            }
        }
        Inspection::ProtectedPdf => {
            print_property("PDF", "Protegido o ilegible", Color::Yellow);
        }
        Inspection::Unsupported => {
            print_property("Metadata", "Tipo sin limpiador, se copia sin cambios", Color::White);
        }
    }
    println!();
}

fn display_or_unknown(value: &str) -> &str {
    if value.is_empty() {
        "Desconocido"
    } else {
        value
    }
}

pub fn render_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red());
}

fn print_property(label: &str, value: &str, color: Color) {
    let label_styled = style(format!("  {}", label)).cyan().bold();
    let arrow = style("→").dim();

    let value_styled = match color {
        Color::Yellow => style(value).yellow(),
        Color::Green => style(value).green(),
        Color::Red => style(value).red(),
        _ => style(value).white(),
    };

    println!("{} {} {}", label_styled, arrow, value_styled);
}

fn base_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn header_cell(text: &str) -> Cell {
    Cell::new(text)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
