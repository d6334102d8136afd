use std::fs;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{BatchProcessor, BatchReport};
use crate::cleaner::{CleanError, inspect_file};
use crate::config::Config;
use crate::download::{DirectorySaveTarget, DownloadDispatcher, DownloadError};
use crate::intake::{IntakeError, collect_batch};
use crate::remote::{DisabledStats, HttpStatsEndpoint, StatsDelta, StatsEndpoint};
use crate::report::{BatchSummary, ReportError};
use crate::tally::{JsonFileBackend, TallyStore};
use crate::ui;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Intake(#[from] IntakeError),
    #[error(transparent)]
    Download(#[from] DownloadError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("No se pudo escribir en la terminal: {0}")]
    Terminal(#[from] io::Error),
}

#[derive(Clone, Debug, Default)]
pub struct CleanRequest {
    pub paths: Vec<PathBuf>,
    /// Guarda los archivos limpios en el directorio de salida.
    pub save: bool,
    pub report: Option<PathBuf>,
}

/// Limpia un lote, actualiza los contadores y guarda los resultados.
pub fn run_clean(config: &Config, request: &CleanRequest) -> Result<BatchReport, AppError> {
    let files = collect_batch(&request.paths)?;
    let mut tally = TallyStore::load_or_baseline(JsonFileBackend::new(config.tally_path()));
    let stats = stats_endpoint(config);

    ui::render_header();

    let processor = BatchProcessor::new(config.batch_options());
    let (sender, receiver) = mpsc::channel();
    let printer = thread::spawn(move || {
        for event in receiver {
            ui::render_event(&event);
        }
    });

    let report = processor.run_with_sender(files, &sender);
    drop(sender);
    if printer.join().is_err() {
        warn!("el hilo de salida terminó de forma inesperada");
    }

    println!();
    ui::render_results(&report);

    let files_delta = report.files_processed() as u64;
    let metadata_delta = report.metadata_removed as u64;
    let previous = tally.current();
    if let Err(error) = tally.increment(files_delta, metadata_delta) {
        warn!(
            path = %tally.backend().path().display(),
            %error,
            "no se pudieron guardar los contadores"
        );
    }
    let current = tally.current();

    stats.contribute(StatsDelta {
        files_delta,
        metadata_delta,
    });
    ui::render_tally(previous, current, config.animation())?;
    if let Some(global) = stats.fetch_global() {
        ui::render_global_stats(global);
    }

    let downloads = if request.save {
        let target = DirectorySaveTarget::new(config.output_dir());
        let mut dispatcher = DownloadDispatcher::with_prefix(target, config.file_prefix.clone());
        let summary = dispatcher.download_all(&report.records)?;
        ui::render_downloads(&summary);
        Some(summary)
    } else {
        None
    };

    if let Some(path) = &request.report {
        BatchSummary::new(&report, downloads.as_ref(), Some(current)).export(path)?;
        info!(path = %path.display(), "reporte exportado");
        ui::render_report_saved(path);
    }

    Ok(report)
}

/// Muestra los contadores guardados sin procesar nada.
pub fn run_tally(config: &Config) -> Result<(), AppError> {
    let tally = TallyStore::load_or_baseline(JsonFileBackend::new(config.tally_path()));

    ui::render_header();
    ui::render_tally_static(tally.current());
    if let Some(global) = stats_endpoint(config).fetch_global() {
        ui::render_global_stats(global);
    }
    Ok(())
}

/// Informa la metadata que se eliminaría, sin modificar los archivos.
pub fn run_inspect(paths: &[PathBuf]) -> Result<(), AppError> {
    let files = collect_batch(paths)?;

    ui::render_header();
    for file in &files {
        let size = file
            .path()
            .and_then(|path| fs::metadata(path).ok())
            .map(|metadata| metadata.len());

        match inspect_file(file) {
            Ok(inspection) => ui::render_inspection(file, size, &inspection),
            Err(CleanError::Read(error)) => {
                ui::render_error(&format!("No se pudo leer `{}`: {error}", file.name()))
            }
            Err(error) => ui::render_error(&format!("{}: {error}", file.name())),
        }
    }
    Ok(())
}

fn stats_endpoint(config: &Config) -> Box<dyn StatsEndpoint> {
    let Some(url) = &config.stats_url else {
        return Box::new(DisabledStats);
    };

    match HttpStatsEndpoint::new(url.clone()) {
        Ok(endpoint) => Box::new(endpoint),
        Err(error) => {
            warn!(%error, "no se pudo preparar el cliente de estadísticas");
            Box::new(DisabledStats)
        }
    }
}
