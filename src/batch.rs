//! Procesamiento secuencial de un lote de archivos.

use serde::Serialize;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use crate::cleaner::{CleanOptions, ProtectedReason, clean_file};
use crate::intake::InputFile;
use crate::record::{ProcessedRecord, RecordOutcome};
use crate::status::StatusTracker;

pub const DEFAULT_FILE_TIMEOUT_SECS: u64 = 20;

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BatchEvent {
    Started {
        total: usize,
    },
    Processing {
        index: usize,
        total: usize,
        name: String,
    },
    Success {
        index: usize,
        name: String,
        metadata_count: usize,
        has_gps: bool,
    },
    Protected {
        index: usize,
        name: String,
        reason: ProtectedReason,
    },
    Failure {
        index: usize,
        name: String,
        error: String,
    },
    Finished {
        files: usize,
        metadata_removed: usize,
        successes: usize,
        protected: usize,
        failures: usize,
    },
}

#[derive(Clone, Copy, Debug)]
pub struct BatchOptions {
    pub clean: CleanOptions,
    /// Tiempo máximo por archivo; `None` espera indefinidamente.
    ///
    /// Al agotarse, el archivo se marca como error y el lote continúa, pero el
    /// hilo que lo procesaba no se detiene: sigue en segundo plano hasta
    /// terminar y su resultado se descarta.
    pub file_timeout: Option<Duration>,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            clean: CleanOptions::default(),
            file_timeout: Some(Duration::from_secs(DEFAULT_FILE_TIMEOUT_SECS)),
        }
    }
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum IsolationError {
    #[error("Tiempo de espera excedido ({} s)", .0.as_secs())]
    TimedOut(Duration),
    #[error("No se pudo completar la limpieza")]
    Interrupted,
    #[error("No se pudo iniciar la limpieza: {0}")]
    Spawn(String),
}

/// Resultado de un lote: un registro y un estado por archivo, en orden.
#[derive(Debug)]
pub struct BatchReport {
    pub records: Vec<ProcessedRecord>,
    pub statuses: StatusTracker,
    /// Metadata eliminada de los archivos limpiados con éxito.
    pub metadata_removed: usize,
}

impl BatchReport {
    pub fn files_processed(&self) -> usize {
        self.records.len()
    }
}

#[derive(Clone, Debug, Default)]
pub struct BatchProcessor {
    options: BatchOptions,
}

impl BatchProcessor {
    pub fn new(options: BatchOptions) -> Self {
        Self { options }
    }

    pub fn run(&self, files: Vec<InputFile>) -> BatchReport {
        self.run_inner(files, |_| {})
    }

    /// Igual que [`BatchProcessor::run`], notificando cada transición por el canal.
    pub fn run_with_sender(&self, files: Vec<InputFile>, sender: &Sender<BatchEvent>) -> BatchReport {
        self.run_inner(files, |event| {
            let _ = sender.send(event);
        })
    }

    fn run_inner(&self, files: Vec<InputFile>, mut notify: impl FnMut(BatchEvent)) -> BatchReport {
        let total = files.len();
        notify(BatchEvent::Started { total });

        let mut records = Vec::with_capacity(total);
        let mut statuses = StatusTracker::new();
        let mut metadata_removed = 0_usize;

        for (position, input) in files.into_iter().enumerate() {
            let index = position + 1;
            let name = input.name().to_string();
            let slot = statuses.begin(name.clone());
            notify(BatchEvent::Processing {
                index,
                total,
                name: name.clone(),
            });

            let outcome = self.process_one(input);
            let record = ProcessedRecord::new(name.clone(), outcome);
            metadata_removed += record.metadata_count();

            // Cada índice se abre y se cierra una sola vez en este bucle.
            let _ = statuses.finish(slot, record.status());
            notify(event_for(index, &record));
            records.push(record);
        }

        let counts = statuses.counts();
        notify(BatchEvent::Finished {
            files: total,
            metadata_removed,
            successes: counts.successes,
            protected: counts.warnings,
            failures: counts.errors,
        });

        BatchReport {
            records,
            statuses,
            metadata_removed,
        }
    }

    fn process_one(&self, input: InputFile) -> RecordOutcome {
        let clean_options = self.options.clean;
        let name = input.name().to_string();
        let result = run_isolated(
            move || clean_file(&input, &clean_options),
            self.options.file_timeout,
        );

        match result {
            Ok(Ok(outcome)) => {
                let outcome = RecordOutcome::from(outcome);
                match &outcome {
                    RecordOutcome::Protected { reason, .. } => {
                        warn!(%name, ?reason, "PDF protegido")
                    }
                    _ => info!(%name, "archivo limpio"),
                }
                outcome
            }
            Ok(Err(error)) => {
                warn!(%name, %error, "falló la limpieza");
                RecordOutcome::Failed {
                    message: error.to_string(),
                }
            }
            Err(error) => {
                warn!(%name, %error, "limpieza interrumpida");
                RecordOutcome::Failed {
                    message: error.to_string(),
                }
            }
        }
    }
}

fn event_for(index: usize, record: &ProcessedRecord) -> BatchEvent {
    let name = record.original_name.clone();
    match &record.outcome {
        RecordOutcome::Cleaned {
            metadata_count,
            has_gps,
            ..
        } => BatchEvent::Success {
            index,
            name,
            metadata_count: *metadata_count,
            has_gps: *has_gps,
        },
        RecordOutcome::Protected { reason, .. } => BatchEvent::Protected {
            index,
            name,
            reason: *reason,
        },
        RecordOutcome::Failed { message } => BatchEvent::Failure {
            index,
            name,
            error: message.clone(),
        },
    }
}

/// Ejecuta `job` en un hilo propio. Un pánico o un tiempo de espera agotado
/// se convierten en error sin afectar al hilo que llama. Tras un tiempo de
/// espera el hilo queda sin supervisar.
pub fn run_isolated<T, F>(job: F, timeout: Option<Duration>) -> Result<T, IsolationError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (sender, receiver) = mpsc::channel();
    thread::Builder::new()
        .name("metaremoval-clean".to_string())
        .spawn(move || {
            let _ = sender.send(job());
        })
        .map_err(|error| IsolationError::Spawn(error.to_string()))?;

    match timeout {
        Some(timeout) => match receiver.recv_timeout(timeout) {
            Ok(value) => Ok(value),
            Err(RecvTimeoutError::Timeout) => Err(IsolationError::TimedOut(timeout)),
            Err(RecvTimeoutError::Disconnected) => Err(IsolationError::Interrupted),
        },
        None => receiver.recv().map_err(|_| IsolationError::Interrupted),
    }
}
