//! Motor de MetaRemoval: limpia metadata EXIF y de documentos PDF de archivos
//! locales y lleva la cuenta de lo eliminado en este dispositivo.

pub mod app;
pub mod batch;
pub mod cleaner;
pub mod config;
pub mod download;
pub mod formatting;
pub mod intake;
pub mod record;
pub mod remote;
pub mod report;
pub mod status;
pub mod tally;
pub mod ui;

#[cfg(test)]
mod test_support;

pub use batch::{BatchEvent, BatchOptions, BatchProcessor, BatchReport};
pub use cleaner::{CleanError, CleanOptions, CleanOutcome, ProtectedReason, clean_file};
pub use intake::InputFile;
pub use record::{ProcessedRecord, RecordOutcome};
pub use tally::{Tally, TallyStore};
