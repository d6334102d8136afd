//! Contadores acumulados del dispositivo: archivos procesados y metadata eliminada.

pub mod animation;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;
use tracing::{debug, warn};

pub use animation::CounterAnimation;
pub use storage::{JsonFileBackend, MemoryBackend, TallyBackend};

pub const FILES_KEY: &str = "mr_totalFiles";
pub const METADATA_KEY: &str = "mr_totalMetadata";

/// Valores con los que arranca una instalación sin contadores guardados.
pub const BASELINE: Tally = Tally {
    files_processed: 57,
    metadata_removed: 248,
};

#[derive(Debug, Error)]
pub enum TallyError {
    #[error("No se pudieron guardar los contadores: {0}")]
    Io(#[from] io::Error),
    #[error("No se pudieron serializar los contadores: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    pub files_processed: u64,
    pub metadata_removed: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TallyChange {
    pub previous: Tally,
    pub current: Tally,
}

/// Contadores persistidos a través de un [`TallyBackend`].
#[derive(Debug)]
pub struct TallyStore<B> {
    backend: B,
    current: Tally,
}

impl<B: TallyBackend> TallyStore<B> {
    /// Lee los contadores guardados. Un valor ausente, ilegible o en cero se
    /// sustituye por [`BASELINE`].
    pub fn load(backend: B) -> Result<Self, TallyError> {
        let current = read_tally(&backend)?;
        debug!(?current, "contadores cargados");
        Ok(Self { backend, current })
    }

    /// Como [`TallyStore::load`], pero si el almacén no se puede leer arranca
    /// desde [`BASELINE`] en lugar de fallar.
    pub fn load_or_baseline(backend: B) -> Self {
        let current = read_tally(&backend).unwrap_or_else(|error| {
            warn!(%error, "no se pudieron leer los contadores, se usan los iniciales");
            BASELINE
        });
        Self { backend, current }
    }

    pub fn current(&self) -> Tally {
        self.current
    }

    /// Suma un lote y lo persiste. El valor en memoria se actualiza aunque la
    /// escritura falle.
    pub fn increment(&mut self, files: u64, metadata: u64) -> Result<TallyChange, TallyError> {
        let previous = self.current;
        self.current = Tally {
            files_processed: previous.files_processed.saturating_add(files),
            metadata_removed: previous.metadata_removed.saturating_add(metadata),
        };

        self.backend.write(&[
            (FILES_KEY, self.current.files_processed.to_string()),
            (METADATA_KEY, self.current.metadata_removed.to_string()),
        ])?;

        Ok(TallyChange {
            previous,
            current: self.current,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

fn read_tally<B: TallyBackend>(backend: &B) -> Result<Tally, TallyError> {
    Ok(Tally {
        files_processed: read_counter(backend, FILES_KEY, BASELINE.files_processed)?,
        metadata_removed: read_counter(backend, METADATA_KEY, BASELINE.metadata_removed)?,
    })
}

fn read_counter<B: TallyBackend>(backend: &B, key: &str, baseline: u64) -> Result<u64, TallyError> {
    let stored = backend
        .read(key)?
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|value| *value > 0);
    Ok(stored.unwrap_or(baseline))
}
