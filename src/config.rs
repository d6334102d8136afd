//! Configuración: valores por defecto, archivo TOML opcional y banderas de la CLI.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::batch::{BatchOptions, DEFAULT_FILE_TIMEOUT_SECS};
use crate::cleaner::CleanOptions;
use crate::cleaner::constants::DEFAULT_JPEG_QUALITY;
use crate::download::CLEAN_PREFIX;
use crate::tally::animation::DEFAULT_ANIMATION;

const APP_DIR: &str = "metaremoval";
const TALLY_FILE_NAME: &str = "tally.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No se pudo leer la configuración: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuración TOML inválida: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Valor de configuración inválido: {0}")]
    Validation(String),
}

/// Todas las claves son opcionales en el archivo; las desconocidas se rechazan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directorio de salida. Sin valor se usa el directorio actual.
    pub output_dir: Option<PathBuf>,
    pub file_prefix: String,
    pub jpeg_quality: u8,
    /// `0` desactiva el límite de tiempo por archivo.
    pub file_timeout_secs: u64,
    pub tally_file: Option<PathBuf>,
    pub stats_url: Option<String>,
    pub animation_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: None,
            file_prefix: CLEAN_PREFIX.to_string(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            file_timeout_secs: DEFAULT_FILE_TIMEOUT_SECS,
            tally_file: None,
            stats_url: None,
            animation_ms: DEFAULT_ANIMATION.as_millis() as u64,
        }
    }
}

impl Config {
    /// Carga `path` si se indica; si no, devuelve los valores por defecto.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => {
                let contents = fs::read_to_string(path)?;
                toml::from_str(&contents)?
            }
            None => Config::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::Validation(format!(
                "jpeg_quality debe estar entre 1 y 100 (recibido {})",
                self.jpeg_quality
            )));
        }
        if self.file_prefix.is_empty() {
            return Err(ConfigError::Validation(
                "file_prefix no puede estar vacío".into(),
            ));
        }
        if self.file_prefix.contains(['/', '\\']) {
            return Err(ConfigError::Validation(
                "file_prefix no puede contener separadores de ruta".into(),
            ));
        }
        Ok(())
    }

    pub fn output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Ruta del archivo de contadores, por defecto bajo el directorio de datos
    /// locales del usuario.
    pub fn tally_path(&self) -> PathBuf {
        if let Some(path) = &self.tally_file {
            return path.clone();
        }

        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join(TALLY_FILE_NAME)
    }

    pub fn file_timeout(&self) -> Option<Duration> {
        (self.file_timeout_secs > 0).then(|| Duration::from_secs(self.file_timeout_secs))
    }

    pub fn animation(&self) -> Duration {
        Duration::from_millis(self.animation_ms)
    }

    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            clean: CleanOptions {
                jpeg_quality: self.jpeg_quality,
            },
            file_timeout: self.file_timeout(),
        }
    }
}
