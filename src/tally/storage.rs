//! Almacenes clave-valor para los contadores del dispositivo.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use super::TallyError;

/// Almacén de cadenas por clave que sobrevive entre ejecuciones.
pub trait TallyBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TallyError>;
    fn write(&mut self, entries: &[(&str, String)]) -> Result<(), TallyError>;
}

/// Almacén en memoria, útil en pruebas.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    values: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

impl TallyBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TallyError> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, entries: &[(&str, String)]) -> Result<(), TallyError> {
        for (key, value) in entries {
            self.values.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }
}

/// Objeto JSON plano de cadenas guardado en un archivo local.
#[derive(Clone, Debug)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_map(&self) -> Result<BTreeMap<String, String>, TallyError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(error) => return Err(TallyError::Io(error)),
        };

        match serde_json::from_str(&contents) {
            Ok(map) => Ok(map),
            Err(error) => {
                warn!(path = %self.path.display(), %error, "contadores ilegibles, se reinician");
                Ok(BTreeMap::new())
            }
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl TallyBackend for JsonFileBackend {
    fn read(&self, key: &str) -> Result<Option<String>, TallyError> {
        Ok(self.load_map()?.remove(key))
    }

    fn write(&mut self, entries: &[(&str, String)]) -> Result<(), TallyError> {
        let mut map = self.load_map()?;
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&map)?;
        let temp = self.temp_path();
        fs::write(&temp, json)?;
        fs::rename(&temp, &self.path).map_err(|error| {
            let _ = fs::remove_file(&temp);
            TallyError::Io(error)
        })
    }
}
