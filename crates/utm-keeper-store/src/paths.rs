//! Path resolution for on-disk keeper state

use std::path::{Path, PathBuf};

/// Resolves where the file substrate and config live
#[derive(Debug, Clone)]
pub struct Paths {
    pub root: PathBuf,
}

impl Paths {
    /// `<data dir>/utm-keeper`
    pub fn new() -> std::io::Result<Self> {
        let data = dirs::data_dir().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "data directory not found")
        })?;

        Ok(Self {
            root: data.join("utm-keeper"),
        })
    }

    /// Use an explicit root instead of the platform data directory
    pub fn at(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Directory holding one document per storage key
    pub fn records_dir(&self) -> PathBuf {
        self.root.join("records")
    }

    /// Get config.json path
    pub fn config_file(&self) -> PathBuf {
        self.root.join("config.json")
    }
}
