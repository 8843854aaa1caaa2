//! Key-value persistence contract and the in-memory implementation

use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SubstrateError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded")]
    QuotaExceeded,

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// String key-value storage shared by every keeper using the same key.
///
/// Implementations report failures through the returned `Result`; they must
/// not panic. No atomicity is promised across processes: last writer wins.
pub trait Substrate: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError>;

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError>;

    /// Removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), SubstrateError>;
}

/// Process-local substrate backed by a map
#[derive(Debug, Default)]
pub struct MemorySubstrate {
    entries: Mutex<HashMap<String, String>>,
}

impl MemorySubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

impl Substrate for MemorySubstrate {
    fn get(&self, key: &str) -> Result<Option<String>, SubstrateError> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SubstrateError> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), SubstrateError> {
        self.entries().remove(key);
        Ok(())
    }
}
