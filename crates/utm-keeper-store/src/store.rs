//! Attribution store: expiring records on top of a substrate

use crate::clock::{Clock, SystemClock};
use crate::record::StoredRecord;
use crate::substrate::{Substrate, SubstrateError};
use std::sync::Arc;
use thiserror::Error;
use utm_keeper_params::{Diagnostic, DiagnosticKind, DiagnosticSink, ParameterSet, TracingSink};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no persistence substrate in this environment")]
    Unavailable,

    #[error(transparent)]
    Substrate(#[from] SubstrateError),

    #[error("stored record {key:?} is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize record: {0}")]
    Serialize(#[source] serde_json::Error),
}

impl StoreError {
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            StoreError::Unavailable => DiagnosticKind::Unavailable,
            StoreError::Corrupt { .. } => DiagnosticKind::CorruptRecord,
            StoreError::Substrate(_) | StoreError::Serialize(_) => DiagnosticKind::StorageFailure,
        }
    }
}

/// Reads and writes [`StoredRecord`]s, treating expired ones as absent.
///
/// A store built without a substrate is inert: every operation yields its
/// neutral value. The `try_*` methods expose the underlying failure; the
/// plain methods swallow it and report it to the diagnostic sink.
#[derive(Clone)]
pub struct AttributionStore {
    substrate: Option<Arc<dyn Substrate>>,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl AttributionStore {
    pub fn new(substrate: Option<Arc<dyn Substrate>>) -> Self {
        Self {
            substrate,
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn is_available(&self) -> bool {
        self.substrate.is_some()
    }

    fn substrate(&self) -> Result<&dyn Substrate, StoreError> {
        self.substrate.as_deref().ok_or(StoreError::Unavailable)
    }

    /// Current record under `key`; an expired record is deleted and reported absent
    pub fn try_read(&self, key: &str) -> Result<Option<StoredRecord>, StoreError> {
        let substrate = self.substrate()?;
        let Some(raw) = substrate.get(key)? else {
            return Ok(None);
        };

        let record: StoredRecord =
            serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: key.to_string(),
                source,
            })?;

        if record.is_expired(self.clock.now_millis()) {
            tracing::debug!(key, expires_at = record.expires_at, "purging expired record");
            if let Err(e) = substrate.remove(key) {
                self.report(&StoreError::from(e));
            }
            return Ok(None);
        }

        Ok(Some(record))
    }

    pub fn try_write(
        &self,
        key: &str,
        params: &ParameterSet,
        expiration_days: u32,
    ) -> Result<StoredRecord, StoreError> {
        let substrate = self.substrate()?;
        let record = StoredRecord::new(params.clone(), self.clock.now_millis(), expiration_days);
        let json = serde_json::to_string(&record).map_err(StoreError::Serialize)?;
        substrate.set(key, &json)?;
        Ok(record)
    }

    pub fn try_delete(&self, key: &str) -> Result<(), StoreError> {
        self.substrate()?.remove(key)?;
        Ok(())
    }

    pub fn read(&self, key: &str) -> Option<StoredRecord> {
        self.try_read(key).unwrap_or_else(|e| {
            self.report(&e);
            None
        })
    }

    pub fn write(&self, key: &str, params: &ParameterSet, expiration_days: u32) -> bool {
        match self.try_write(key, params, expiration_days) {
            Ok(_) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        match self.try_delete(key) {
            Ok(()) => true,
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Report a swallowed failure. Missing storage is an expected state, so it
    /// only goes to debug logging.
    fn report(&self, error: &StoreError) {
        match error {
            StoreError::Unavailable => tracing::debug!("{error}"),
            _ => self
                .diagnostics
                .report(Diagnostic::new(error.diagnostic_kind(), error.to_string())),
        }
    }
}
