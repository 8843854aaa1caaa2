//! Error types for utm-keeper-core

use thiserror::Error;
use utm_keeper_params::{CodecError, DiagnosticKind};
use utm_keeper_store::StoreError;

#[derive(Debug, Error)]
pub enum KeeperError {
    #[error("no URL to capture from: none given, configured or provided by the environment")]
    NoSourceUrl,

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl KeeperError {
    pub fn diagnostic_kind(&self) -> DiagnosticKind {
        match self {
            KeeperError::NoSourceUrl => DiagnosticKind::MissingSource,
            KeeperError::Codec(_) => DiagnosticKind::InvalidUrl,
            KeeperError::Store(e) => e.diagnostic_kind(),
        }
    }

    /// Missing persistence is the normal state for non-interactive hosts
    pub fn is_unavailable(&self) -> bool {
        matches!(self, KeeperError::Store(StoreError::Unavailable))
    }
}
