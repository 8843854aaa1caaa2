//! What the host provides: persistence and a current page URL

use std::sync::Arc;
use utm_keeper_store::Substrate;

/// Capabilities of the execution context.
///
/// Without a substrate the keeper is inert and every operation returns its
/// neutral value, which is the expected state for non-interactive hosts.
#[derive(Clone, Default)]
pub struct Environment {
    substrate: Option<Arc<dyn Substrate>>,
    current_url: Option<String>,
}

impl Environment {
    /// No persistence, no current URL
    pub fn headless() -> Self {
        Self::default()
    }

    /// Persistence backed by `substrate`
    pub fn with_substrate(substrate: Arc<dyn Substrate>) -> Self {
        Self {
            substrate: Some(substrate),
            current_url: None,
        }
    }

    pub fn current_url(mut self, url: impl Into<String>) -> Self {
        self.current_url = Some(url.into());
        self
    }

    pub fn persistence_available(&self) -> bool {
        self.substrate.is_some()
    }

    pub fn substrate(&self) -> Option<Arc<dyn Substrate>> {
        self.substrate.clone()
    }

    pub fn page_url(&self) -> Option<&str> {
        self.current_url.as_deref()
    }
}

impl std::fmt::Debug for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Environment")
            .field("persistence_available", &self.persistence_available())
            .field("current_url", &self.current_url)
            .finish()
    }
}
