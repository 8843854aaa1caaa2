//! The attribution keeper

use crate::config::{AttributionMode, ConfigOverride, KeeperConfig};
use crate::dispatch::{Dispatch, UtmDispatch};
use crate::environment::Environment;
use crate::error::KeeperError;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};
use utm_keeper_params::{codec, Codec, Diagnostic, DiagnosticSink, ParameterSet, TracingSink};
use utm_keeper_store::{AttributionStore, Clock, StoredRecord, SystemClock};

/// What a capture did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// The observation was written
    Stored(StoredRecord),
    /// First-touch: a valid record already existed and was left untouched
    Retained(StoredRecord),
    /// The source URL carried no recognized parameters
    NoParams,
}

impl CaptureOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, CaptureOutcome::Stored(_))
    }
}

struct Inner {
    config: RwLock<KeeperConfig>,
    environment: Environment,
    store: AttributionStore,
    codec: Codec,
    diagnostics: Arc<dyn DiagnosticSink>,
}

/// Captures UTM parameters and applies the attribution policy.
///
/// The stored record is never cached: every operation reads the substrate,
/// so keepers sharing a storage key see each other's writes. Cloning is
/// cheap and clones share configuration.
#[derive(Clone)]
pub struct UtmKeeper {
    inner: Arc<Inner>,
}

/// Builds a [`UtmKeeper`]; auto-capture runs in [`KeeperBuilder::build`]
pub struct KeeperBuilder {
    config: KeeperConfig,
    environment: Environment,
    clock: Arc<dyn Clock>,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl KeeperBuilder {
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> UtmKeeper {
        let store = AttributionStore::new(self.environment.substrate())
            .with_clock(self.clock)
            .with_diagnostics(self.diagnostics.clone());
        let auto_capture = self.config.auto_capture;

        let keeper = UtmKeeper {
            inner: Arc::new(Inner {
                config: RwLock::new(self.config),
                environment: self.environment,
                store,
                codec: Codec::new(self.diagnostics.clone()),
                diagnostics: self.diagnostics,
            }),
        };

        // nothing to capture from is not a failure here
        if auto_capture
            && keeper.persistence_available()
            && keeper.resolve_source(None).is_some()
        {
            keeper.capture(None);
        }
        keeper
    }
}

impl UtmKeeper {
    pub fn builder(config: KeeperConfig) -> KeeperBuilder {
        KeeperBuilder {
            config,
            environment: Environment::headless(),
            clock: Arc::new(SystemClock),
            diagnostics: Arc::new(TracingSink),
        }
    }

    pub fn new(config: KeeperConfig, environment: Environment) -> Self {
        Self::builder(config).environment(environment).build()
    }

    fn config_guard(&self) -> RwLockReadGuard<'_, KeeperConfig> {
        self.inner
            .config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot of the live configuration
    pub fn config(&self) -> KeeperConfig {
        self.config_guard().clone()
    }

    /// Merge `overrides` into the live configuration; applies from the next call on
    pub fn update_config(&self, overrides: ConfigOverride) {
        self.inner
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .apply(overrides);
    }

    pub fn mode(&self) -> AttributionMode {
        self.config_guard().mode
    }

    pub fn set_mode(&self, mode: AttributionMode) {
        self.update_config(ConfigOverride {
            mode: Some(mode),
            ..Default::default()
        });
    }

    pub fn persistence_available(&self) -> bool {
        self.inner.store.is_available()
    }

    pub fn environment(&self) -> &Environment {
        &self.inner.environment
    }

    fn storage_key(&self) -> String {
        self.config_guard().storage_key.clone()
    }

    /// Explicit argument, then the configured capture URL, then the page URL
    fn resolve_source(&self, source_url: Option<&str>) -> Option<String> {
        source_url
            .map(str::to_string)
            .or_else(|| self.config_guard().capture_url.clone())
            .or_else(|| self.inner.environment.page_url().map(str::to_string))
    }

    /// Parameters on the environment's current page URL, without storing them
    pub fn extract_from_current(&self) -> Option<ParameterSet> {
        let page_url = self.inner.environment.page_url()?;
        self.inner.codec.extract(page_url)
    }

    /// Capture from `source_url` and apply the attribution mode
    pub fn try_capture(&self, source_url: Option<&str>) -> Result<CaptureOutcome, KeeperError> {
        if !self.persistence_available() {
            return Err(utm_keeper_store::StoreError::Unavailable.into());
        }

        let source = self
            .resolve_source(source_url)
            .ok_or(KeeperError::NoSourceUrl)?;
        let Some(params) = codec::try_extract(&source)? else {
            return Ok(CaptureOutcome::NoParams);
        };

        let config = self.config();
        if config.mode == AttributionMode::FirstTouch {
            if let Some(existing) = self.get_record() {
                tracing::debug!(
                    key = %config.storage_key,
                    "first-touch record already present, keeping it"
                );
                return Ok(CaptureOutcome::Retained(existing));
            }
        }

        let record = self
            .inner
            .store
            .try_write(&config.storage_key, &params, config.expiration_days)?;
        tracing::debug!(key = %config.storage_key, mode = %config.mode, "captured UTM parameters");
        Ok(CaptureOutcome::Stored(record))
    }

    /// True when this call wrote a record
    pub fn capture(&self, source_url: Option<&str>) -> bool {
        match self.try_capture(source_url) {
            Ok(outcome) => outcome.is_stored(),
            Err(e) => {
                self.report(&e);
                false
            }
        }
    }

    /// Current record; records without populated parameters count as absent
    pub fn get_record(&self) -> Option<StoredRecord> {
        self.inner
            .store
            .read(&self.storage_key())
            .filter(|record| !record.params.is_empty())
    }

    pub fn get_params(&self) -> Option<ParameterSet> {
        self.get_record().map(|record| record.params)
    }

    pub fn has_stored_params(&self) -> bool {
        self.get_params().is_some()
    }

    /// Delete the record whatever the mode
    pub fn clear(&self) -> bool {
        self.inner.store.delete(&self.storage_key())
    }

    /// Add stored parameters to `destination` without replacing keys it already has
    pub fn append_to_url(&self, destination: &str) -> String {
        match self.get_params() {
            Some(params) => self.append_params(destination, &params),
            None => destination.to_string(),
        }
    }

    pub(crate) fn append_params(&self, destination: &str, params: &ParameterSet) -> String {
        self.inner.codec.append_to_url(destination, params)
    }

    /// Stored parameters as a name/value map, empty when nothing is stored
    pub fn to_object(&self) -> BTreeMap<String, String> {
        self.get_params()
            .map(|params| codec::to_map(&params))
            .unwrap_or_default()
    }

    /// Stored parameters as a query string, empty when nothing is stored
    pub fn to_query_string(&self) -> String {
        self.get_params()
            .map(|params| codec::to_query_string(&params))
            .unwrap_or_default()
    }

    /// Wrap `dispatcher` so outgoing requests carry the stored parameters
    pub fn decorate_dispatcher<D: Dispatch>(&self, dispatcher: D) -> UtmDispatch<D> {
        UtmDispatch::new(self.clone(), dispatcher)
    }

    fn report(&self, error: &KeeperError) {
        if error.is_unavailable() {
            tracing::debug!("{error}");
            return;
        }
        self.inner
            .diagnostics
            .report(Diagnostic::new(error.diagnostic_kind(), error.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use utm_keeper_params::{DiagnosticKind, RecordingSink, UtmKey};
    use utm_keeper_store::{ManualClock, MemorySubstrate, Substrate, MILLIS_PER_DAY};

    fn manual(mode: AttributionMode) -> KeeperConfig {
        KeeperConfig {
            mode,
            auto_capture: false,
            ..KeeperConfig::default()
        }
    }

    fn keeper_with(config: KeeperConfig, substrate: Arc<MemorySubstrate>) -> UtmKeeper {
        UtmKeeper::new(config, Environment::with_substrate(substrate))
    }

    fn source(keeper: &UtmKeeper) -> Option<String> {
        keeper
            .get_params()
            .and_then(|p| p.get(UtmKey::Source).map(str::to_string))
    }

    #[test]
    fn test_first_touch_keeps_first() {
        let keeper = keeper_with(
            manual(AttributionMode::FirstTouch),
            Arc::new(MemorySubstrate::new()),
        );

        assert!(keeper.capture(Some("https://x.test/?utm_source=a")));
        assert!(!keeper.capture(Some("https://x.test/?utm_source=b")));
        assert_eq!(source(&keeper).as_deref(), Some("a"));
    }

    #[test]
    fn test_first_touch_outcome_reports_retained() {
        let keeper = keeper_with(
            manual(AttributionMode::FirstTouch),
            Arc::new(MemorySubstrate::new()),
        );
        keeper.capture(Some("https://x.test/?utm_source=a"));

        let outcome = keeper
            .try_capture(Some("https://x.test/?utm_source=b"))
            .unwrap();
        match outcome {
            CaptureOutcome::Retained(record) => {
                assert_eq!(record.params.get(UtmKey::Source), Some("a"))
            }
            other => panic!("expected Retained, got {other:?}"),
        }
    }

    #[test]
    fn test_last_touch_replaces() {
        let keeper = keeper_with(
            manual(AttributionMode::LastTouch),
            Arc::new(MemorySubstrate::new()),
        );

        assert!(keeper.capture(Some("https://x.test/?utm_source=a&utm_medium=email")));
        assert!(keeper.capture(Some("https://x.test/?utm_source=b")));

        let params = keeper.get_params().unwrap();
        assert_eq!(params.get(UtmKey::Source), Some("b"));
        // replaced wholesale, not merged
        assert_eq!(params.get(UtmKey::Medium), None);
    }

    #[test]
    fn test_capture_without_params_keeps_record() {
        let keeper = keeper_with(
            manual(AttributionMode::LastTouch),
            Arc::new(MemorySubstrate::new()),
        );
        keeper.capture(Some("https://x.test/?utm_source=a"));

        assert_eq!(
            keeper.try_capture(Some("https://x.test/?ref=home")).unwrap(),
            CaptureOutcome::NoParams
        );
        assert_eq!(source(&keeper).as_deref(), Some("a"));
    }

    #[test]
    fn test_first_touch_recaptures_after_expiry() {
        let clock = Arc::new(ManualClock::new(0));
        let keeper = UtmKeeper::builder(KeeperConfig {
            expiration_days: 1,
            ..manual(AttributionMode::FirstTouch)
        })
        .environment(Environment::with_substrate(Arc::new(MemorySubstrate::new())))
        .clock(clock.clone())
        .build();

        assert!(keeper.capture(Some("https://x.test/?utm_source=a")));
        clock.advance(MILLIS_PER_DAY);
        assert!(keeper.capture(Some("https://x.test/?utm_source=b")));
        assert_eq!(source(&keeper).as_deref(), Some("b"));
    }

    #[test]
    fn test_first_touch_overwrites_record_without_params() {
        let substrate = Arc::new(MemorySubstrate::new());
        substrate
            .set(
                "utm_keeper",
                r#"{"params":{},"timestamp":0,"expiresAt":9999999999999}"#,
            )
            .unwrap();
        let keeper = keeper_with(manual(AttributionMode::FirstTouch), substrate);

        assert_eq!(keeper.get_record(), None);
        assert!(keeper.capture(Some("https://x.test/?utm_source=a")));
    }

    #[test]
    fn test_first_touch_overwrites_corrupt_record() {
        let substrate = Arc::new(MemorySubstrate::new());
        substrate.set("utm_keeper", "garbage").unwrap();
        let sink = Arc::new(RecordingSink::new());
        let keeper = UtmKeeper::builder(manual(AttributionMode::FirstTouch))
            .environment(Environment::with_substrate(substrate))
            .diagnostics(sink.clone())
            .build();

        assert!(keeper.capture(Some("https://x.test/?utm_source=a")));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::CorruptRecord]);
        assert_eq!(source(&keeper).as_deref(), Some("a"));
    }

    #[test]
    fn test_source_resolution_order() {
        let substrate = Arc::new(MemorySubstrate::new());
        let env =
            Environment::with_substrate(substrate).current_url("https://x.test/?utm_source=page");
        let keeper = UtmKeeper::new(
            KeeperConfig {
                capture_url: Some("https://x.test/?utm_source=configured".to_string()),
                ..manual(AttributionMode::LastTouch)
            },
            env,
        );

        keeper.capture(None);
        assert_eq!(source(&keeper).as_deref(), Some("configured"));

        keeper.capture(Some("https://x.test/?utm_source=explicit"));
        assert_eq!(source(&keeper).as_deref(), Some("explicit"));

        keeper.update_config(ConfigOverride {
            capture_url: Some(None),
            ..Default::default()
        });
        keeper.capture(None);
        assert_eq!(source(&keeper).as_deref(), Some("page"));
    }

    #[test]
    fn test_capture_without_any_url() {
        let sink = Arc::new(RecordingSink::new());
        let keeper = UtmKeeper::builder(manual(AttributionMode::LastTouch))
            .environment(Environment::with_substrate(Arc::new(MemorySubstrate::new())))
            .diagnostics(sink.clone())
            .build();

        assert!(matches!(keeper.try_capture(None), Err(KeeperError::NoSourceUrl)));
        assert!(!keeper.capture(None));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::MissingSource]);
    }

    #[test]
    fn test_auto_capture_without_url_is_silent() {
        let sink = Arc::new(RecordingSink::new());
        let keeper = UtmKeeper::builder(KeeperConfig::default())
            .environment(Environment::with_substrate(Arc::new(MemorySubstrate::new())))
            .diagnostics(sink.clone())
            .build();

        assert!(!keeper.has_stored_params());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_extract_from_current_does_not_store() {
        let keeper = keeper_with(
            manual(AttributionMode::LastTouch),
            Arc::new(MemorySubstrate::new()),
        );
        assert_eq!(keeper.extract_from_current(), None);

        let keeper = UtmKeeper::new(
            manual(AttributionMode::LastTouch),
            Environment::headless().current_url("https://x.test/?utm_term=shoes"),
        );
        let params = keeper.extract_from_current().unwrap();
        assert_eq!(params.get(UtmKey::Term), Some("shoes"));
        assert!(!keeper.has_stored_params());
    }

    #[test]
    fn test_invalid_url_is_reported() {
        let sink = Arc::new(RecordingSink::new());
        let keeper = UtmKeeper::builder(manual(AttributionMode::LastTouch))
            .environment(Environment::with_substrate(Arc::new(MemorySubstrate::new())))
            .diagnostics(sink.clone())
            .build();

        assert!(!keeper.capture(Some("::not a url::")));
        assert_eq!(sink.kinds(), vec![DiagnosticKind::InvalidUrl]);
    }

    #[test]
    fn test_clear() {
        for mode in [AttributionMode::FirstTouch, AttributionMode::LastTouch] {
            let keeper = keeper_with(manual(mode), Arc::new(MemorySubstrate::new()));
            keeper.capture(Some("https://x.test/?utm_source=a"));
            assert!(keeper.clear());
            assert_eq!(keeper.get_params(), None);
            assert!(!keeper.has_stored_params());
        }
    }

    #[test]
    fn test_update_config_applies_to_next_call() {
        let keeper = keeper_with(
            manual(AttributionMode::FirstTouch),
            Arc::new(MemorySubstrate::new()),
        );
        keeper.capture(Some("https://x.test/?utm_source=a"));

        keeper.update_config(ConfigOverride {
            storage_key: Some("other".to_string()),
            ..Default::default()
        });
        assert_eq!(keeper.get_params(), None);
        assert_eq!(keeper.config().mode, AttributionMode::FirstTouch);

        keeper.set_mode(AttributionMode::LastTouch);
        assert_eq!(keeper.mode(), AttributionMode::LastTouch);
    }

    #[test]
    fn test_update_config_does_not_touch_stored_expiry() {
        let substrate = Arc::new(MemorySubstrate::new());
        let keeper = keeper_with(manual(AttributionMode::FirstTouch), substrate);
        keeper.capture(Some("https://x.test/?utm_source=a"));
        let before = keeper.get_record().unwrap();

        keeper.update_config(ConfigOverride {
            expiration_days: Some(0),
            ..Default::default()
        });
        assert_eq!(keeper.get_record(), Some(before));
    }

    #[test]
    fn test_append_and_object() {
        let keeper = keeper_with(
            manual(AttributionMode::FirstTouch),
            Arc::new(MemorySubstrate::new()),
        );
        assert_eq!(keeper.append_to_url("https://dest.test/"), "https://dest.test/");
        assert!(keeper.to_object().is_empty());
        assert_eq!(keeper.to_query_string(), "");

        keeper.capture(Some("https://x.test/?utm_source=news&utm_medium=email"));
        assert_eq!(
            keeper.append_to_url("https://dest.test/?utm_source=keep"),
            "https://dest.test/?utm_source=keep&utm_medium=email"
        );
        assert_eq!(keeper.to_object()["utm_source"], "news");
        assert_eq!(keeper.to_query_string(), "utm_source=news&utm_medium=email");
    }

    #[test]
    fn test_headless_is_inert() {
        let sink = Arc::new(RecordingSink::new());
        let keeper = UtmKeeper::builder(KeeperConfig::default())
            .environment(Environment::headless().current_url("https://x.test/?utm_source=a"))
            .diagnostics(sink.clone())
            .build();

        assert!(!keeper.persistence_available());
        assert!(!keeper.capture(Some("https://x.test/?utm_source=a")));
        assert_eq!(keeper.get_params(), None);
        assert_eq!(keeper.get_record(), None);
        assert!(!keeper.clear());
        assert_eq!(keeper.append_to_url("https://dest.test/"), "https://dest.test/");
        assert!(keeper.to_object().is_empty());
        assert!(sink.entries().is_empty());
    }

    #[test]
    fn test_keepers_share_storage_key() {
        let substrate = Arc::new(MemorySubstrate::new());
        let a = keeper_with(manual(AttributionMode::FirstTouch), substrate.clone());
        let b = keeper_with(manual(AttributionMode::FirstTouch), substrate);

        a.capture(Some("https://x.test/?utm_source=a"));
        assert_eq!(source(&b).as_deref(), Some("a"));
        assert!(b.clear());
        assert_eq!(a.get_params(), None);
    }
}
