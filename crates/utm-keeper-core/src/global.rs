//! Process-wide shared keeper.
//!
//! Lifecycle: [`init`] installs a keeper and returns a handle to it. Any
//! later call reuses that keeper until [`init`] or [`reset`] runs again. If
//! nothing was installed, the first call builds a keeper from the default
//! config in a headless environment, where every operation is inert. Hosts
//! with persistence must call [`init`] first.

use crate::config::{ConfigOverride, KeeperConfig};
use crate::dispatch::{Dispatch, UtmDispatch};
use crate::environment::Environment;
use crate::keeper::UtmKeeper;
use std::collections::BTreeMap;
use std::sync::RwLock;
use utm_keeper_params::ParameterSet;
use utm_keeper_store::StoredRecord;

static SHARED: RwLock<Option<UtmKeeper>> = RwLock::new(None);

/// Build a keeper and make it the shared instance
pub fn init(config: KeeperConfig, environment: Environment) -> UtmKeeper {
    install(UtmKeeper::new(config, environment))
}

/// Make an already-built keeper the shared instance
pub fn install(keeper: UtmKeeper) -> UtmKeeper {
    *SHARED
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(keeper.clone());
    keeper
}

/// The shared keeper, built on first use if none was installed
pub fn instance() -> UtmKeeper {
    if let Some(keeper) = SHARED
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .as_ref()
    {
        return keeper.clone();
    }

    SHARED
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .get_or_insert_with(|| UtmKeeper::new(KeeperConfig::default(), Environment::headless()))
        .clone()
}

/// Drop the shared keeper; the next call builds a fresh one
pub fn reset() {
    *SHARED
        .write()
        .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
}

pub fn capture(source_url: Option<&str>) -> bool {
    instance().capture(source_url)
}

pub fn get_params() -> Option<ParameterSet> {
    instance().get_params()
}

pub fn get_record() -> Option<StoredRecord> {
    instance().get_record()
}

pub fn has_stored_params() -> bool {
    instance().has_stored_params()
}

pub fn clear() -> bool {
    instance().clear()
}

pub fn append_to_url(destination: &str) -> String {
    instance().append_to_url(destination)
}

pub fn to_object() -> BTreeMap<String, String> {
    instance().to_object()
}

pub fn decorate_dispatcher<D: Dispatch>(dispatcher: D) -> UtmDispatch<D> {
    instance().decorate_dispatcher(dispatcher)
}

pub fn update_config(overrides: ConfigOverride) {
    instance().update_config(overrides)
}
