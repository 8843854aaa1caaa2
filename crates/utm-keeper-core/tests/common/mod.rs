use std::sync::Arc;
use utm_keeper_core::{AttributionMode, Environment, KeeperConfig, UtmKeeper};
use utm_keeper_store::MemorySubstrate;

pub fn sample_config(mode: AttributionMode) -> KeeperConfig {
    KeeperConfig {
        mode,
        expiration_days: 30,
        storage_key: "utm_keeper".to_string(),
        auto_capture: true,
        capture_url: None,
    }
}

/// Environment sharing `substrate`, as if the page were at `url`
pub fn page(substrate: &Arc<MemorySubstrate>, url: &str) -> Environment {
    Environment::with_substrate(substrate.clone()).current_url(url)
}

pub fn stored_source(keeper: &UtmKeeper) -> Option<String> {
    keeper
        .get_params()
        .and_then(|p| p.get(utm_keeper_core::UtmKey::Source).map(str::to_string))
}
