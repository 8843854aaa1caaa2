pub mod append;
pub mod capture;
pub mod clear;
pub mod config;
pub mod fetch;
pub mod params;
pub mod show;
pub mod version;

use std::path::Path;
use std::sync::Arc;
use utm_keeper_core::{ConfigOverride, Environment, KeeperConfig, UtmKeeper};
use utm_keeper_store::{FileSubstrate, Paths};

/// Resolved state directory and effective configuration shared by commands
pub struct Context {
    pub paths: Paths,
    pub config: KeeperConfig,
}

impl Context {
    /// config.json from the state directory, then flag overrides on top
    pub fn load(dir: Option<&Path>, overrides: ConfigOverride) -> anyhow::Result<Self> {
        let paths = match dir {
            Some(dir) => Paths::at(dir),
            None => Paths::new()?,
        };
        let config = KeeperConfig::load(&paths.config_file())?.merged(overrides);
        tracing::debug!(root = %paths.root.display(), mode = %config.mode, "loaded context");
        Ok(Self { paths, config })
    }

    pub fn keeper(&self) -> UtmKeeper {
        let substrate = Arc::new(FileSubstrate::new(self.paths.records_dir()));
        UtmKeeper::new(self.config.clone(), Environment::with_substrate(substrate))
    }
}
