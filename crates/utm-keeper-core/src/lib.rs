//! Attribution policy: when a newly seen UTM set replaces the stored one

mod config;
pub mod dispatch;
mod environment;
mod error;
pub mod global;
mod keeper;

pub use config::{AttributionMode, ConfigError, ConfigOverride, KeeperConfig};
pub use dispatch::{
    Dispatch, DispatchOptions, RequestDescriptor, RequestOptions, RequestTarget, UtmDispatch,
};
pub use environment::Environment;
pub use error::KeeperError;
pub use keeper::{CaptureOutcome, KeeperBuilder, UtmKeeper};

#[cfg(feature = "reqwest")]
pub use dispatch::{ReqwestDispatchError, ReqwestDispatcher};

pub use utm_keeper_params::{ParameterSet, UtmKey};
pub use utm_keeper_store::StoredRecord;
