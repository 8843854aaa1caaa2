//! Expiring persistence for captured attribution records

mod clock;
mod file;
mod paths;
mod record;
mod store;
mod substrate;

pub use clock::{Clock, ManualClock, SystemClock};
pub use file::{atomic_write, FileSubstrate};
pub use paths::Paths;
pub use record::{StoredRecord, MILLIS_PER_DAY};
pub use store::{AttributionStore, StoreError};
pub use substrate::{MemorySubstrate, Substrate, SubstrateError};
