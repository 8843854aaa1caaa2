//! UTM parameter sets and the URL codec that reads and writes them

pub mod codec;
mod diagnostics;
mod params;

pub use codec::{Codec, CodecError};
pub use diagnostics::{
    Diagnostic, DiagnosticKind, DiagnosticSink, RecordingSink, SilentSink, TracingSink,
};
pub use params::{ParameterSet, UtmKey};
