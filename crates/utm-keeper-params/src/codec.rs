//! Reading UTM parameters out of URLs and writing them back

use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink, TracingSink};
use crate::params::{ParameterSet, UtmKey};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

fn parse(url: &str) -> Result<Url, CodecError> {
    Url::parse(url).map_err(|source| CodecError::InvalidUrl {
        url: url.to_string(),
        source,
    })
}

/// Extract the recognized parameters from a URL's query.
///
/// Only the first occurrence of each key counts, and it counts only when
/// non-empty. Returns `Ok(None)` when no recognized key carries a value.
pub fn try_extract(url: &str) -> Result<Option<ParameterSet>, CodecError> {
    let parsed = parse(url)?;
    let mut params = ParameterSet::new();

    for key in UtmKey::ALL {
        let first = parsed
            .query_pairs()
            .find(|(name, _)| name == key.as_str())
            .map(|(_, value)| value);
        if let Some(value) = first {
            params.set(key, value.into_owned());
        }
    }

    Ok(params.non_empty())
}

/// Add `params` to the URL's query without touching keys already present.
///
/// The input string is returned as-is when there is nothing to add.
pub fn try_append_to_url(url: &str, params: &ParameterSet) -> Result<String, CodecError> {
    let mut parsed = parse(url)?;

    let present: HashSet<String> = parsed
        .query_pairs()
        .map(|(name, _)| name.into_owned())
        .collect();
    let missing: Vec<(UtmKey, &str)> = params
        .iter()
        .filter(|(key, _)| !present.contains(key.as_str()))
        .collect();

    if missing.is_empty() {
        return Ok(url.to_string());
    }

    {
        let mut query = parsed.query_pairs_mut();
        for (key, value) in missing {
            query.append_pair(key.as_str(), value);
        }
    }

    Ok(parsed.into())
}

/// `key=value` pairs joined by `&`, percent-encoded, in key order
pub fn to_query_string(params: &ParameterSet) -> String {
    params
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                urlencoding::encode(key.as_str()),
                urlencoding::encode(value)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Plain name/value mapping for request bodies and headers
pub fn to_map(params: &ParameterSet) -> BTreeMap<String, String> {
    params
        .iter()
        .map(|(key, value)| (key.as_str().to_string(), value.to_string()))
        .collect()
}

/// Fail-soft front end over the codec functions.
///
/// Parse failures become neutral values and are reported to the sink.
#[derive(Clone)]
pub struct Codec {
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl Codec {
    pub fn new(diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        Self { diagnostics }
    }

    pub fn extract(&self, url: &str) -> Option<ParameterSet> {
        match try_extract(url) {
            Ok(params) => params,
            Err(e) => {
                self.diagnostics
                    .report(Diagnostic::new(DiagnosticKind::InvalidUrl, e.to_string()));
                None
            }
        }
    }

    pub fn append_to_url(&self, url: &str, params: &ParameterSet) -> String {
        match try_append_to_url(url, params) {
            Ok(appended) => appended,
            Err(e) => {
                self.diagnostics.report(Diagnostic::new(
                    DiagnosticKind::InvalidUrl,
                    format!("failed to append UTM parameters: {e}"),
                ));
                url.to_string()
            }
        }
    }
}

impl Default for Codec {
    fn default() -> Self {
        Self::new(Arc::new(TracingSink))
    }
}
