//! The five recognized UTM keys and the parameter set keyed by them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A recognized UTM query parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UtmKey {
    Source,
    Medium,
    Campaign,
    Term,
    Content,
}

impl UtmKey {
    /// Every recognized key, in serialization order
    pub const ALL: [UtmKey; 5] = [
        UtmKey::Source,
        UtmKey::Medium,
        UtmKey::Campaign,
        UtmKey::Term,
        UtmKey::Content,
    ];

    /// Query parameter name for this key
    pub fn as_str(self) -> &'static str {
        match self {
            UtmKey::Source => "utm_source",
            UtmKey::Medium => "utm_medium",
            UtmKey::Campaign => "utm_campaign",
            UtmKey::Term => "utm_term",
            UtmKey::Content => "utm_content",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for UtmKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UtmKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UtmKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| format!("not a UTM parameter: {s}"))
    }
}

/// Values captured for the recognized UTM keys.
///
/// Empty strings are never stored, so a set with no populated keys carries
/// no attribution at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawParams", into = "RawParams")]
pub struct ParameterSet {
    values: [Option<String>; 5],
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `set`
    pub fn with(mut self, key: UtmKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Set a value; an empty value clears the key
    pub fn set(&mut self, key: UtmKey, value: impl Into<String>) {
        let value = value.into();
        self.values[key.index()] = if value.is_empty() { None } else { Some(value) };
    }

    pub fn get(&self, key: UtmKey) -> Option<&str> {
        self.values[key.index()].as_deref()
    }

    pub fn remove(&mut self, key: UtmKey) -> Option<String> {
        self.values[key.index()].take()
    }

    pub fn contains(&self, key: UtmKey) -> bool {
        self.values[key.index()].is_some()
    }

    /// Populated keys and their values, in [`UtmKey::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (UtmKey, &str)> + '_ {
        UtmKey::ALL
            .into_iter()
            .filter_map(move |key| self.get(key).map(|value| (key, value)))
    }

    pub fn len(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }

    /// `None` when no key is populated
    pub fn non_empty(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }

    /// Combine two sets; populated keys of `overrides` win
    pub fn merge(&self, overrides: &ParameterSet) -> ParameterSet {
        let mut merged = self.clone();
        for (key, value) in overrides.iter() {
            merged.set(key, value);
        }
        merged
    }
}

/// Wire shape of a parameter set: the conventional `utm_*` names, unknown keys ignored
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utm_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utm_medium: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utm_campaign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utm_term: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    utm_content: Option<String>,
}

impl From<RawParams> for ParameterSet {
    fn from(raw: RawParams) -> Self {
        let mut params = ParameterSet::new();
        let pairs = [
            (UtmKey::Source, raw.utm_source),
            (UtmKey::Medium, raw.utm_medium),
            (UtmKey::Campaign, raw.utm_campaign),
            (UtmKey::Term, raw.utm_term),
            (UtmKey::Content, raw.utm_content),
        ];
        for (key, value) in pairs {
            if let Some(value) = value {
                params.set(key, value);
            }
        }
        params
    }
}

impl From<ParameterSet> for RawParams {
    fn from(params: ParameterSet) -> Self {
        let [utm_source, utm_medium, utm_campaign, utm_term, utm_content] = params.values;
        RawParams {
            utm_source,
            utm_medium,
            utm_campaign,
            utm_term,
            utm_content,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_names_roundtrip() {
        for key in UtmKey::ALL {
            assert_eq!(key.as_str().parse::<UtmKey>().unwrap(), key);
        }
        assert!("utm_id".parse::<UtmKey>().is_err());
    }

    #[test]
    fn test_empty_value_is_not_stored() {
        let mut params = ParameterSet::new().with(UtmKey::Source, "news");
        params.set(UtmKey::Source, "");
        assert!(params.is_empty());
        assert_eq!(params.non_empty(), None);
    }

    #[test]
    fn test_remove_returns_value() {
        let mut params = ParameterSet::new()
            .with(UtmKey::Source, "news")
            .with(UtmKey::Term, "shoes");

        assert_eq!(params.remove(UtmKey::Term), Some("shoes".to_string()));
        assert!(!params.contains(UtmKey::Term));
        assert_eq!(params.remove(UtmKey::Term), None);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_iter_follows_key_order() {
        let params = ParameterSet::new()
            .with(UtmKey::Content, "banner")
            .with(UtmKey::Source, "news")
            .with(UtmKey::Campaign, "spring");

        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![UtmKey::Source, UtmKey::Campaign, UtmKey::Content]);
        assert_eq!(params.len(), 3);
    }

    #[test]
    fn test_merge_override_wins() {
        let base = ParameterSet::new()
            .with(UtmKey::Source, "news")
            .with(UtmKey::Medium, "email");
        let overrides = ParameterSet::new()
            .with(UtmKey::Source, "social")
            .with(UtmKey::Term, "shoes");

        let merged = base.merge(&overrides);
        assert_eq!(merged.get(UtmKey::Source), Some("social"));
        assert_eq!(merged.get(UtmKey::Medium), Some("email"));
        assert_eq!(merged.get(UtmKey::Term), Some("shoes"));
        assert_eq!(merged.get(UtmKey::Campaign), None);
    }

    #[test]
    fn test_serde_uses_conventional_names() {
        let params = ParameterSet::new()
            .with(UtmKey::Source, "news")
            .with(UtmKey::Medium, "email");

        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"utm_source": "news", "utm_medium": "email"})
        );
    }

    #[test]
    fn test_deserialize_ignores_unknown_and_empty() {
        let json = r#"{"utm_source":"news","utm_medium":"","gclid":"abc","utm_id":"7"}"#;
        let params: ParameterSet = serde_json::from_str(json).unwrap();
        assert_eq!(params.get(UtmKey::Source), Some("news"));
        assert!(!params.contains(UtmKey::Medium));
        assert_eq!(params.len(), 1);
    }
}
