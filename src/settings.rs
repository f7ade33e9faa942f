//! Settings snapshots consumed by the bootstrapper
//!
//! A [`SettingsCascade`] is one snapshot of the merged configuration. Only its
//! final view and its validity are read here.

use std::time::Duration;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::config::DEFAULT_PROVIDER_TIMEOUT_MS;
use crate::intel::error::IntelError;
use crate::intel::language::{LanguageSpec, builtin_language_specs};

pub const PROVIDER_TIMEOUT_KEY: &str = "codeIntel.providerTimeoutMs";
pub const LANGUAGES_KEY: &str = "codeIntel.languages";
pub const DISABLED_LANGUAGES_KEY: &str = "codeIntel.disabledLanguages";

/// Final merged settings, keyed by setting name in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings(IndexMap<String, Value>);

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds settings from a JSON object; any other JSON value is rejected
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map.into_iter().collect())),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Overlays `other` on top of `self`; keys in `other` win
    pub fn merge(&mut self, other: Settings) {
        self.0.extend(other.0);
    }

    pub fn raw(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Typed lookup; a value of the wrong shape reads as unset
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.0.get(key)?;
        serde_json::from_value(value.clone())
            .inspect_err(|e| warn!("Ignoring setting {}: {}", key, e))
            .ok()
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(
            self.get::<u64>(PROVIDER_TIMEOUT_KEY)
                .unwrap_or(DEFAULT_PROVIDER_TIMEOUT_MS),
        )
    }

    /// Configured languages followed by the built-in catalog, minus any
    /// disabled language ids
    pub fn language_catalog(&self) -> Vec<LanguageSpec> {
        let extra: Vec<LanguageSpec> = self.get(LANGUAGES_KEY).unwrap_or_default();
        let disabled: Vec<String> = self.get(DISABLED_LANGUAGES_KEY).unwrap_or_default();

        extra
            .into_iter()
            .chain(builtin_language_specs())
            .filter(|spec| !disabled.contains(&spec.language_id))
            .collect()
    }
}

/// One configuration snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettingsCascade {
    /// Merged view; `None` until every settings subject has loaded
    pub final_settings: Option<Settings>,
    /// Errors reported while loading or merging any subject
    pub errors: Vec<String>,
}

impl SettingsCascade {
    pub fn valid(settings: Settings) -> Self {
        Self {
            final_settings: Some(settings),
            errors: Vec::new(),
        }
    }

    pub fn loading() -> Self {
        Self::default()
    }

    pub fn with_error(error: impl Into<String>) -> Self {
        Self {
            final_settings: None,
            errors: vec![error.into()],
        }
    }

    /// `Ok(Some)` when usable, `Ok(None)` while still loading, and
    /// `ConfigurationInvalid` when the snapshot carries errors
    pub fn validate(&self) -> Result<Option<&Settings>, IntelError> {
        if !self.errors.is_empty() {
            return Err(IntelError::ConfigurationInvalid(self.errors.join("; ")));
        }
        Ok(self.final_settings.as_ref())
    }
}
