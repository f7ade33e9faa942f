use std::time::Duration;

use thiserror::Error;

use crate::intel::provider::{CapabilityKind, ProviderError};

#[derive(Debug, Error)]
pub enum IntelError {
    #[error("Configuration is not valid: {0}")]
    ConfigurationInvalid(String),

    #[error("Configuration source closed before a valid snapshot arrived")]
    ConfigurationUnavailable,

    #[error("Failed to construct providers for {language}: {source}")]
    ProviderConstructionFailed {
        language: String,
        #[source]
        source: ProviderError,
    },

    #[error("{capability} provider for {language} took more than {}ms", .timeout.as_millis())]
    ProviderTimeout {
        capability: CapabilityKind,
        language: String,
        timeout: Duration,
    },

    #[error("{capability} provider for {language} failed: {source}")]
    Provider {
        capability: CapabilityKind,
        language: String,
        #[source]
        source: ProviderError,
    },
}
