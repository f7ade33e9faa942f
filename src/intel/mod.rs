// Code-intelligence dispatch core
// - types.rs: Request and result value types
// - language.rs: Language catalog and path → language id derivation
// - selector.rs: Document selector matching
// - provider.rs: Capability provider traits and ProviderSet
// - registry.rs: Provider registry and language resolution
// - normalize.rs: Raw provider output → canonical results
// - dispatch.rs: CodeIntel façade with timeout policy
// - bootstrap.rs: One-time façade construction gated on settings
// - error.rs: Error types

pub mod bootstrap;
pub mod dispatch;
pub mod error;
pub mod language;
pub mod normalize;
pub mod provider;
pub mod registry;
pub mod selector;
pub mod types;

pub use bootstrap::{BootstrapState, Bootstrapper, SettingsReceiver};
pub use dispatch::CodeIntel;
pub use error::IntelError;
pub use provider::{CapabilityKind, ProviderError, ProviderSet};
pub use registry::{LanguageEntry, ProviderFactory, Registry};
