//! One-time construction of the dispatch façade
//!
//! The façade is built from the first settings snapshot that passes
//! validation and then shared by every caller for the rest of the process.

use std::sync::{Arc, Mutex};

use tokio::sync::{OnceCell, watch};
use tracing::{debug, info, warn};

use crate::intel::dispatch::CodeIntel;
use crate::intel::error::IntelError;
use crate::intel::registry::ProviderFactory;
use crate::settings::{Settings, SettingsCascade};

/// Stream of settings snapshots; `None` until the first one is published
pub type SettingsReceiver = watch::Receiver<Option<SettingsCascade>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Uninitialized,
    AwaitingValidConfig,
    Ready,
}

/// Lazily builds [`CodeIntel`] exactly once.
///
/// Concurrent first callers share one in-flight construction. A snapshot that
/// fails validation fails the in-flight request and returns the state to
/// [`BootstrapState::Uninitialized`], so the next request retries. Snapshots
/// published after the façade is ready are ignored.
pub struct Bootstrapper {
    settings: SettingsReceiver,
    factory: Arc<dyn ProviderFactory>,
    intel: OnceCell<Arc<CodeIntel>>,
    state: Mutex<BootstrapState>,
}

impl Bootstrapper {
    pub fn new(settings: SettingsReceiver, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            settings,
            factory,
            intel: OnceCell::new(),
            state: Mutex::new(BootstrapState::Uninitialized),
        }
    }

    pub fn state(&self) -> BootstrapState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    /// The façade if construction has already finished
    pub fn get_if_ready(&self) -> Option<Arc<CodeIntel>> {
        self.intel.get().cloned()
    }

    /// Returns the façade, waiting for a valid settings snapshot on first use
    pub async fn get(&self) -> Result<Arc<CodeIntel>, IntelError> {
        let intel = self.intel.get_or_try_init(|| self.initialise()).await?;
        Ok(Arc::clone(intel))
    }

    async fn initialise(&self) -> Result<Arc<CodeIntel>, IntelError> {
        self.set_state(BootstrapState::AwaitingValidConfig);

        match self.wait_for_settings().await {
            Ok(settings) => {
                let intel = CodeIntel::from_settings(&settings, self.factory.as_ref());
                self.set_state(BootstrapState::Ready);
                let languages: Vec<&str> = intel
                    .registry()
                    .specs()
                    .map(|spec| spec.language_id.as_str())
                    .collect();
                info!("Code intelligence ready for {}", languages.join(", "));
                Ok(Arc::new(intel))
            }
            Err(e) => {
                self.set_state(BootstrapState::Uninitialized);
                warn!("Code intelligence construction failed: {}", e);
                Err(e)
            }
        }
    }

    async fn wait_for_settings(&self) -> Result<Settings, IntelError> {
        let mut receiver = self.settings.clone();

        loop {
            let snapshot = receiver.borrow_and_update().clone();
            let settings = snapshot
                .as_ref()
                .map(SettingsCascade::validate)
                .transpose()?
                .flatten();
            if let Some(settings) = settings {
                return Ok(settings.clone());
            }

            debug!("Waiting for a valid settings snapshot");
            receiver
                .changed()
                .await
                .map_err(|_| IntelError::ConfigurationUnavailable)?;
        }
    }

    fn set_state(&self, next: BootstrapState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::future::join_all;
    use serde_json::json;

    use super::*;
    use crate::intel::language::builtin_language_specs;
    use crate::intel::provider::ProviderSet;
    use crate::intel::registry::MockProviderFactory;
    use crate::settings::PROVIDER_TIMEOUT_KEY;

    fn factory(expected_builds: usize) -> Arc<dyn ProviderFactory> {
        let mut factory = MockProviderFactory::new();
        factory
            .expect_create()
            .times(expected_builds)
            .returning(|_| Ok(ProviderSet::empty()));
        Arc::new(factory)
    }

    fn valid_with_timeout(ms: u64) -> Option<SettingsCascade> {
        let mut settings = Settings::new();
        settings.insert(PROVIDER_TIMEOUT_KEY, json!(ms));
        Some(SettingsCascade::valid(settings))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    #[tokio::test]
    async fn concurrent_first_callers_share_one_construction() {
        let (tx, rx) = watch::channel(None);
        let bootstrapper = Arc::new(Bootstrapper::new(
            rx,
            factory(builtin_language_specs().len()),
        ));
        assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let bootstrapper = Arc::clone(&bootstrapper);
                tokio::spawn(async move { bootstrapper.get().await })
            })
            .collect();

        settle().await;
        assert_eq!(bootstrapper.state(), BootstrapState::AwaitingValidConfig);
        assert!(bootstrapper.get_if_ready().is_none());

        tx.send(valid_with_timeout(500)).unwrap();

        let results: Vec<Arc<CodeIntel>> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .collect();

        let first = &results[0];
        assert!(results.iter().all(|intel| Arc::ptr_eq(intel, first)));
        assert_eq!(bootstrapper.state(), BootstrapState::Ready);
    }

    #[tokio::test]
    async fn loading_snapshots_are_skipped() {
        let (tx, rx) = watch::channel(None);
        let bootstrapper = Arc::new(Bootstrapper::new(
            rx,
            factory(builtin_language_specs().len()),
        ));

        let pending = {
            let bootstrapper = Arc::clone(&bootstrapper);
            tokio::spawn(async move { bootstrapper.get().await })
        };

        tx.send(Some(SettingsCascade::loading())).unwrap();
        settle().await;
        assert!(!pending.is_finished());
        assert_eq!(bootstrapper.state(), BootstrapState::AwaitingValidConfig);

        tx.send(valid_with_timeout(750)).unwrap();
        let intel = pending.await.unwrap().unwrap();

        assert_eq!(intel.timeout(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn invalid_snapshot_fails_request_and_allows_retry() {
        let (tx, rx) = watch::channel(Some(SettingsCascade::with_error("unexpected token")));
        let bootstrapper = Bootstrapper::new(rx, factory(builtin_language_specs().len()));

        let first = bootstrapper.get().await;
        assert!(matches!(first, Err(IntelError::ConfigurationInvalid(_))));
        assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);

        tx.send(valid_with_timeout(100)).unwrap();
        let second = bootstrapper.get().await.unwrap();

        assert_eq!(second.timeout(), Duration::from_millis(100));
        assert_eq!(bootstrapper.state(), BootstrapState::Ready);
    }

    #[tokio::test]
    async fn closed_settings_source_fails_request() {
        let (tx, rx) = watch::channel(None);
        let bootstrapper = Bootstrapper::new(rx, factory(0));
        drop(tx);

        let result = bootstrapper.get().await;

        assert!(matches!(result, Err(IntelError::ConfigurationUnavailable)));
        assert_eq!(bootstrapper.state(), BootstrapState::Uninitialized);
    }

    #[tokio::test]
    async fn snapshots_after_ready_are_ignored() {
        let (tx, rx) = watch::channel(valid_with_timeout(100));
        let bootstrapper = Bootstrapper::new(rx, factory(builtin_language_specs().len()));

        let first = bootstrapper.get().await.unwrap();
        tx.send(valid_with_timeout(9000)).unwrap();
        let second = bootstrapper.get().await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.timeout(), Duration::from_millis(100));
    }
}
