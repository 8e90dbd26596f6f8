//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::OnboardingConfig;

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Deliberately holds only configuration: the
/// backend client is constructed fresh per request inside the handlers, so
/// no client state is shared across registrations.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: OnboardingConfig,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: OnboardingConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config }),
        }
    }

    /// Get a reference to the service configuration.
    #[must_use]
    pub fn config(&self) -> &OnboardingConfig {
        &self.inner.config
    }
}
