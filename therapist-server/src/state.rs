//! Application state shared across handlers

use std::sync::Arc;

use therapist_core::{SessionProvider, Settings};

/// Shared application state
///
/// Built once at startup and handed to every handler through axum's
/// `State` extractor. Settings are read-only from here on.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    settings: Settings,
    sessions: SessionProvider,
}

impl AppState {
    pub fn new(settings: Settings, sessions: SessionProvider) -> Self {
        Self {
            inner: Arc::new(AppStateInner { settings, sessions }),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn sessions(&self) -> &SessionProvider {
        &self.inner.sessions
    }
}
