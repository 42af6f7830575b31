//! Shared application state for axum handlers.

use std::sync::Arc;

use webthing_app::addressing::Addressing;

/// Application state shared across all axum handlers.
///
/// `Clone` is implemented manually so only the `Arc` is cloned.
pub struct AppState {
    /// Immutable routing table over the served things.
    pub addressing: Arc<Addressing>,
}

impl Clone for AppState {
    fn clone(&self) -> Self {
        Self {
            addressing: Arc::clone(&self.addressing),
        }
    }
}

impl AppState {
    #[must_use]
    pub fn new(addressing: Addressing) -> Self {
        Self {
            addressing: Arc::new(addressing),
        }
    }
}
