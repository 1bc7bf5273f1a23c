use std::sync::Arc;

use crate::services::RecommendationEngine;

/// Shared application state
///
/// The engine is read-only after startup, so no lock is needed.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<RecommendationEngine>,
}

impl AppState {
    pub fn new(engine: RecommendationEngine) -> Self {
        Self {
            engine: Arc::new(engine),
        }
    }
}
