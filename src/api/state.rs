use std::sync::Arc;

use crate::services::HybridRecommender;

/// Shared application state
///
/// The recommender is fitted before the server starts and only read
/// afterwards, so it is shared without a lock.
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<HybridRecommender>,
}

impl AppState {
    pub fn new(recommender: HybridRecommender) -> Self {
        Self {
            recommender: Arc::new(recommender),
        }
    }
}
