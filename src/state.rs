use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Store;
use crate::images::ImageStore;
use crate::middleware::SessionKeys;

/// Shared handles given to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub images: Arc<dyn ImageStore>,
    pub sessions: Arc<SessionKeys>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, images: Arc<dyn ImageStore>) -> Self {
        let sessions = Arc::new(SessionKeys::from_config(&config.security));
        Self {
            config: Arc::new(config),
            store,
            images,
            sessions,
        }
    }
}
