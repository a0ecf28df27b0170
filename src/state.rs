//! Application state shared by all handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, HttpVocabularyApi, MemoryApi, VocabularyApi};
use crate::config::Config;
use crate::practise::PractiseController;
use crate::session::SessionStore;

/// Application state passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,

    /// Owns the browser sessions (practise state + remote session token)
    pub practise: PractiseController,
}

impl AppState {
    pub fn new(config: Config, api: Arc<dyn VocabularyApi>) -> Self {
        let sessions = Arc::new(SessionStore::new(
            config.session_expiry_hours,
            config.feedback_clear_ms,
        ));
        let practise = PractiseController::new(api, sessions, config.log_give_up);
        Self {
            config: Arc::new(config),
            practise,
        }
    }

    /// Build state for `config`: the remote service when a base URL is
    /// configured, otherwise the in-memory demo backend
    pub fn from_config(config: Config) -> Result<Self, ApiError> {
        let api: Arc<dyn VocabularyApi> = match &config.api_base_url {
            Some(base_url) => {
                tracing::info!("Using vocabulary service at {}", base_url);
                Arc::new(HttpVocabularyApi::new(
                    base_url,
                    &config.api_session_cookie,
                    Duration::from_secs(config.api_timeout_secs),
                )?)
            }
            None => {
                tracing::warn!("No vocabulary service configured, running the in-memory demo (tester / 1234)");
                Arc::new(MemoryApi::demo())
            }
        };
        Ok(Self::new(config, api))
    }
}
