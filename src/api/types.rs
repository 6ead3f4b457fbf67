//! Shared state for the API router.

use std::sync::Arc;

use crate::config::ServiceConfig;
use crate::generation::{AiGenerationClient, GenerationError};

/// Shared context for all API routes.
///
/// `ai` is `None` when no API key is configured; handlers then go straight
/// to the rule-based paths.
#[derive(Clone)]
pub struct ApiContext {
    pub config: Arc<ServiceConfig>,
    pub ai: Option<Arc<AiGenerationClient>>,
}

impl ApiContext {
    /// Context with a Gemini-backed client when the config carries a key.
    pub fn new(config: ServiceConfig) -> Result<Self, GenerationError> {
        let ai = AiGenerationClient::from_config(&config)?.map(Arc::new);
        Ok(Self::with_client(config, ai))
    }

    /// Context with an explicit client (or none).
    pub fn with_client(config: ServiceConfig, ai: Option<Arc<AiGenerationClient>>) -> Self {
        if ai.is_none() {
            tracing::info!("AI generation disabled, all answers are rule-based");
        }
        Self {
            config: Arc::new(config),
            ai,
        }
    }
}
