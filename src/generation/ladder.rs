//! Ordered model-candidate ladder.
//!
//! Each candidate gets exactly one attempt, bounded by the per-attempt
//! timeout. Any failure moves to the next candidate; cancellation stops
//! the ladder immediately.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::cancel::CancellationToken;
use super::gemini::GeminiTransport;
use super::types::{GenerateContentRequest, GenerateContentResponse, LlmTransport};
use super::GenerationError;
use crate::config::ServiceConfig;
use crate::report::validation::parse_report_completion;

enum LadderState<T> {
    Attempting(usize),
    Succeeded(T),
    Exhausted,
}

/// Generation client over a transport and an ordered model list.
pub struct AiGenerationClient {
    transport: Arc<dyn LlmTransport>,
    models: Vec<String>,
    attempt_timeout: Duration,
}

impl AiGenerationClient {
    pub fn new(
        transport: Arc<dyn LlmTransport>,
        models: Vec<String>,
        attempt_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            models,
            attempt_timeout,
        }
    }

    /// Gemini-backed client, or `None` when no API key is configured.
    pub fn from_config(config: &ServiceConfig) -> Result<Option<Self>, GenerationError> {
        let Some(key) = config.api_key.clone() else {
            return Ok(None);
        };
        let transport =
            GeminiTransport::new(&config.api_base_url, key, config.attempt_timeout)?;
        Ok(Some(Self::new(
            Arc::new(transport),
            config.model_candidates.clone(),
            config.attempt_timeout,
        )))
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    /// Free-text completion (chat). Blank text counts as a failed attempt.
    pub async fn generate_text(
        &self,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<String, GenerationError> {
        self.run(request, cancel, |response| {
            response
                .first_text()
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
                .ok_or(GenerationError::EmptyCompletion)
        })
        .await
    }

    /// Structured report, as the JSON the model produced. A completion that
    /// fails validation counts as a failed attempt and the next candidate
    /// is tried.
    pub async fn generate_report(
        &self,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<Value, GenerationError> {
        self.run(request, cancel, |response| {
            let text = response
                .first_text()
                .ok_or(GenerationError::EmptyCompletion)?;
            parse_report_completion(text)
        })
        .await
    }

    async fn run<T, F>(
        &self,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
        accept: F,
    ) -> Result<T, GenerationError>
    where
        F: Fn(GenerateContentResponse) -> Result<T, GenerationError>,
    {
        if self.models.is_empty() {
            return Err(GenerationError::NoModelCandidates);
        }

        let mut state = LadderState::Attempting(0);
        loop {
            state = match state {
                LadderState::Attempting(index) => match self.models.get(index) {
                    None => LadderState::Exhausted,
                    Some(model) => {
                        if cancel.is_cancelled() {
                            return Err(GenerationError::Cancelled);
                        }
                        let attempt = index + 1;
                        tracing::debug!(model = %model, attempt, "Requesting AI completion");

                        match self.attempt(model, request, cancel).await.and_then(&accept) {
                            Ok(value) => {
                                tracing::info!(model = %model, attempt, "AI completion accepted");
                                LadderState::Succeeded(value)
                            }
                            Err(e) if !e.advances_ladder() => {
                                tracing::info!(
                                    model = %model,
                                    attempt,
                                    error = %e,
                                    "AI generation stopped"
                                );
                                return Err(e);
                            }
                            Err(e) => {
                                tracing::warn!(
                                    model = %model,
                                    attempt,
                                    error = %e,
                                    "AI attempt failed, trying next candidate"
                                );
                                LadderState::Attempting(attempt)
                            }
                        }
                    }
                },
                LadderState::Succeeded(value) => return Ok(value),
                LadderState::Exhausted => {
                    tracing::warn!(attempts = self.models.len(), "All AI model candidates failed");
                    return Err(GenerationError::Exhausted {
                        attempts: self.models.len(),
                    });
                }
            };
        }
    }

    async fn attempt(
        &self,
        model: &str,
        request: &GenerateContentRequest,
        cancel: &CancellationToken,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let call = self.transport.generate_content(model, request);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            outcome = tokio::time::timeout(self.attempt_timeout, call) => match outcome {
                Ok(result) => result,
                Err(_) => Err(GenerationError::Timeout(self.attempt_timeout.as_secs())),
            },
        }
    }
}
