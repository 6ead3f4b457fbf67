//! Upstream generative-AI access: wire types, the HTTP transport, and the
//! model-candidate ladder that tries each configured model once.

pub mod cancel;
pub mod gemini;
pub mod ladder;
pub mod sanitize;
pub mod types;

pub use cancel::*;
pub use gemini::*;
pub use ladder::*;
pub use types::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("AI service is not reachable at {0}")]
    Connection(String),

    #[error("AI request timed out after {0}s")]
    Timeout(u64),

    #[error("AI service returned error (status {status}): {body}")]
    UpstreamStatus { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Response parsing error: {0}")]
    ResponseParsing(String),

    #[error("AI returned no completion text")]
    EmptyCompletion,

    #[error("AI report failed validation: {0}")]
    InvalidReport(String),

    #[error("Generation cancelled")]
    Cancelled,

    #[error("All {attempts} model candidates failed")]
    Exhausted { attempts: usize },

    #[error("No model candidates configured")]
    NoModelCandidates,
}

impl GenerationError {
    /// Whether the ladder should move on to the next model candidate.
    pub fn advances_ladder(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_cancellation_stops_the_ladder() {
        assert!(!GenerationError::Cancelled.advances_ladder());
        assert!(GenerationError::Timeout(30).advances_ladder());
        assert!(GenerationError::EmptyCompletion.advances_ladder());
        assert!(GenerationError::UpstreamStatus {
            status: 404,
            body: String::new()
        }
        .advances_ladder());
    }

    #[test]
    fn error_messages_are_descriptive() {
        let err = GenerationError::UpstreamStatus {
            status: 429,
            body: "quota".into(),
        };
        assert_eq!(err.to_string(), "AI service returned error (status 429): quota");
        assert_eq!(
            GenerationError::Exhausted { attempts: 3 }.to_string(),
            "All 3 model candidates failed"
        );
    }
}
