//! Health report generation: AI first, rule-based composer otherwise.

pub mod fallback;
pub mod prompt;
pub mod validation;

use serde::Serialize;
use serde_json::Value;

use crate::generation::{AiGenerationClient, CancellationToken};
use crate::models::{HealthReport, PatientProfile, SymptomObservation};
use crate::statistics::{self, StatisticsError};

/// A report ready to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DeliveredReport {
    /// Validated AI output, passed through exactly as the model wrote it.
    Generated(Value),
    RuleBased(HealthReport),
}

/// Produce a report for a validated, non-empty observation set.
///
/// AI failure is never surfaced: any generation error, including
/// cancellation, yields the fallback report. The only error is an empty
/// observation set.
pub async fn generate_health_report(
    ai: Option<&AiGenerationClient>,
    observations: &[SymptomObservation],
    profile: &PatientProfile,
    cancel: &CancellationToken,
) -> Result<DeliveredReport, StatisticsError> {
    let stats = statistics::compute(observations)?;

    if let Some(ai) = ai {
        let request = prompt::build_report_request(observations, profile, &stats);
        match ai.generate_report(&request, cancel).await {
            Ok(report) => {
                tracing::info!(logs = stats.total_logs, "Health report generated by AI");
                return Ok(DeliveredReport::Generated(report));
            }
            Err(e) => {
                tracing::info!(error = %e, "AI report unavailable, using rule-based report");
            }
        }
    } else {
        tracing::debug!("AI not configured, using rule-based report");
    }

    Ok(DeliveredReport::RuleBased(fallback::compose(
        observations,
        profile,
        &stats,
    )))
}
