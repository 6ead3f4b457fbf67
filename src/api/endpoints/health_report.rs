//! `POST /api/health-report`: structured report for a provider visit.

use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::Value;

use crate::api::endpoints::run_cancellable;
use crate::api::error::ApiError;
use crate::api::extract::ApiJson;
use crate::api::types::ApiContext;
use crate::models::{PatientProfile, SymptomObservation};
use crate::report::{self, DeliveredReport};

pub const LOGS_REQUIRED: &str = "logs must be a non-empty array of symptom entries";
pub const PROFILE_REQUIRED: &str = "userProfile is required";

/// Raw request. Fields stay untyped until validation so that every
/// rejection can name the offending field.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub logs: Option<Value>,
    #[serde(default)]
    pub user_profile: Option<Value>,
}

impl ReportRequest {
    /// Typed observations and profile, or a 400 naming the field.
    pub fn validate(self) -> Result<(Vec<SymptomObservation>, PatientProfile), ApiError> {
        let logs = parse_logs(self.logs)?;
        let profile = parse_profile(self.user_profile)?;
        Ok((logs, profile))
    }
}

fn parse_logs(value: Option<Value>) -> Result<Vec<SymptomObservation>, ApiError> {
    let items = match value {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Array(_)) | Some(Value::Null) | None => {
            return Err(ApiError::BadRequest(LOGS_REQUIRED.into()))
        }
        Some(_) => return Err(ApiError::BadRequest("logs must be an array".into())),
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let obs: SymptomObservation = serde_json::from_value(item)
                .map_err(|e| ApiError::BadRequest(format!("Invalid logs[{index}]: {e}")))?;
            if let Some(field) = obs.out_of_range_field() {
                return Err(ApiError::BadRequest(format!(
                    "Invalid logs[{index}]: {field} out of range"
                )));
            }
            Ok(obs)
        })
        .collect()
}

fn parse_profile(value: Option<Value>) -> Result<PatientProfile, ApiError> {
    match value {
        Some(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|e| ApiError::BadRequest(format!("Invalid userProfile: {e}"))),
        Some(Value::Null) | None => Err(ApiError::BadRequest(PROFILE_REQUIRED.into())),
        Some(_) => Err(ApiError::BadRequest("userProfile must be an object".into())),
    }
}

/// `POST /api/health-report`
///
/// Always 200 once the input validates: AI failure degrades to the
/// rule-based report.
pub async fn generate(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<ReportRequest>,
) -> Result<Json<DeliveredReport>, ApiError> {
    let (logs, profile) = req.validate()?;

    let ai = ctx.ai.clone();
    let report = run_cancellable(|cancel| async move {
        report::generate_health_report(ai.as_deref(), &logs, &profile, &cancel).await
    })
    .await??;

    Ok(Json(report))
}
