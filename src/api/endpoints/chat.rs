//! `POST /api/chat`: conversational answers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::endpoints::run_cancellable;
use crate::api::extract::ApiJson;
use crate::api::types::ApiContext;
use crate::chat::{self, ChatTurn};
use crate::models::PatientProfile;

pub const MESSAGE_REQUIRED: &str = "Message is required";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "null_history")]
    pub history: Vec<ChatTurn>,
    #[serde(default)]
    pub user_context: Option<PatientProfile>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub message: String,
}

fn null_history<'de, D>(deserializer: D) -> Result<Vec<ChatTurn>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<Vec<ChatTurn>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `POST /api/chat`
///
/// Always 200 once the message is present: AI failure degrades to the
/// offline responder.
pub async fn send(
    State(ctx): State<ApiContext>,
    ApiJson(req): ApiJson<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let ChatRequest {
        message,
        history,
        user_context,
    } = req;
    let message = message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(MESSAGE_REQUIRED.into()))?;

    let ai = ctx.ai.clone();
    let answer = run_cancellable(|cancel| async move {
        chat::respond(ai.as_deref(), &message, &history, user_context.as_ref(), &cancel).await
    })
    .await?;

    Ok(Json(ChatResponse { message: answer }))
}
