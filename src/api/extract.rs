//! JSON body extractor whose rejection is an [`ApiError`].
//!
//! Unlike `axum::Json`, no `Content-Type` header is required and every
//! failure (unreadable body, invalid JSON, wrong shape) becomes a 400 with
//! the flat `{ "error": … }` body.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::api::error::ApiError;

#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {}", e.body_text())))?;

        serde_json::from_slice(&bytes)
            .map(ApiJson)
            .map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
    }
}
