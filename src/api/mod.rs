//! HTTP API.
//!
//! Routes are nested under `/api/`:
//! - `POST /api/health-report`: structured report from symptom logs
//! - `POST /api/chat`: conversational answer
//! - `GET /api/health`: liveness
//!
//! Every request passes through the request-logging middleware. Error
//! bodies are flat: `{ "error": "<message>" }`.

pub mod endpoints;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError};
pub use types::ApiContext;
