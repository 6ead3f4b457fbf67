//! HTTP server lifecycle.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Handle to a running API server.
pub struct ApiServer {
    /// Address actually bound (resolves port 0).
    pub local_addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

/// Start the API server on `bind_addr` (port 0 picks an ephemeral port).
pub async fn start_server(
    ctx: ApiContext,
    bind_addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr,
            source,
        })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = api_router(ctx);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        local_addr: addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::ServiceConfig;
    use crate::generation::{AiGenerationClient, MockOutcome, MockTransport};

    fn local() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    async fn start() -> ApiServer {
        let ctx = ApiContext::with_client(ServiceConfig::default(), None);
        start_server(ctx, local()).await.expect("server should start")
    }

    #[tokio::test]
    async fn start_and_stop_server() {
        let mut server = start().await;
        assert!(server.local_addr.port() > 0);

        let url = format!("http://{}/api/health", server.local_addr);
        let resp = reqwest::get(&url).await.unwrap();
        assert!(resp.status().is_success());

        server.shutdown();
        tokio::time::timeout(Duration::from_secs(2), server.wait())
            .await
            .expect("server should stop");
    }

    #[tokio::test]
    async fn serves_chat_over_http() {
        let mut server = start().await;
        let url = format!("http://{}/api/chat", server.local_addr);

        let resp = reqwest::Client::new()
            .post(&url)
            .json(&serde_json::json!({ "message": "I have cramps" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["message"].as_str().unwrap().to_lowercase().contains("pain"));

        server.shutdown();
    }

    #[tokio::test]
    async fn client_disconnect_stops_generation() {
        let mock = Arc::new(MockTransport::always(MockOutcome::Hang));
        let ai = AiGenerationClient::new(
            mock.clone(),
            vec!["m1".into(), "m2".into(), "m3".into()],
            Duration::from_millis(300),
        );
        let ctx = ApiContext::with_client(ServiceConfig::default(), Some(Arc::new(ai)));
        let mut server = start_server(ctx, local()).await.unwrap();

        let result = reqwest::Client::new()
            .post(format!("http://{}/api/chat", server.local_addr))
            .timeout(Duration::from_millis(100))
            .json(&serde_json::json!({ "message": "hello" }))
            .send()
            .await;
        assert!(result.is_err());

        // Uncancelled, the ladder would have tried every model by now.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert_eq!(mock.call_count(), 1);

        server.shutdown();
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let server = start().await;
        let ctx = ApiContext::with_client(ServiceConfig::default(), None);

        let err = start_server(ctx, server.local_addr)
            .await
            .err()
            .expect("port in use");
        assert!(matches!(err, ServerError::Bind { .. }));
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start().await;
        server.shutdown();
        server.shutdown();
    }
}
