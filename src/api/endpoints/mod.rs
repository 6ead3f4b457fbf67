//! API endpoint handlers.

pub mod chat;
pub mod health;
pub mod health_report;

use std::future::Future;

use crate::api::error::ApiError;
use crate::generation::CancellationToken;

/// Run request work on its own task, handing it a cancellation token.
///
/// If the handler future is dropped first (client disconnect), the guard
/// cancels the token and the detached task stops at its next checkpoint.
pub(crate) async fn run_cancellable<T, F, Fut>(work: F) -> Result<T, ApiError>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
{
    let cancel = CancellationToken::new();
    let guard = cancel.drop_guard();
    let outcome = tokio::spawn(work(cancel)).await;
    guard.disarm();
    outcome.map_err(|e| ApiError::Internal(format!("Request task failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn completed_work_returns_its_output() {
        let value = run_cancellable(|cancel| async move { cancel.is_cancelled() })
            .await
            .unwrap();
        assert!(!value);
    }

    #[tokio::test]
    async fn dropped_handler_cancels_detached_work() {
        let (tx, rx) = oneshot::channel();
        let handler = run_cancellable(|cancel| async move {
            cancel.cancelled().await;
            let _ = tx.send(());
        });

        assert!(tokio::time::timeout(Duration::from_millis(50), handler)
            .await
            .is_err());
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .expect("detached work should observe cancellation")
            .unwrap();
    }

    #[tokio::test]
    async fn panicking_work_is_internal_error() {
        let outcome = run_cancellable(|_| async {
            if true {
                panic!("report task exploded");
            }
        })
        .await;
        assert!(matches!(outcome, Err(ApiError::Internal(_))));
    }
}
