//! Prompt Execution
//!
//! Sends a rendered prompt to a text-generation endpoint.
//!
//! ## Modules
//!
//! - `http`: JSON-over-HTTP client for hosted inference endpoints

mod http;

pub use http::HttpInferenceClient;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tokio::time::sleep;
use tracing::warn;

use crate::types::{Result, ShelfError};

/// Generated text with timing
#[derive(Debug, Clone, Serialize)]
pub struct InferenceOutput {
    pub text: String,
    pub elapsed_ms: u64,
}

#[async_trait]
pub trait InferenceClient: Send + Sync {
    /// Run a fully rendered prompt
    async fn run(&self, prompt: &str) -> Result<InferenceOutput>;

    /// Endpoint or model label for display
    fn name(&self) -> &str;
}

/// Run `attempt`, retrying exactly once when the model reports it is still
/// loading. Waits for the error's `retry_after`, else `default_wait`.
pub async fn with_loading_retry<F, Fut, T>(default_wait: Duration, mut attempt: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match attempt().await {
        Err(ShelfError::Inference(err)) if err.is_auto_retryable() => {
            let wait = err.retry_after.unwrap_or(default_wait);
            warn!(
                wait_secs = wait.as_secs(),
                "Model is loading, retrying once"
            );
            sleep(wait).await;
            attempt().await
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ErrorCategory, InferenceError};
    use std::sync::atomic::{AtomicU32, Ordering};

    fn loading() -> ShelfError {
        InferenceError::new(ErrorCategory::ModelLoading, "model is currently loading")
            .retry_after(Duration::ZERO)
            .into()
    }

    #[tokio::test]
    async fn test_retries_once_when_loading() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result = with_loading_retry(Duration::ZERO, move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(loading())
            } else {
                Ok("done")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_second_loading_error_is_returned() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_loading_retry(Duration::ZERO, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(loading())
        })
        .await;

        assert!(matches!(
            result,
            Err(ShelfError::Inference(InferenceError {
                category: ErrorCategory::ModelLoading,
                ..
            }))
        ));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let result: Result<()> = with_loading_retry(Duration::ZERO, move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(InferenceError::new(ErrorCategory::Auth, "bad token").into())
        })
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    struct EchoClient;

    #[async_trait]
    impl InferenceClient for EchoClient {
        async fn run(&self, prompt: &str) -> Result<InferenceOutput> {
            Ok(InferenceOutput {
                text: prompt.to_uppercase(),
                elapsed_ms: 0,
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[tokio::test]
    async fn test_client_trait_object() {
        let client: Box<dyn InferenceClient> = Box::new(EchoClient);
        let output = client.run("hello").await.unwrap();
        assert_eq!(output.text, "HELLO");
        assert_eq!(client.name(), "echo");
    }
}
