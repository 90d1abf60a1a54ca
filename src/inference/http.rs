//! HTTP Inference Client
//!
//! Posts `{"inputs": ..., "parameters": {...}}` to a hosted text-generation
//! endpoint and reads back `generated_text`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{InferenceClient, InferenceOutput, with_loading_retry};
use crate::config::InferenceConfig;
use crate::constants::inference::{API_KEY_ENV, MAX_LOADING_RETRY_SECS};
use crate::types::{ErrorCategory, ErrorClassifier, InferenceError, Result, ShelfError};

#[derive(Debug, Clone, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
    temperature: f32,
    return_full_text: bool,
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: &'a GenerationParameters,
}

pub struct HttpInferenceClient {
    endpoint: String,
    label: String,
    /// Optional bearer token, never logged
    api_key: Option<SecretString>,
    parameters: GenerationParameters,
    retry_delay: Duration,
    client: reqwest::Client,
}

impl std::fmt::Debug for HttpInferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpInferenceClient")
            .field("endpoint", &self.endpoint)
            .field("label", &self.label)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("parameters", &self.parameters)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl HttpInferenceClient {
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_deref().ok_or_else(|| {
            ShelfError::Config(
                "inference.endpoint is not set. Add it to config.toml or set PROMPTSHELF_INFERENCE__ENDPOINT"
                    .to_string(),
            )
        })?;
        let endpoint = Self::validate_endpoint(endpoint)?;

        let api_key = config
            .api_key
            .clone()
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|k| !k.trim().is_empty())
            .map(SecretString::from);

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ShelfError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            label: config.model.clone().unwrap_or_else(|| endpoint.clone()),
            endpoint,
            api_key,
            parameters: GenerationParameters {
                max_new_tokens: config.max_new_tokens,
                temperature: config.temperature,
                return_full_text: false,
            },
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            client,
        })
    }

    /// Only http/https endpoints are accepted
    fn validate_endpoint(endpoint: &str) -> Result<String> {
        let url = url::Url::parse(endpoint).map_err(|e| {
            ShelfError::Config(format!(
                "Invalid inference endpoint URL '{}': {}",
                endpoint, e
            ))
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ShelfError::Config(format!(
                "Inference endpoint must use http or https scheme, got: {}",
                url.scheme()
            )));
        }

        if url.scheme() == "http"
            && let Some(host) = url.host_str()
            && !matches!(host, "localhost" | "127.0.0.1" | "::1")
        {
            warn!("Inference endpoint {} is not using TLS", host);
        }

        let mut result = url.to_string();
        if result.ends_with('/') {
            result.pop();
        }
        Ok(result)
    }

    async fn attempt(&self, prompt: &str) -> Result<String> {
        let request = GenerationRequest {
            inputs: prompt,
            parameters: &self.parameters,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key.expose_secret());
        }

        debug!("Sending request to {}", self.endpoint);
        let response = builder
            .send()
            .await
            .map_err(|e| ShelfError::from(ErrorClassifier::classify(&e.to_string())))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            ShelfError::from(ErrorClassifier::classify(&format!(
                "Failed to read response body: {}",
                e
            )))
        })?;

        if !status.is_success() {
            let mut err = ErrorClassifier::classify_http_status(status.as_u16(), &body);
            if err.category == ErrorCategory::ModelLoading
                && let Some(wait) = estimated_loading_time(&body)
            {
                err = err.retry_after(wait);
            }
            return Err(err.into());
        }

        parse_generated_text(&body)
    }
}

#[async_trait]
impl InferenceClient for HttpInferenceClient {
    async fn run(&self, prompt: &str) -> Result<InferenceOutput> {
        info!("Running prompt against {}", self.label);
        let start = Instant::now();

        let text = with_loading_retry(self.retry_delay, || self.attempt(prompt)).await?;

        Ok(InferenceOutput {
            text,
            elapsed_ms: start.elapsed().as_millis() as u64,
        })
    }

    fn name(&self) -> &str {
        &self.label
    }
}

/// Accepts `[{"generated_text": ..}]` or `{"generated_text": ..}`
fn parse_generated_text(body: &str) -> Result<String> {
    let value: Value = serde_json::from_str(body).map_err(|e| {
        InferenceError::new(
            ErrorCategory::ParseError,
            format!("Response is not JSON: {}", e),
        )
    })?;

    let object = match &value {
        Value::Array(items) => items.first(),
        Value::Object(_) => Some(&value),
        _ => None,
    };

    object
        .and_then(|o| o.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            InferenceError::new(
                ErrorCategory::ParseError,
                "Response has no generated_text field",
            )
            .into()
        })
}

/// `estimated_time` from a loading response, capped
fn estimated_loading_time(body: &str) -> Option<Duration> {
    let value: Value = serde_json::from_str(body).ok()?;
    let secs = value.get("estimated_time")?.as_f64()?;
    if !secs.is_finite() || secs <= 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(
        secs.min(MAX_LOADING_RETRY_SECS as f64),
    ))
}
