//! Gateway client: the single entry point for model-backed callers.

use futures_util::StreamExt;
use reqwest::Client;
use serde_json::{json, Value};

use relay_common::{decode_body, DecodedBody, GenerationRequest, RawInput};

use crate::error::ClientError;
use crate::queue::TaskQueue;
use crate::retry::RetryPolicy;

/// Settings for the gateway client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Submission endpoint URL.
    pub endpoint: String,
    /// Maximum concurrent in-flight calls.
    pub concurrency_limit: usize,
    /// Retry policy for transient gateway failures.
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            concurrency_limit: 3,
            retry: RetryPolicy::default(),
        }
    }
}

/// A settled generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelReply {
    /// Concatenation of the streamed text.
    pub aggregated_text: String,
    /// Structured reply exactly as the model returned it; an empty object
    /// when the reply degraded to plain text.
    pub structured_response: Value,
}

/// Client for invoking the relay gateway.
///
/// Owns its task queue and retry policy; results are never cached here.
/// Callers needing a cache layer one in front, keyed by normalized query
/// text.
pub struct GatewayClient {
    http_client: Client,
    config: ClientConfig,
    queue: TaskQueue,
}

impl GatewayClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http_client: Client::new(),
            queue: TaskQueue::new(config.concurrency_limit),
            config,
        }
    }

    /// Number of calls currently holding a queue slot.
    pub fn active_calls(&self) -> usize {
        self.queue.active_count()
    }

    /// Invoke one generation call.
    ///
    /// Normalizes the request contents, waits for a queue slot, retries
    /// transient failures with backoff, and decodes the streaming reply
    /// body. The queue/retry machinery never swallows an error: a failed
    /// invocation always carries the true final cause.
    pub async fn invoke(&self, request: GenerationRequest) -> Result<ModelReply, ClientError> {
        let request = normalize(request)?;

        let body = self
            .queue
            .add(|| self.config.retry.run(|| self.raw_call(&request)))
            .await?;

        self.decode(&body)
    }

    /// One raw HTTP round trip against the gateway.
    ///
    /// Non-success statuses are reconstructed into a structured failure
    /// carrying the status code, so retry classification is a field
    /// comparison rather than message scanning.
    async fn raw_call(&self, request: &GenerationRequest) -> Result<String, ClientError> {
        let response = self
            .http_client
            .post(&self.config.endpoint)
            .json(&json!({ "data": request }))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        let status = response.status();

        // Accumulate the chunked body incrementally; chunks arrive in
        // production order and the envelope is decoded once the body ends.
        let mut buffer = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ClientError::Transport(e.to_string()))?;
            buffer.extend_from_slice(&chunk);
        }
        let body = String::from_utf8_lossy(&buffer).into_owned();

        if !status.is_success() {
            return Err(ClientError::Gateway {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        Ok(body)
    }

    fn decode(&self, body: &str) -> Result<ModelReply, ClientError> {
        match decode_body(body).map_err(|e| ClientError::Decode(e.to_string()))? {
            DecodedBody::Complete(envelope) => Ok(ModelReply {
                aggregated_text: envelope.aggregated_text,
                structured_response: envelope.model_response,
            }),
            DecodedBody::ErrorObject(message) => Err(ClientError::ErrorReply(message)),
            DecodedBody::Degraded(text) => {
                tracing::warn!(
                    "terminal delimiter never arrived; returning raw body as aggregated text"
                );
                Ok(ModelReply {
                    aggregated_text: text,
                    structured_response: json!({}),
                })
            }
        }
    }
}

/// Resolve the caller's input shape once; downstream code and the wire
/// only ever see the canonical turn list.
fn normalize(mut request: GenerationRequest) -> Result<GenerationRequest, ClientError> {
    let turns = request.contents.normalize();
    if turns.is_empty() {
        return Err(ClientError::InvalidInput(
            "contents must contain at least one turn".to_string(),
        ));
    }
    request.contents = RawInput::TurnList(turns);
    Ok(request)
}

/// Pull the human-readable message out of a gateway error body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| value.get("error").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}
