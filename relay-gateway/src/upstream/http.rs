//! HTTP model provider backend (generateContent-style API).

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use crate::error::{Error, Result};

use super::{ModelBackend, StreamEvent, UpstreamCall};

/// HTTP backend for a Gemini-style generateContent provider.
///
/// Non-streaming calls hit `:generateContent`; streaming calls hit
/// `:streamGenerateContent?alt=sse` and parse the `data:` event lines.
pub struct HttpBackend {
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn request_body(call: &UpstreamCall) -> Value {
        let mut body = json!({ "contents": &call.turns });
        if let Some(config) = &call.config {
            body["generationConfig"] = config.clone();
        }
        if let Some(instruction) = &call.system_instruction {
            body["systemInstruction"] = instruction.clone();
        }
        body
    }
}

/// Map an upstream HTTP status onto the structured error taxonomy, so
/// callers classify by status field instead of scanning message text.
fn classify_status(status: StatusCode, body: String) -> Error {
    match status.as_u16() {
        429 => Error::RateLimited(body),
        503 | 529 => Error::Overloaded(body),
        _ => Error::UpstreamFailed(format!("{status}: {body}")),
    }
}

/// Parse one SSE line; `data:` payload lines become events, everything
/// else (comments, blank keep-alives, end markers) is dropped.
fn parse_sse_line(line: &str) -> Option<Result<StreamEvent>> {
    let payload = line.strip_prefix("data:")?.trim();
    if payload.is_empty() || payload == "[DONE]" {
        return None;
    }
    Some(match serde_json::from_str::<Value>(payload) {
        Ok(raw) => Ok(StreamEvent {
            text: extract_text(&raw),
            raw,
        }),
        Err(e) => Err(Error::UpstreamFailed(format!("malformed stream event: {e}"))),
    })
}

/// Concatenated text parts of the first candidate, if any.
fn extract_text(raw: &Value) -> Option<String> {
    let parts = raw.pointer("/candidates/0/content/parts")?.as_array()?;
    let text: String = parts
        .iter()
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

struct SseState<S> {
    bytes: S,
    buffer: Vec<u8>,
    exhausted: bool,
}

#[async_trait]
impl ModelBackend for HttpBackend {
    async fn generate(&self, call: &UpstreamCall) -> Result<Value> {
        let url = format!("{}/models/{}:generateContent", self.base_url, call.model);

        tracing::debug!("Sending upstream generate request: model={}", call.model);

        let response = self
            .http_client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(call))
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        response
            .json()
            .await
            .map_err(|e| Error::UpstreamFailed(e.to_string()))
    }

    async fn stream_generate(
        &self,
        call: &UpstreamCall,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>> {
        let url = format!("{}/models/{}:streamGenerateContent", self.base_url, call.model);

        tracing::debug!("Opening upstream stream: model={}", call.model);

        let response = self
            .http_client
            .post(&url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(call))
            .send()
            .await
            .map_err(|e| Error::Communication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(status, body));
        }

        let state = SseState {
            bytes: response.bytes_stream(),
            buffer: Vec::new(),
            exhausted: false,
        };

        let events = futures_util::stream::unfold(state, |mut state| async move {
            loop {
                // Drain complete lines already buffered.
                if let Some(pos) = state.buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = state.buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line);
                    if let Some(event) = parse_sse_line(line.trim_end()) {
                        return Some((event, state));
                    }
                    continue;
                }

                if state.exhausted {
                    if state.buffer.is_empty() {
                        return None;
                    }
                    // Flush a final unterminated line.
                    let line = std::mem::take(&mut state.buffer);
                    let line = String::from_utf8_lossy(&line);
                    return parse_sse_line(line.trim_end()).map(|event| (event, state));
                }

                match state.bytes.next().await {
                    Some(Ok(chunk)) => state.buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        state.exhausted = true;
                        state.buffer.clear();
                        return Some((Err(Error::Communication(e.to_string())), state));
                    }
                    None => state.exhausted = true,
                }
            }
        });

        Ok(events.boxed())
    }
}
