//! Streaming envelope wire contract.
//!
//! A reply body is plain UTF-8 text: zero or more text chunks written
//! verbatim as the model produces them, then a newline, the delimiter
//! token, and one JSON-serialized [`TerminalEnvelope`]. Nothing follows the
//! envelope.
//!
//! Delimiter-based framing is fragile by construction: if generated text
//! ever contains the literal token, framing breaks. That trade-off is kept
//! deliberately (no escaping is defined) and the decoder's fallback path
//! keeps a missing delimiter survivable.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Marker separating streamed text from the terminal envelope.
pub const STREAM_DELIMITER: &str = "__TERMINAL_ENVELOPE_V1__";

/// Final JSON block appended after the streamed text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalEnvelope {
    /// Full structured reply, exactly as the upstream model returned it.
    #[serde(rename = "response")]
    pub model_response: Value,
    /// Concatenation of every chunk streamed before the envelope.
    #[serde(rename = "text")]
    pub aggregated_text: String,
}

/// Outcome of decoding a fully accumulated reply body.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedBody {
    /// The delimiter arrived and the envelope parsed.
    Complete(TerminalEnvelope),
    /// No delimiter, but the whole body was a JSON object carrying an
    /// `error` message.
    ErrorObject(String),
    /// No delimiter; the raw body is best-effort aggregated text.
    Degraded(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error("terminal envelope is not valid JSON: {0}")]
    MalformedEnvelope(String),
    #[error("failed to serialize terminal envelope: {0}")]
    Serialize(String),
}

/// Frame a terminal envelope for appending to the chunk stream.
pub fn encode_terminator(envelope: &TerminalEnvelope) -> Result<String, EnvelopeError> {
    let json =
        serde_json::to_string(envelope).map_err(|e| EnvelopeError::Serialize(e.to_string()))?;
    Ok(format!("\n{STREAM_DELIMITER}{json}"))
}

/// Decode an accumulated reply body.
///
/// Splits once on the delimiter. Text before it was already rendered
/// incrementally by the caller and is discarded in favor of the envelope's
/// aggregated text. When the delimiter never arrived (failure before
/// completion, mid-stream crash), the body is either a bare JSON error
/// object or degraded plain text; both are recoverable outcomes, not
/// errors. Only a present-but-malformed envelope is fatal, since no safe
/// partial result exists.
pub fn decode_body(body: &str) -> Result<DecodedBody, EnvelopeError> {
    match body.split_once(STREAM_DELIMITER) {
        Some((_, tail)) => {
            let envelope: TerminalEnvelope = serde_json::from_str(tail)
                .map_err(|e| EnvelopeError::MalformedEnvelope(e.to_string()))?;
            Ok(DecodedBody::Complete(envelope))
        }
        None => {
            if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
                if let Some(Value::String(message)) = map.get("error") {
                    return Ok(DecodedBody::ErrorObject(message.clone()));
                }
            }
            Ok(DecodedBody::Degraded(body.to_string()))
        }
    }
}
