//! Generation endpoint.
//!
//! Relays streamed model output to the caller verbatim, then appends the
//! terminal envelope once the upstream call completes. Image-modality
//! requests take a non-streaming upstream call and produce zero chunks
//! before the envelope.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use futures_util::StreamExt;
use serde_json::Value;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use relay_common::{encode_terminator, SubmitBody, TerminalEnvelope};

use crate::error::{Error, Result};
use crate::upstream::UpstreamCall;
use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/generate", post(generate).options(preflight))
        .with_state(state)
}

/// OPTIONS /generate - pre-flight negotiation.
///
/// No body; advertises what the submission endpoint accepts.
async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
            (header::ACCESS_CONTROL_ALLOW_METHODS, "POST, OPTIONS"),
            (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

/// POST /generate - submit one generation call.
async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitBody>,
) -> Result<Response> {
    let request = body.into_request();
    let call_id = Uuid::new_v4();

    let turns = request.contents.clone().normalize();
    if turns.is_empty() {
        return Err(Error::InvalidRequest(
            "contents must contain at least one turn".to_string(),
        ));
    }

    let model = request
        .model_name
        .clone()
        .unwrap_or_else(|| state.config.upstream.default_model.clone());

    tracing::info!(%call_id, model = %model, turns = turns.len(), "generation call");

    let call = UpstreamCall {
        model,
        turns,
        config: request.config.clone(),
        system_instruction: request.system_instruction.clone(),
    };

    if request.wants_image_output() {
        relay_single(state, call).await
    } else {
        relay_stream(state, call_id, call).await
    }
}

/// Non-streaming modalities: one upstream call, zero chunks, then the
/// terminal envelope carrying the full reply.
async fn relay_single(state: Arc<AppState>, call: UpstreamCall) -> Result<Response> {
    let model_response = state.backend.generate(&call).await?;

    let envelope = TerminalEnvelope {
        model_response,
        aggregated_text: String::new(),
    };
    let terminator = encode_terminator(&envelope).map_err(|e| Error::Internal(e.to_string()))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        terminator,
    )
        .into_response())
}

/// Streaming relay: each text fragment is forwarded as produced and
/// accumulated; the terminal envelope follows once upstream completes.
async fn relay_stream(state: Arc<AppState>, call_id: Uuid, call: UpstreamCall) -> Result<Response> {
    // Open the upstream stream before committing the reply, so pre-stream
    // failures can still set the status code.
    let mut upstream = state.backend.stream_generate(&call).await?;

    let (tx, rx) = tokio::sync::mpsc::channel::<std::result::Result<String, std::convert::Infallible>>(16);

    tokio::spawn(async move {
        let mut aggregated = String::new();
        let mut last_raw = Value::Null;

        while let Some(event) = upstream.next().await {
            match event {
                Ok(event) => {
                    last_raw = event.raw;
                    // Fragments with no text representation are skipped.
                    let Some(text) = event.text else { continue };
                    aggregated.push_str(&text);
                    // A gone caller does not cancel the upstream call; keep
                    // draining to completion.
                    let _ = tx.send(Ok(text)).await;
                }
                Err(e) => {
                    // The status is already committed; the body simply ends
                    // here without a terminal envelope.
                    tracing::warn!(%call_id, error = %e, "upstream stream failed mid-relay");
                    return;
                }
            }
        }

        let envelope = TerminalEnvelope {
            model_response: last_raw,
            aggregated_text: aggregated,
        };
        match encode_terminator(&envelope) {
            Ok(terminator) => {
                let _ = tx.send(Ok(terminator)).await;
            }
            Err(e) => {
                tracing::error!(%call_id, error = %e, "failed to encode terminal envelope");
            }
        }
    });

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        Body::from_stream(ReceiverStream::new(rx)),
    )
        .into_response())
}
