//! Upstream model provider abstraction.
//!
//! This module defines the `ModelBackend` trait that abstracts the
//! generation provider behind a common interface, plus the HTTP
//! implementation the gateway runs in production.

mod http;

pub use http::HttpBackend;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use serde_json::Value;

use relay_common::Turn;

use crate::error::Result;

/// Parameters for one upstream call.
#[derive(Debug, Clone)]
pub struct UpstreamCall {
    pub model: String,
    /// Normalized conversation turns.
    pub turns: Vec<Turn>,
    /// Opaque generation options, forwarded verbatim.
    pub config: Option<Value>,
    /// Optional system instruction, forwarded verbatim.
    pub system_instruction: Option<Value>,
}

/// One streamed unit from the upstream model.
#[derive(Debug, Clone)]
pub struct StreamEvent {
    /// Text carried by this event, if any. Events with no text
    /// representation (inline binary inside a text stream) carry `None`
    /// and are skipped by the relay.
    pub text: Option<String>,
    /// The raw provider object this event was parsed from.
    pub raw: Value,
}

/// A provider backend the gateway can relay generation through.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// One-shot generation; returns the provider reply verbatim.
    async fn generate(&self, call: &UpstreamCall) -> Result<Value>;

    /// Streaming generation; yields events in production order.
    async fn stream_generate(
        &self,
        call: &UpstreamCall,
    ) -> Result<BoxStream<'static, Result<StreamEvent>>>;
}
