//! Generation request as submitted to the gateway.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::turns::RawInput;

/// One generation call. Immutable once the contents are normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    /// Upstream model to invoke; the gateway default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    /// Conversation input, normalized to an ordered turn list at the
    /// boundary.
    pub contents: RawInput,
    /// Opaque generation options, forwarded verbatim to the upstream model.
    /// May signal an output modality via `responseModalities`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<Value>,
    /// Optional system instruction, forwarded verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Value>,
}

impl GenerationRequest {
    /// New request for the given contents, everything else defaulted.
    pub fn new(contents: RawInput) -> Self {
        Self {
            model_name: None,
            contents,
            config: None,
            system_instruction: None,
        }
    }

    /// Whether the generation config requests image output.
    pub fn wants_image_output(&self) -> bool {
        self.config
            .as_ref()
            .and_then(|c| c.get("responseModalities"))
            .and_then(Value::as_array)
            .is_some_and(|modalities| {
                modalities
                    .iter()
                    .any(|m| m.as_str().is_some_and(|s| s.eq_ignore_ascii_case("image")))
            })
    }
}

/// Submission body: a `data` wrapper is accepted but optional.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SubmitBody {
    Wrapped { data: GenerationRequest },
    Bare(GenerationRequest),
}

impl SubmitBody {
    pub fn into_request(self) -> GenerationRequest {
        match self {
            SubmitBody::Wrapped { data } => data,
            SubmitBody::Bare(request) => request,
        }
    }
}
