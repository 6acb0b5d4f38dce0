//! Conversational turn types and caller input normalization.
//!
//! Callers submit input in one of three shapes: plain text, a single
//! turn-like object, or an already-ordered turn list. The shape is resolved
//! once at the system boundary into [`RawInput`]; everything downstream only
//! ever sees the canonical `Vec<Turn>` form.

use serde::{Deserialize, Serialize};

/// Author of a conversational turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Model,
}

/// Inline binary payload, base64-encoded with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

/// One content fragment inside a turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

/// One attributed message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Defaults to `user` when the caller leaves it unspecified.
    #[serde(default)]
    pub role: Role,
    pub parts: Vec<Part>,
}

impl Turn {
    /// A user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    /// A model turn with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::Text { text: text.into() }],
        }
    }
}

/// Caller input as accepted at the system boundary.
///
/// Deserialization resolves the shape exactly once; internal code works with
/// the normalized list form only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawInput {
    Text(String),
    SingleTurn(Turn),
    TurnList(Vec<Turn>),
}

impl RawInput {
    /// Canonicalize into an ordered turn list.
    ///
    /// Plain text becomes one user turn with one text part; a single turn is
    /// wrapped in a one-element list; a list passes through unchanged. No
    /// content validation happens here; malformed parts are forwarded to
    /// the upstream model, whose job is to reject them.
    pub fn normalize(self) -> Vec<Turn> {
        match self {
            RawInput::Text(text) => vec![Turn::user(text)],
            RawInput::SingleTurn(turn) => vec![turn],
            RawInput::TurnList(turns) => turns,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_plain_text() {
        let turns = RawInput::Text("hello".to_string()).normalize();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::User);
        assert_eq!(
            turns[0].parts,
            vec![Part::Text {
                text: "hello".to_string()
            }]
        );
    }

    #[test]
    fn test_normalize_single_turn() {
        let turns = RawInput::SingleTurn(Turn::model("hi there")).normalize();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].role, Role::Model);
    }

    #[test]
    fn test_normalize_turn_list_passes_through() {
        let list = vec![Turn::user("a"), Turn::model("b"), Turn::user("c")];
        let turns = RawInput::TurnList(list.clone()).normalize();
        assert_eq!(turns, list);
    }

    #[test]
    fn test_deserialize_text_shape() {
        let input: RawInput = serde_json::from_str(r#""2+2?""#).unwrap();
        assert_eq!(input, RawInput::Text("2+2?".to_string()));
    }

    #[test]
    fn test_deserialize_single_turn_shape() {
        let json = r#"{"role": "user", "parts": [{"text": "hello"}]}"#;
        let input: RawInput = serde_json::from_str(json).unwrap();
        match input {
            RawInput::SingleTurn(turn) => assert_eq!(turn.parts.len(), 1),
            other => panic!("expected SingleTurn, got {other:?}"),
        }
    }

    #[test]
    fn test_deserialize_list_shape() {
        let json = r#"[{"parts": [{"text": "a"}]}, {"role": "model", "parts": [{"text": "b"}]}]"#;
        let input: RawInput = serde_json::from_str(json).unwrap();
        let turns = input.normalize();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, Role::User, "missing role defaults to user");
        assert_eq!(turns[1].role, Role::Model);
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Turn::model("x")).unwrap();
        assert!(json.contains(r#""role":"model""#));
    }

    #[test]
    fn test_inline_data_camel_case_roundtrip() {
        let json = r#"{"parts": [{"inlineData": {"mimeType": "image/png", "data": "aGVsbG8="}}]}"#;
        let turn: Turn = serde_json::from_str(json).unwrap();
        match &turn.parts[0] {
            Part::InlineData { inline_data } => {
                assert_eq!(inline_data.mime_type, "image/png");
                assert_eq!(inline_data.data, "aGVsbG8=");
            }
            other => panic!("expected InlineData, got {other:?}"),
        }
        let back = serde_json::to_string(&turn).unwrap();
        assert!(back.contains(r#""mimeType":"image/png""#));
    }
}
