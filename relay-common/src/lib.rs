//! Relay Common Types
//!
//! Shared wire contract used by both the relay gateway and its clients.

pub mod envelope;
pub mod request;
pub mod turns;

pub use envelope::{
    decode_body, encode_terminator, DecodedBody, EnvelopeError, TerminalEnvelope, STREAM_DELIMITER,
};
pub use request::{GenerationRequest, SubmitBody};
pub use turns::{InlineData, Part, RawInput, Role, Turn};
