//! Error types for the relay client.

use crate::retry::TransientError;

/// Error types for gateway invocation.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed caller input, rejected before any network activity.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The request never produced a usable HTTP reply.
    #[error("transport error: {0}")]
    Transport(String),

    /// The gateway rejected the call. The status code is set by the
    /// transport layer when the failure is reconstructed on this side of
    /// the network boundary; retry classification compares this field.
    #[error("gateway returned {status}: {message}")]
    Gateway { status: u16, message: String },

    /// The reply body was a bare JSON error object (no envelope arrived).
    #[error("{0}")]
    ErrorReply(String),

    /// The terminal envelope arrived but did not parse. Fatal: no safe
    /// partial result exists.
    #[error("malformed terminal envelope: {0}")]
    Decode(String),
}

impl TransientError for ClientError {
    /// Rate-limit and overload signals are worth retrying; every other
    /// failure is permanent.
    fn is_transient(&self) -> bool {
        matches!(
            self,
            ClientError::Gateway {
                status: 429 | 503,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_and_overload_are_transient() {
        let rate_limited = ClientError::Gateway {
            status: 429,
            message: "quota".to_string(),
        };
        let overloaded = ClientError::Gateway {
            status: 503,
            message: "busy".to_string(),
        };
        assert!(rate_limited.is_transient());
        assert!(overloaded.is_transient());
    }

    #[test]
    fn test_other_failures_are_permanent() {
        let bad_request = ClientError::Gateway {
            status: 400,
            message: "no turns".to_string(),
        };
        assert!(!bad_request.is_transient());
        assert!(!ClientError::Transport("refused".to_string()).is_transient());
        assert!(!ClientError::Decode("bad json".to_string()).is_transient());
    }

    #[test]
    fn test_error_reply_displays_bare_message() {
        let error = ClientError::ErrorReply("boom".to_string());
        assert_eq!(error.to_string(), "boom");
    }
}
