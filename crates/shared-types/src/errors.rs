//! # Error Types
//!
//! Errors surfaced by the remote chain gateway.

use crate::entities::Hash;
use thiserror::Error;

/// Errors returned by a [`ChainGateway`](crate::ChainGateway).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    /// No node could be reached (connection refused, all nodes down).
    #[error("Node unavailable: {0}")]
    Unavailable(String),

    /// The node did not answer in time.
    #[error("Node request timed out after {0} ms")]
    Timeout(u64),

    /// The requested block or transaction is not known to any node.
    #[error("Not found: {}", hex::encode(.0))]
    NotFound(Hash),

    /// The node returned bytes that do not parse.
    #[error("Malformed payload for {}: {reason}", hex::encode(.hash))]
    MalformedPayload { hash: Hash, reason: String },
}

impl GatewayError {
    /// Transient errors are retried by the next notification or sweep.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Data vanished between check and fetch; nothing to do.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(GatewayError::Timeout(500).is_transient());
        assert!(GatewayError::Unavailable("refused".into()).is_transient());
        assert!(!GatewayError::NotFound([0; 32]).is_transient());
        assert!(GatewayError::NotFound([0; 32]).is_not_found());
    }

    #[test]
    fn test_display_contains_hex() {
        let err = GatewayError::MalformedPayload {
            hash: [0xCD; 32],
            reason: "truncated".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("cdcdcdcd"));
        assert!(msg.contains("truncated"));
    }
}
