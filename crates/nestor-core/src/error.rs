//! Error types for the Nestor core.
//!
//! Delivery failures are expected, recoverable conditions. They are carried in
//! a [`DeliveryResult`] rather than raised, so handler code can keep treating
//! a send as a plain success/failure check.

use thiserror::Error;

// =============================================================================
// Delivery Errors
// =============================================================================

/// Reasons an outbound `send`/`reply` did not reach the relay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The originating message carries no user to address.
    #[error("message has no user")]
    MissingUser,

    /// The originating message carries no room to deliver into.
    #[error("message has no room")]
    MissingRoom,

    /// Nothing to deliver.
    #[error("no strings to deliver")]
    NoStrings,

    /// Production delivery was requested but the robot has no relay.
    #[error("no relay configured for production delivery")]
    RelayUnavailable,

    /// The relay answered with something other than `202 Accepted`.
    #[error("relay rejected message with status {status}")]
    Rejected {
        /// HTTP status returned by the relay.
        status: u16,
    },

    /// The request never produced a response.
    #[error("relay transport failure: {0}")]
    Transport(String),
}

impl DeliveryError {
    /// Creates a transport failure.
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Returns `true` if the failure was decided locally, before any network I/O.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::MissingUser | Self::MissingRoom | Self::NoStrings | Self::RelayUnavailable
        )
    }
}

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while registering a listener.
#[derive(Debug, Clone, Error)]
pub enum RegisterError {
    /// The listener pattern failed to compile.
    #[error("invalid listener pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result of a single delivery attempt.
pub type DeliveryResult = Result<(), DeliveryError>;

/// Result type for listener registration.
pub type RegisterResult<T = ()> = Result<T, RegisterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_classification() {
        assert!(DeliveryError::MissingRoom.is_precondition());
        assert!(DeliveryError::NoStrings.is_precondition());
        assert!(!DeliveryError::Rejected { status: 500 }.is_precondition());
        assert!(!DeliveryError::transport("reset").is_precondition());
    }

    #[test]
    fn test_display() {
        let err = DeliveryError::Rejected { status: 404 };
        assert_eq!(err.to_string(), "relay rejected message with status 404");
    }
}
