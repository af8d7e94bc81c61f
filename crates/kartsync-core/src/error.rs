//! Error types for kartsync-core.

use thiserror::Error;

use crate::role::Role;

/// Why the authority refused to execute a move.
///
/// A rejected move never touches ground truth. It is not resent; the owning
/// client's next reconciliation overwrites whatever it predicted for it.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Rejection {
    /// Steering outside `[-1, 1]` (or NaN).
    #[error("steering {0} outside [-1, 1]")]
    SteeringOutOfRange(f32),

    /// Throttle outside `[-1, 1]` (or NaN).
    #[error("throttle {0} outside [-1, 1]")]
    ThrottleOutOfRange(f32),

    /// Negative or non-finite elapsed time.
    #[error("invalid delta time {0}")]
    InvalidDeltaTime(f32),

    /// Timestamp is NaN or infinite.
    #[error("non-finite move timestamp")]
    NonFiniteTimestamp,

    /// Timestamp does not come after the last move accepted from this client.
    #[error("stale move timestamp {timestamp} (last accepted {last_accepted})")]
    StaleTimestamp {
        /// Timestamp of the rejected move
        timestamp: f64,
        /// Timestamp of the last accepted move
        last_accepted: f64,
    },

    /// Accepting the move would put the client's simulated time ahead of the
    /// server's clock.
    #[error("client simulated time {proposed:.4}s ahead of server time {server_now:.4}s")]
    ClockAhead {
        /// Client simulated time if the move were accepted
        proposed: f64,
        /// Server wall clock
        server_now: f64,
    },
}

/// Kartsync error type
#[derive(Debug, Error)]
pub enum Error {
    /// The authority refused a move
    #[error("move rejected: {0}")]
    MoveRejected(#[from] Rejection),

    /// A collaborator the tick needs is not wired up
    #[error("missing dependency: {0}")]
    MissingDependency(&'static str),

    /// A move would break the strictly increasing timestamp order
    #[error("move timestamp {next} does not follow {previous}")]
    NonMonotonicTimestamp {
        /// Newest timestamp already buffered
        previous: f64,
        /// Timestamp that was pushed
        next: f64,
    },

    /// An operation reserved for another role
    #[error("operation needs role {expected}, kart runs as {actual}")]
    WrongRole {
        /// Role the operation needs
        expected: Role,
        /// Role the kart was created with
        actual: Role,
    },

    /// Configuration values out of range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

/// Result type for kartsync operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_converts_into_error() {
        let err: Error = Rejection::SteeringOutOfRange(1.5).into();
        assert!(matches!(err, Error::MoveRejected(Rejection::SteeringOutOfRange(_))));
        assert_eq!(err.to_string(), "move rejected: steering 1.5 outside [-1, 1]");
    }

    #[test]
    fn wrong_role_names_both_roles() {
        let err = Error::WrongRole {
            expected: Role::Authority,
            actual: Role::RemoteObserver,
        };
        assert_eq!(
            err.to_string(),
            "operation needs role Authority, kart runs as RemoteObserver"
        );
    }
}
