//! # Error Taxonomy
//!
//! Every failure the coordinator can report. Business-rule outcomes travel
//! back to the peer as structured error responses; transport failures end the
//! affected connection only.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Errors produced by the control channel and the shared poll state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PollError {
    #[error("invalid username or secret")]
    InvalidCredentials,

    #[error("user is already logged in")]
    AlreadyLoggedIn,

    #[error("must log in first")]
    NotAuthenticated,

    #[error("unknown or not permitted for this role")]
    RoleNotPermitted,

    #[error("candidate not found")]
    CandidateNotFound,

    #[error("voting is closed")]
    VotingClosed,

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid request")]
    MalformedRequest,

    #[error("peer disconnected")]
    PeerDisconnected,

    #[error("transport failure: {0}")]
    TransportFailure(String),

    #[error("connection idle for more than {0:?}")]
    IdleTimeout(Duration),
}

pub type Result<T> = std::result::Result<T, PollError>;

impl PollError {
    /// Machine-readable code carried in the `code` field of error responses.
    pub fn code(&self) -> &'static str {
        match self {
            PollError::InvalidCredentials => "invalid_credentials",
            PollError::AlreadyLoggedIn => "already_logged_in",
            PollError::NotAuthenticated => "not_authenticated",
            PollError::RoleNotPermitted => "role_not_permitted",
            PollError::CandidateNotFound => "candidate_not_found",
            PollError::VotingClosed => "voting_closed",
            PollError::InvalidInput(_) => "invalid_input",
            PollError::MalformedRequest => "malformed_request",
            PollError::PeerDisconnected => "peer_disconnected",
            PollError::TransportFailure(_) => "transport_failure",
            PollError::IdleTimeout(_) => "idle_timeout",
        }
    }

    /// Whether this error terminates the connection's request loop instead of
    /// being answered with an error response.
    pub fn ends_connection(&self) -> bool {
        matches!(
            self,
            PollError::PeerDisconnected | PollError::TransportFailure(_) | PollError::IdleTimeout(_)
        )
    }
}

impl From<io::Error> for PollError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe => PollError::PeerDisconnected,
            _ => PollError::TransportFailure(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_errors_split_into_disconnect_and_failure() {
        let reset = io::Error::new(io::ErrorKind::ConnectionReset, "reset");
        assert_eq!(PollError::from(reset), PollError::PeerDisconnected);

        let other = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert!(matches!(PollError::from(other), PollError::TransportFailure(_)));
    }

    #[test]
    fn test_business_errors_keep_connection_open() {
        assert!(!PollError::AlreadyLoggedIn.ends_connection());
        assert!(!PollError::MalformedRequest.ends_connection());
        assert!(PollError::PeerDisconnected.ends_connection());
        assert_eq!(PollError::NotAuthenticated.to_string(), "must log in first");
    }
}
