//! Error types for the fake WebSocket implementation.
//!
//! Every failure here models a synchronous exception of the emulated browser
//! API: construction-time input validation, misuse of the test double, or a
//! handshake resolved twice. Nothing is retried and nothing is recovered
//! internally.

use crate::socket::ReadyState;
use thiserror::Error;

/// Result type alias for fake WebSocket operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving the fake WebSocket.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// The connection URL could not be parsed.
    #[error("invalid URL '{0}'")]
    InvalidUrl(String),

    /// The connection URL scheme is not `ws` or `wss`.
    #[error("invalid scheme '{0}': the URL scheme must be either 'ws' or 'wss'")]
    InvalidScheme(String),

    /// The connection URL contains a fragment identifier.
    #[error("the URL contains a fragment identifier ('#{0}'): fragments are not allowed")]
    FragmentNotAllowed(String),

    /// A subprotocol name appears more than once in the requested list.
    #[error("the subprotocol '{0}' is duplicated")]
    DuplicateProtocol(String),

    /// A handshake response was triggered more than once.
    #[error("cannot trigger handshake response: the {handshake} handshake is already closed")]
    HandshakeAlreadyClosed {
        /// Which handshake was re-resolved (`"open"` or `"close"`).
        handshake: &'static str,
    },

    /// `fail` was called on an open handshake with the success status.
    #[error("cannot fail open handshake with status 101, use respond() instead")]
    FailWithSuccessStatus,

    /// `send` was called before the connection was established.
    #[error("cannot send: still in CONNECTING state")]
    StillConnecting,

    /// `send` was called after closing started.
    #[error("cannot send: already in CLOSING or CLOSED state")]
    AlreadyClosingOrClosed,

    /// `close` was called with a code that is neither 1000 nor in 3000..=4999.
    #[error("invalid close code {0}: the code must be either 1000, or between 3000 and 4999")]
    InvalidCloseCode(u16),

    /// The close reason exceeds the 123-byte UTF-8 limit.
    #[error("close reason too long: {len} bytes (max: {max})")]
    ReasonTooLong {
        /// UTF-8 byte length of the rejected reason.
        len: usize,
        /// Maximum allowed byte length.
        max: usize,
    },

    /// A message was emitted while the socket was not open.
    #[error("cannot receive message: the socket state is {0}, must be OPEN")]
    NotOpen(ReadyState),

    /// A close was emitted on a socket that already finished closing.
    #[error("cannot emit a close event: the socket is already closed")]
    AlreadyClosed,

    /// A close was emitted while the close handshake was already in flight.
    #[error("cannot emit a close event: the socket is already closing")]
    AlreadyClosing,

    /// A handshake outlived its socket.
    #[error("the socket was dropped before the handshake was resolved")]
    SocketGone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_names_offending_values() {
        let err = Error::InvalidScheme("http".to_string());
        assert_eq!(
            err.to_string(),
            "invalid scheme 'http': the URL scheme must be either 'ws' or 'wss'"
        );

        let err = Error::ReasonTooLong { len: 150, max: 123 };
        assert_eq!(err.to_string(), "close reason too long: 150 bytes (max: 123)");

        let err = Error::InvalidCloseCode(2999);
        assert!(err.to_string().contains("2999"));
    }

    #[test]
    fn test_error_clone_and_eq() {
        let err = Error::HandshakeAlreadyClosed { handshake: "open" };
        assert_eq!(err.clone(), err);
        assert_ne!(err, Error::HandshakeAlreadyClosed { handshake: "close" });
    }

    #[test]
    fn test_not_open_names_actual_state() {
        let err = Error::NotOpen(ReadyState::Closing);
        assert_eq!(
            err.to_string(),
            "cannot receive message: the socket state is CLOSING, must be OPEN"
        );
    }
}
