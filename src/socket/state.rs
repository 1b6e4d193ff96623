//! Connection lifecycle states mirroring the browser `WebSocket.readyState`.

/// The four-value lifecycle stage of a fake WebSocket connection.
///
/// States only ever move forward: `Connecting` → `Open` → `Closing` →
/// `Closed`, or `Connecting` → `Closing` → `Closed` when the open handshake
/// fails or the socket is closed before the connection is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum ReadyState {
    /// The connection has not yet been established.
    #[default]
    Connecting = 0,
    /// The connection is established and communication is possible.
    Open = 1,
    /// The closing handshake is in progress, or `close()` has been invoked.
    Closing = 2,
    /// The connection has been closed or could not be opened.
    Closed = 3,
}

impl ReadyState {
    /// Numeric value of the state, as exposed by the browser API
    /// (`CONNECTING=0`, `OPEN=1`, `CLOSING=2`, `CLOSED=3`).
    #[must_use]
    #[inline]
    pub const fn code(&self) -> u8 {
        *self as u8
    }

    /// Check if sending data is allowed in this state.
    ///
    /// Returns `true` only for `Open`.
    #[must_use]
    #[inline]
    pub const fn can_send(&self) -> bool {
        matches!(self, ReadyState::Open)
    }

    /// Check if the closing handshake has started (or finished).
    #[must_use]
    #[inline]
    pub const fn is_closing_or_closed(&self) -> bool {
        matches!(self, ReadyState::Closing | ReadyState::Closed)
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadyState::Connecting => write!(f, "CONNECTING"),
            ReadyState::Open => write!(f, "OPEN"),
            ReadyState::Closing => write!(f, "CLOSING"),
            ReadyState::Closed => write!(f, "CLOSED"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        assert_eq!(ReadyState::default(), ReadyState::Connecting);
    }

    #[test]
    fn test_numeric_codes() {
        assert_eq!(ReadyState::Connecting.code(), 0);
        assert_eq!(ReadyState::Open.code(), 1);
        assert_eq!(ReadyState::Closing.code(), 2);
        assert_eq!(ReadyState::Closed.code(), 3);
    }

    #[test]
    fn test_can_send_in_each_state() {
        assert!(!ReadyState::Connecting.can_send());
        assert!(ReadyState::Open.can_send());
        assert!(!ReadyState::Closing.can_send());
        assert!(!ReadyState::Closed.can_send());
    }

    #[test]
    fn test_is_closing_or_closed() {
        assert!(!ReadyState::Connecting.is_closing_or_closed());
        assert!(!ReadyState::Open.is_closing_or_closed());
        assert!(ReadyState::Closing.is_closing_or_closed());
        assert!(ReadyState::Closed.is_closing_or_closed());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ReadyState::Connecting.to_string(), "CONNECTING");
        assert_eq!(ReadyState::Open.to_string(), "OPEN");
        assert_eq!(ReadyState::Closing.to_string(), "CLOSING");
        assert_eq!(ReadyState::Closed.to_string(), "CLOSED");
    }
}
