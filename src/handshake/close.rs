//! The fake close handshake: the exchange that finishes closing a
//! connection.

use crate::error::{Error, Result};
use crate::socket::{FakeWebSocket, WeakSocket};
use std::cell::RefCell;
use std::rc::Rc;

/// The close request (and, once resolved, the echoed response).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloseRequest {
    /// The close status code.
    pub code: u16,
    /// The close reason.
    pub reason: String,
    /// Whether the closure was initiated by an explicit `close()` call and
    /// follows the normal close-handshake path.
    pub was_clean: bool,
}

struct CloseInner {
    socket: WeakSocket,
    request: CloseRequest,
    response: Option<CloseRequest>,
}

/// The fake close handshake owned by a socket.
///
/// Created when `close()` is invoked, when the open handshake fails, or when
/// test code emits a server-initiated closure. Resolving it echoes the stored
/// request unchanged and drives the socket's final close transition. At most
/// one close handshake is ever created per socket, and it resolves at most
/// once.
#[derive(Clone)]
pub struct CloseHandshake {
    inner: Rc<RefCell<CloseInner>>,
}

impl CloseHandshake {
    pub(crate) fn new(socket: WeakSocket, code: u16, reason: String, was_clean: bool) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CloseInner {
                socket,
                request: CloseRequest {
                    code,
                    reason,
                    was_clean,
                },
                response: None,
            })),
        }
    }

    /// The stored close request.
    #[must_use]
    pub fn request(&self) -> CloseRequest {
        self.inner.borrow().request.clone()
    }

    /// The triggered response, absent until the handshake is resolved.
    #[must_use]
    pub fn response(&self) -> Option<CloseRequest> {
        self.inner.borrow().response.clone()
    }

    /// The close status code.
    #[must_use]
    pub fn code(&self) -> u16 {
        self.inner.borrow().request.code
    }

    /// The close reason.
    #[must_use]
    pub fn reason(&self) -> String {
        self.inner.borrow().request.reason.clone()
    }

    /// Whether the connection is closing cleanly.
    #[must_use]
    pub fn was_clean(&self) -> bool {
        self.inner.borrow().request.was_clean
    }

    /// Whether the response has already been triggered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().response.is_some()
    }

    /// Resolve the handshake, echoing the stored request fields unchanged
    /// and transitioning the socket to CLOSED.
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeAlreadyClosed`] if a response was already triggered.
    pub fn respond(&self) -> Result<()> {
        let (socket, response) = {
            let mut inner = self.inner.borrow_mut();
            if inner.response.is_some() {
                return Err(Error::HandshakeAlreadyClosed { handshake: "close" });
            }
            let socket = FakeWebSocket::from_weak(&inner.socket).ok_or(Error::SocketGone)?;
            let response = inner.request.clone();
            inner.response = Some(response.clone());
            (socket, response)
        };

        socket.finalize_close(response.code, response.reason, response.was_clean);
        Ok(())
    }
}

impl std::fmt::Debug for CloseHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("CloseHandshake")
            .field("request", &inner.request)
            .field("response", &inner.response)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Protocols;
    use crate::socket::{FakeWebSocket, ReadyState};

    fn open_socket() -> FakeWebSocket {
        let ws = FakeWebSocket::connect("ws://localhost:9200", Protocols::none()).unwrap();
        ws.open_handshake().respond().unwrap();
        ws
    }

    #[test]
    fn test_request_stores_close_fields() {
        let ws = open_socket();
        ws.close_with(1000, "bye").unwrap();

        let handshake = ws.close_handshake().unwrap();
        assert_eq!(handshake.code(), 1000);
        assert_eq!(handshake.reason(), "bye");
        assert!(handshake.was_clean());
        assert!(handshake.response().is_none());
    }

    #[test]
    fn test_respond_echoes_request_unchanged() {
        let ws = open_socket();
        ws.close_with(4000, "done").unwrap();

        let handshake = ws.close_handshake().unwrap();
        handshake.respond().unwrap();

        assert_eq!(handshake.response(), Some(handshake.request()));
        assert_eq!(ws.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_second_resolution_errors() {
        let ws = open_socket();
        ws.close().unwrap();

        let handshake = ws.close_handshake().unwrap();
        handshake.respond().unwrap();
        assert_eq!(
            handshake.respond(),
            Err(Error::HandshakeAlreadyClosed { handshake: "close" })
        );
        // State never regresses.
        assert_eq!(ws.ready_state(), ReadyState::Closed);
    }

    #[test]
    fn test_resolving_after_socket_dropped_errors() {
        let handshake = {
            let ws = open_socket();
            ws.close().unwrap();
            ws.close_handshake().unwrap()
        };
        assert_eq!(handshake.respond(), Err(Error::SocketGone));
    }
}
