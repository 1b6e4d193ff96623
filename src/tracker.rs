//! A registry of fake connections, in creation order.

use crate::error::Result;
use crate::message::Protocols;
use crate::socket::FakeWebSocket;
use std::cell::RefCell;
use std::rc::Rc;

/// An explicit registry of fake sockets, in creation order.
///
/// Code under test rarely hands its socket back to the test; the tracker
/// closes that gap. Construct sockets through [`connect`] (or register
/// externally created ones with [`track`]) and the test can query the
/// connections the code under test opened, most recent last.
///
/// Cloneable shared handle, so the tracker can be passed into the code under
/// test as a socket factory while the test keeps its own handle for queries.
///
/// [`connect`]: ConnectionTracker::connect
/// [`track`]: ConnectionTracker::track
#[derive(Clone, Default)]
pub struct ConnectionTracker {
    sockets: Rc<RefCell<Vec<FakeWebSocket>>>,
}

impl ConnectionTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct a fake socket and register it.
    ///
    /// # Errors
    ///
    /// Same conditions as [`FakeWebSocket::connect`]; a rejected socket is
    /// not registered.
    pub fn connect(&self, url: &str, protocols: impl Into<Protocols>) -> Result<FakeWebSocket> {
        let socket = FakeWebSocket::connect(url, protocols)?;
        self.track(&socket);
        Ok(socket)
    }

    /// Register an externally created socket. Re-tracking a socket already
    /// in the registry is a no-op.
    pub fn track(&self, socket: &FakeWebSocket) {
        let mut sockets = self.sockets.borrow_mut();
        if !sockets.iter().any(|existing| existing.same(socket)) {
            sockets.push(socket.clone());
        }
    }

    /// Forget every tracked socket. The sockets themselves are unaffected.
    pub fn reset(&self) {
        self.sockets.borrow_mut().clear();
    }

    /// Number of tracked sockets.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sockets.borrow().len()
    }

    /// The most recently created socket, if any.
    #[must_use]
    pub fn most_recent(&self) -> Option<FakeWebSocket> {
        self.sockets.borrow().last().cloned()
    }

    /// The first socket created since the last reset, if any.
    #[must_use]
    pub fn first(&self) -> Option<FakeWebSocket> {
        self.sockets.borrow().first().cloned()
    }

    /// The socket at `index` in creation order, if any.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<FakeWebSocket> {
        self.sockets.borrow().get(index).cloned()
    }

    /// All tracked sockets, in creation order. Defensive copy.
    #[must_use]
    pub fn all(&self) -> Vec<FakeWebSocket> {
        self.sockets.borrow().clone()
    }
}

impl std::fmt::Debug for ConnectionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionTracker")
            .field("count", &self.count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_empty_tracker_queries() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.count(), 0);
        assert!(tracker.most_recent().is_none());
        assert!(tracker.first().is_none());
        assert!(tracker.at(0).is_none());
        assert!(tracker.all().is_empty());
    }

    #[test]
    fn test_connect_registers_in_creation_order() {
        let tracker = ConnectionTracker::new();
        let a = tracker.connect("ws://localhost/a", Protocols::none()).unwrap();
        let b = tracker.connect("ws://localhost/b", Protocols::none()).unwrap();

        assert_eq!(tracker.count(), 2);
        assert!(tracker.first().unwrap().same(&a));
        assert!(tracker.most_recent().unwrap().same(&b));
        assert!(tracker.at(1).unwrap().same(&b));
        assert!(tracker.at(2).is_none());
    }

    #[test]
    fn test_rejected_socket_is_not_registered() {
        let tracker = ConnectionTracker::new();
        let result = tracker.connect("http://localhost", Protocols::none());
        assert!(matches!(result, Err(Error::InvalidScheme(_))));
        assert_eq!(tracker.count(), 0);
    }

    #[test]
    fn test_track_deduplicates_by_identity() {
        let tracker = ConnectionTracker::new();
        let ws = FakeWebSocket::connect("ws://localhost", Protocols::none()).unwrap();
        tracker.track(&ws);
        tracker.track(&ws.clone());
        assert_eq!(tracker.count(), 1);
    }

    #[test]
    fn test_reset_forgets_sockets_but_leaves_them_usable() {
        let tracker = ConnectionTracker::new();
        let ws = tracker.connect("ws://localhost", Protocols::none()).unwrap();
        tracker.reset();

        assert_eq!(tracker.count(), 0);
        ws.open_handshake().respond().unwrap();
        assert_eq!(ws.ready_state(), crate::ReadyState::Open);
    }

    #[test]
    fn test_clones_share_the_registry() {
        let tracker = ConnectionTracker::new();
        let clone = tracker.clone();
        tracker.connect("ws://localhost", Protocols::none()).unwrap();
        assert_eq!(clone.count(), 1);
    }
}
