//! Event listener registration handles.
//!
//! The browser `addEventListener` accepts either a plain callable or an
//! object exposing a `handleEvent` method, and deduplicates by reference
//! identity. [`Listener`] reproduces both: the [`EventListener`] trait is the
//! `handleEvent` form, [`Listener::from_fn`] wraps a closure, and cloneable
//! `Rc` handles give listeners the identity the registration contract needs.

use crate::event::WsEvent;
use std::cell::RefCell;
use std::rc::Rc;

/// Error type a listener may surface.
///
/// Listener failures are caught at the dispatch boundary, logged, and never
/// propagated to the caller of `dispatch_event`.
pub type ListenerError = Box<dyn std::error::Error>;

/// A handler for events dispatched on a fake socket.
pub trait EventListener {
    /// Handle a dispatched event.
    ///
    /// # Errors
    ///
    /// A returned error is logged by the dispatcher and does not prevent the
    /// remaining listeners from running.
    fn handle_event(&mut self, event: &mut WsEvent) -> Result<(), ListenerError>;
}

struct FnListener<F>(F);

impl<F> EventListener for FnListener<F>
where
    F: FnMut(&mut WsEvent),
{
    fn handle_event(&mut self, event: &mut WsEvent) -> Result<(), ListenerError> {
        (self.0)(event);
        Ok(())
    }
}

/// A cloneable, identity-comparable listener handle.
///
/// Cloning the handle does not clone the listener: all clones refer to the
/// same underlying handler and compare equal under [`Listener::same`], so a
/// clone can be used to remove a previously registered listener.
#[derive(Clone)]
pub struct Listener {
    inner: Rc<RefCell<dyn EventListener>>,
}

impl Listener {
    /// Wrap an [`EventListener`] implementation.
    #[must_use]
    pub fn new(listener: impl EventListener + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(listener)),
        }
    }

    /// Wrap a plain closure.
    #[must_use]
    pub fn from_fn(f: impl FnMut(&mut WsEvent) + 'static) -> Self {
        Self::new(FnListener(f))
    }

    /// Identity comparison: `true` only for handles cloned from the same
    /// registration, never for structurally equal listeners.
    #[must_use]
    pub fn same(&self, other: &Listener) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Invoke the listener with the given event.
    ///
    /// A listener that re-enters itself through a nested dispatch is skipped
    /// with an error instead of aborting the dispatch.
    pub(crate) fn invoke(&self, event: &mut WsEvent) -> Result<(), ListenerError> {
        let mut handler = self
            .inner
            .try_borrow_mut()
            .map_err(|_| -> ListenerError { "listener re-entered during its own dispatch".into() })?;
        handler.handle_event(event)
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Listener({:p})", Rc::as_ptr(&self.inner))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::socket::FakeWebSocket;

    fn open_event() -> WsEvent {
        let ws = FakeWebSocket::connect("ws://localhost/", crate::Protocols::none()).unwrap();
        WsEvent::new(EventKind::Open, ws)
    }

    #[test]
    fn test_closure_listener_runs() {
        let seen = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&seen);
        let listener = Listener::from_fn(move |_| *counter.borrow_mut() += 1);

        let mut event = open_event();
        listener.invoke(&mut event).unwrap();
        listener.invoke(&mut event).unwrap();
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn test_handle_event_object_form() {
        struct Recorder {
            types: Vec<String>,
        }

        impl EventListener for Recorder {
            fn handle_event(&mut self, event: &mut WsEvent) -> Result<(), ListenerError> {
                self.types.push(event.event_type().to_string());
                Ok(())
            }
        }

        let listener = Listener::new(Recorder { types: Vec::new() });
        listener.invoke(&mut open_event()).unwrap();
    }

    #[test]
    fn test_clones_share_identity() {
        let listener = Listener::from_fn(|_| {});
        let clone = listener.clone();
        assert!(listener.same(&clone));
    }

    #[test]
    fn test_distinct_listeners_differ() {
        let a = Listener::from_fn(|_| {});
        let b = Listener::from_fn(|_| {});
        assert!(!a.same(&b));
    }

    #[test]
    fn test_listener_error_is_returned_not_panicked() {
        struct Failing;

        impl EventListener for Failing {
            fn handle_event(&mut self, _event: &mut WsEvent) -> Result<(), ListenerError> {
                Err("boom".into())
            }
        }

        let listener = Listener::new(Failing);
        assert!(listener.invoke(&mut open_event()).is_err());
    }
}
