//! The fake WebSocket: the protocol state machine behind the browser API.
//!
//! A [`FakeWebSocket`] is a cloneable shared handle. Sharing is required by
//! the model itself: the handshakes keep a back-reference to drive state
//! transitions, events carry their target, and listeners may re-enter the
//! socket they are registered on (for example to close it). Everything is
//! single-threaded and synchronous; every operation runs to completion
//! before returning.

mod state;

pub use state::ReadyState;

use crate::error::{Error, Result};
use crate::event::{EventKind, EventPhase, EventType, Listener, WsEvent};
use crate::handshake::{CloseHandshake, HandshakeResponse, OpenHandshake};
use crate::message::{BinaryType, MessageData, Protocols};
use crate::url::SocketUrl;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};
use tracing::error;

/// Maximum UTF-8 byte length of a close reason (RFC 6455 Section 5.5.1:
/// a close frame payload is at most 125 bytes, 2 of which carry the code).
const MAX_REASON_BYTES: usize = 123;

pub(crate) type WeakSocket = Weak<RefCell<SocketInner>>;

pub(crate) struct SocketInner {
    url: SocketUrl,
    requested_protocols: Protocols,
    ready_state: ReadyState,
    protocol: Option<String>,
    extensions: Option<String>,
    binary_type: BinaryType,
    buffered_amount: u64,
    listeners: HashMap<EventType, Vec<Listener>>,
    sent_messages: Vec<MessageData>,
    open_handshake: OpenHandshake,
    close_handshake: Option<CloseHandshake>,
    on_open: Option<Listener>,
    on_message: Option<Listener>,
    on_close: Option<Listener>,
    on_error: Option<Listener>,
}

/// A fake `WebSocket`, immediately establishing a fake connection.
///
/// Construction validates the URL and subprotocol list the way the browser
/// constructor does, then begins a simulated open handshake. Test code acts
/// as the server by resolving the pending [`OpenHandshake`], exchanging data
/// through [`send`]/[`emit_message`], and finishing the connection through
/// [`close`]/[`emit_close`] and the [`CloseHandshake`].
///
/// [`send`]: FakeWebSocket::send
/// [`emit_message`]: FakeWebSocket::emit_message
/// [`close`]: FakeWebSocket::close
/// [`emit_close`]: FakeWebSocket::emit_close
#[derive(Clone)]
pub struct FakeWebSocket {
    inner: Rc<RefCell<SocketInner>>,
}

impl FakeWebSocket {
    /// The connection has not yet been established (`readyState == 0`).
    pub const CONNECTING: ReadyState = ReadyState::Connecting;
    /// The connection is established (`readyState == 1`).
    pub const OPEN: ReadyState = ReadyState::Open;
    /// The closing handshake is in progress (`readyState == 2`).
    pub const CLOSING: ReadyState = ReadyState::Closing;
    /// The connection has been closed or could not be opened
    /// (`readyState == 3`).
    pub const CLOSED: ReadyState = ReadyState::Closed;

    /// Create a fake socket connecting to `url` with the given subprotocol
    /// offer, immediately establishing the connection: the socket starts in
    /// CONNECTING with a pending open handshake.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`], [`Error::InvalidScheme`] or
    ///   [`Error::FragmentNotAllowed`] for a malformed connection URL.
    /// - [`Error::DuplicateProtocol`] naming the first subprotocol that
    ///   appears more than once.
    pub fn connect(url: &str, protocols: impl Into<Protocols>) -> Result<Self> {
        let url = SocketUrl::parse(url)?;
        let protocols = protocols.into();

        let mut seen = HashSet::new();
        for name in protocols.names() {
            if !seen.insert(name.as_str()) {
                return Err(Error::DuplicateProtocol(name.clone()));
            }
        }

        // Establish the connection: CONNECTING, nothing negotiated yet, and
        // a freshly synthesized open handshake.
        let inner = Rc::new_cyclic(|weak: &WeakSocket| {
            RefCell::new(SocketInner {
                open_handshake: OpenHandshake::new(weak.clone(), &url, &protocols),
                url,
                requested_protocols: protocols,
                ready_state: ReadyState::Connecting,
                protocol: None,
                extensions: None,
                binary_type: BinaryType::Blob,
                buffered_amount: 0,
                listeners: HashMap::new(),
                sent_messages: Vec::new(),
                close_handshake: None,
                on_open: None,
                on_message: None,
                on_close: None,
                on_error: None,
            })
        });

        Ok(Self { inner })
    }

    pub(crate) fn from_weak(weak: &WeakSocket) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn downgrade(&self) -> WeakSocket {
        Rc::downgrade(&self.inner)
    }

    /// Identity comparison: `true` only for handles sharing the same
    /// underlying connection.
    #[must_use]
    pub fn same(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The URL the connection was established over.
    #[must_use]
    pub fn url(&self) -> SocketUrl {
        self.inner.borrow().url.clone()
    }

    /// The subprotocols offered at construction time.
    #[must_use]
    pub fn requested_protocols(&self) -> Protocols {
        self.inner.borrow().requested_protocols.clone()
    }

    /// The state of the connection.
    #[must_use]
    pub fn ready_state(&self) -> ReadyState {
        self.inner.borrow().ready_state
    }

    /// The subprotocol selected by the server, if any. `None` until the open
    /// handshake resolves with a `Sec-WebSocket-Protocol` header.
    #[must_use]
    pub fn protocol(&self) -> Option<String> {
        self.inner.borrow().protocol.clone()
    }

    /// The extensions selected by the server, if any. `None` until the open
    /// handshake resolves with a `Sec-WebSocket-Extensions` header.
    #[must_use]
    pub fn extensions(&self) -> Option<String> {
        self.inner.borrow().extensions.clone()
    }

    /// Bytes queued through [`send`] so far. Never resets, not even after
    /// the connection closes.
    ///
    /// [`send`]: FakeWebSocket::send
    #[must_use]
    pub fn buffered_amount(&self) -> u64 {
        self.inner.borrow().buffered_amount
    }

    /// How binary data is exposed to the receiving side.
    #[must_use]
    pub fn binary_type(&self) -> BinaryType {
        self.inner.borrow().binary_type
    }

    /// Update the binary type. The assigned value persists.
    pub fn set_binary_type(&self, binary_type: BinaryType) {
        self.inner.borrow_mut().binary_type = binary_type;
    }

    /// The pending (or resolved) open handshake.
    #[must_use]
    pub fn open_handshake(&self) -> OpenHandshake {
        self.inner.borrow().open_handshake.clone()
    }

    /// The close handshake, once one has been created.
    #[must_use]
    pub fn close_handshake(&self) -> Option<CloseHandshake> {
        self.inner.borrow().close_handshake.clone()
    }

    /// All messages sent so far, in call order. Defensive copy.
    #[must_use]
    pub fn sent_messages(&self) -> Vec<MessageData> {
        self.inner.borrow().sent_messages.clone()
    }

    /// Register `listener` for events of the given type.
    ///
    /// Listeners fire in registration order. A listener already registered
    /// for the type (same identity, see [`Listener::same`]) is not added
    /// again.
    pub fn add_event_listener(&self, event_type: EventType, listener: &Listener) {
        let mut inner = self.inner.borrow_mut();
        let listeners = inner.listeners.entry(event_type).or_default();
        if !listeners.iter().any(|existing| existing.same(listener)) {
            listeners.push(listener.clone());
        }
    }

    /// Remove a previously registered listener. No-op if the type has no
    /// listeners or the identity does not match any of them.
    pub fn remove_event_listener(&self, event_type: EventType, listener: &Listener) {
        let mut inner = self.inner.borrow_mut();
        if let Some(listeners) = inner.listeners.get_mut(&event_type) {
            if let Some(idx) = listeners.iter().position(|existing| existing.same(listener)) {
                listeners.remove(idx);
            }
        }
    }

    /// Registered listeners for the given type, in registration order.
    /// Defensive copy.
    #[must_use]
    pub fn event_listeners(&self, event_type: EventType) -> Vec<Listener> {
        self.inner
            .borrow()
            .listeners
            .get(&event_type)
            .cloned()
            .unwrap_or_default()
    }

    /// All registered listeners across every event type. Defensive copy.
    #[must_use]
    pub fn all_event_listeners(&self) -> Vec<Listener> {
        self.inner
            .borrow()
            .listeners
            .values()
            .flatten()
            .cloned()
            .collect()
    }

    /// The direct `open` handler.
    #[must_use]
    pub fn onopen(&self) -> Option<Listener> {
        self.inner.borrow().on_open.clone()
    }

    /// Set or clear the direct `open` handler.
    pub fn set_onopen(&self, listener: Option<Listener>) {
        self.inner.borrow_mut().on_open = listener;
    }

    /// The direct `message` handler.
    #[must_use]
    pub fn onmessage(&self) -> Option<Listener> {
        self.inner.borrow().on_message.clone()
    }

    /// Set or clear the direct `message` handler.
    pub fn set_onmessage(&self, listener: Option<Listener>) {
        self.inner.borrow_mut().on_message = listener;
    }

    /// The direct `close` handler.
    #[must_use]
    pub fn onclose(&self) -> Option<Listener> {
        self.inner.borrow().on_close.clone()
    }

    /// Set or clear the direct `close` handler.
    pub fn set_onclose(&self, listener: Option<Listener>) {
        self.inner.borrow_mut().on_close = listener;
    }

    /// The direct `error` handler.
    #[must_use]
    pub fn onerror(&self) -> Option<Listener> {
        self.inner.borrow().on_error.clone()
    }

    /// Set or clear the direct `error` handler.
    pub fn set_onerror(&self, listener: Option<Listener>) {
        self.inner.borrow_mut().on_error = listener;
    }

    /// Dispatch an event at this socket, synchronously invoking the direct
    /// handler for the event's type first, then the registered listeners in
    /// registration order.
    ///
    /// The stopped flag is re-checked before every listener, so a
    /// mid-dispatch [`stop_immediate_propagation`] halts the remainder.
    /// Listener failures are logged and swallowed: one bad listener must not
    /// break the event contract for the others.
    ///
    /// Returns whether the event was both cancelable and default-prevented
    /// (never `true` in practice: no event type here is cancelable).
    ///
    /// [`stop_immediate_propagation`]: WsEvent::stop_immediate_propagation
    pub fn dispatch_event(&self, event: &mut WsEvent) -> bool {
        event.set_phase(EventPhase::AtTarget);

        let (direct, listeners) = {
            let inner = self.inner.borrow();
            let direct = match event.event_type() {
                EventType::Open => inner.on_open.clone(),
                EventType::Message => inner.on_message.clone(),
                EventType::Close => inner.on_close.clone(),
                EventType::Error => inner.on_error.clone(),
            };
            let listeners = inner
                .listeners
                .get(&event.event_type())
                .cloned()
                .unwrap_or_default();
            (direct, listeners)
        };

        if let Some(handler) = direct {
            if let Err(err) = handler.invoke(event) {
                error!(event_type = %event.event_type(), error = %err, "direct event handler failed");
            }
        }

        if !event.stopped() {
            for listener in listeners {
                if event.stopped() {
                    break;
                }
                if let Err(err) = listener.invoke(event) {
                    error!(event_type = %event.event_type(), error = %err, "event listener failed");
                }
            }
        }

        event.set_phase(EventPhase::None);
        event.cancelable() && event.default_prevented()
    }

    /// Transmit data over the fake connection, appending it to the sent log.
    ///
    /// Sending the empty string is a silent no-op, mirroring the browser
    /// API. Any other payload also grows [`buffered_amount`] by its byte
    /// length.
    ///
    /// # Errors
    ///
    /// - [`Error::StillConnecting`] before the connection is established.
    /// - [`Error::AlreadyClosingOrClosed`] once closing has started.
    ///
    /// [`buffered_amount`]: FakeWebSocket::buffered_amount
    pub fn send(&self, data: impl Into<MessageData>) -> Result<()> {
        let data = data.into();
        let mut inner = self.inner.borrow_mut();
        match inner.ready_state {
            ReadyState::Connecting => Err(Error::StillConnecting),
            ReadyState::Closing | ReadyState::Closed => Err(Error::AlreadyClosingOrClosed),
            ReadyState::Open => {
                if !data.is_empty_text() {
                    inner.buffered_amount += data.byte_len() as u64;
                    inner.sent_messages.push(data);
                }
                Ok(())
            }
        }
    }

    /// Close the connection with the default code 1005 and an empty reason.
    ///
    /// No-op if the socket is already CLOSING or CLOSED. Otherwise installs
    /// a clean close handshake (if none exists yet) and moves to CLOSING;
    /// the connection finishes closing when the handshake resolves.
    ///
    /// An explicit close while still CONNECTING skips straight to the
    /// closing handshake without firing an `error` event: the caller asked
    /// for a clean closure, not a connection failure.
    ///
    /// # Errors
    ///
    /// See [`close_with`](FakeWebSocket::close_with); the default code and
    /// reason are always accepted.
    pub fn close(&self) -> Result<()> {
        self.do_close(1005, String::new())
    }

    /// Close the connection with an explicit code and reason.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidCloseCode`] unless `code` is exactly 1000 or in
    ///   3000..=4999.
    /// - [`Error::ReasonTooLong`] if the reason exceeds 123 bytes of UTF-8.
    pub fn close_with(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        if code != 1000 && !(3000..=4999).contains(&code) {
            return Err(Error::InvalidCloseCode(code));
        }
        self.do_close(code, reason.into())
    }

    fn do_close(&self, code: u16, reason: String) -> Result<()> {
        if reason.len() > MAX_REASON_BYTES {
            return Err(Error::ReasonTooLong {
                len: reason.len(),
                max: MAX_REASON_BYTES,
            });
        }

        let mut inner = self.inner.borrow_mut();
        if inner.ready_state.is_closing_or_closed() {
            return Ok(());
        }

        // The close handshake is created at most once; a handshake installed
        // earlier by a connection failure keeps its unclean fields.
        if inner.close_handshake.is_none() {
            inner.close_handshake =
                Some(CloseHandshake::new(self.downgrade(), code, reason, true));
        }

        inner.ready_state = ReadyState::Closing;
        Ok(())
    }

    /// Deliver a message from the simulated server, dispatching exactly one
    /// `message` event carrying `data`.
    ///
    /// # Errors
    ///
    /// [`Error::NotOpen`] (naming the actual state) unless the socket is
    /// OPEN.
    pub fn emit_message(&self, data: impl Into<MessageData>) -> Result<()> {
        let state = self.ready_state();
        if state != ReadyState::Open {
            return Err(Error::NotOpen(state));
        }

        let mut event = WsEvent::message(self.clone(), data.into());
        self.dispatch_event(&mut event);
        Ok(())
    }

    /// Simulate a server-initiated closure: fail the connection with the
    /// given code, reason and clean flag, moving to CLOSING with an `error`
    /// event. The `close` event fires once the installed close handshake
    /// resolves.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyClosed`] if the socket is CLOSED.
    /// - [`Error::AlreadyClosing`] if the socket is CLOSING.
    pub fn emit_close(&self, code: u16, reason: impl Into<String>, was_clean: bool) -> Result<()> {
        match self.ready_state() {
            ReadyState::Closed => Err(Error::AlreadyClosed),
            ReadyState::Closing => Err(Error::AlreadyClosing),
            _ => {
                self.fail_connection(code, reason.into(), was_clean);
                Ok(())
            }
        }
    }

    /// Simulate an abnormal server-initiated closure: code 1006, empty
    /// reason, not clean.
    ///
    /// # Errors
    ///
    /// Same conditions as [`emit_close`](FakeWebSocket::emit_close).
    pub fn emit_abnormal_closure(&self) -> Result<()> {
        self.emit_close(1006, "", false)
    }

    /// Open-connection transition, invoked by the open handshake on a
    /// status-101 resolution.
    pub(crate) fn open_connection(&self, response: &HandshakeResponse) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.ready_state = ReadyState::Open;
            inner.protocol = response.headers.get("Sec-WebSocket-Protocol").cloned();
            inner.extensions = response.headers.get("Sec-WebSocket-Extensions").cloned();
        }

        let mut event = WsEvent::new(EventKind::Open, self.clone());
        self.dispatch_event(&mut event);
    }

    /// Fail-connection transition, invoked on a non-101 handshake resolution
    /// or a server-initiated closure: CLOSING, install (or replace) the
    /// close handshake, fire `error`.
    pub(crate) fn fail_connection(&self, code: u16, reason: String, was_clean: bool) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.ready_state = ReadyState::Closing;
            inner.close_handshake =
                Some(CloseHandshake::new(self.downgrade(), code, reason, was_clean));
        }

        let mut event = WsEvent::new(EventKind::Error, self.clone());
        self.dispatch_event(&mut event);
    }

    /// Finalize-close transition, invoked by the close handshake on
    /// resolution: CLOSED, fire `close` with the handshake's fields.
    pub(crate) fn finalize_close(&self, code: u16, reason: String, was_clean: bool) {
        self.inner.borrow_mut().ready_state = ReadyState::Closed;

        let mut event = WsEvent::new(
            EventKind::Close {
                code,
                reason,
                was_clean,
            },
            self.clone(),
        );
        self.dispatch_event(&mut event);
    }
}

impl std::fmt::Debug for FakeWebSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("FakeWebSocket")
            .field("url", &inner.url.to_string())
            .field("ready_state", &inner.ready_state)
            .finish()
    }
}
