//! DOM-style event objects dispatched by the fake socket.
//!
//! A single concrete [`WsEvent`] type carries a tagged [`EventKind`] payload
//! instead of the browser's `Event`/`MessageEvent`/`CloseEvent` class
//! hierarchy. Phase tracking and propagation control are implemented for API
//! compatibility; there is no DOM tree, so events are only ever dispatched
//! at their target.

mod listener;

pub use listener::{EventListener, Listener, ListenerError};

use crate::message::MessageData;
use crate::socket::FakeWebSocket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Counter backing the unique, monotonically increasing `last_event_id`
/// attached to every message event.
static NEXT_EVENT_ID: AtomicU64 = AtomicU64::new(0);

/// The four event types a fake socket can dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// The connection was established.
    Open,
    /// A message was received.
    Message,
    /// The connection finished closing.
    Close,
    /// The connection failed or was closed abnormally.
    Error,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventType::Open => write!(f, "open"),
            EventType::Message => write!(f, "message"),
            EventType::Close => write!(f, "close"),
            EventType::Error => write!(f, "error"),
        }
    }
}

/// Which phase of the event flow is currently being evaluated.
///
/// Capturing and bubbling are structurally present for compatibility with the
/// DOM contract but never used: dispatch goes straight to `AtTarget`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum EventPhase {
    /// No event is being processed at this time.
    #[default]
    None = 0,
    /// The event is being propagated down toward its target (unused).
    CapturingPhase = 1,
    /// The event has arrived at its target.
    AtTarget = 2,
    /// The event is propagating back up from its target (unused).
    BubblingPhase = 3,
}

/// Event payload variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// An `open` event, dispatched when the open handshake succeeds.
    Open,
    /// An `error` event, dispatched when the connection fails.
    Error,
    /// A `message` event carrying received data.
    Message {
        /// The received payload.
        data: MessageData,
        /// Unique, monotonically increasing event identifier.
        last_event_id: u64,
        /// Origin of the emitter: socket URL scheme and host, path stripped.
        origin: String,
    },
    /// A `close` event carrying the result of the close handshake.
    Close {
        /// The close status code.
        code: u16,
        /// The close reason.
        reason: String,
        /// Whether the connection closed cleanly.
        was_clean: bool,
    },
}

impl EventKind {
    /// The event type this payload is dispatched as.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        match self {
            EventKind::Open => EventType::Open,
            EventKind::Error => EventType::Error,
            EventKind::Message { .. } => EventType::Message,
            EventKind::Close { .. } => EventType::Close,
        }
    }
}

/// An event dispatched on a fake socket.
///
/// No event type in this system is cancelable, so `prevent_default` is
/// effectively a no-op; it still honors the `cancelable` flag so the general
/// contract holds.
#[derive(Debug, Clone)]
pub struct WsEvent {
    kind: EventKind,
    target: FakeWebSocket,
    phase: EventPhase,
    cancelable: bool,
    default_prevented: bool,
    bubbles: bool,
    is_trusted: bool,
    time_stamp: u128,
    stopped: bool,
    /// Legacy mutable alias for "propagation stopped".
    pub cancel_bubble: bool,
    /// Legacy mutable alias for "default not prevented".
    pub return_value: bool,
}

impl WsEvent {
    /// Create an event of the given kind targeting `target`.
    #[must_use]
    pub fn new(kind: EventKind, target: FakeWebSocket) -> Self {
        let time_stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();

        Self {
            kind,
            target,
            phase: EventPhase::None,
            cancelable: false,
            default_prevented: false,
            bubbles: false,
            is_trusted: true,
            time_stamp,
            stopped: false,
            cancel_bubble: false,
            return_value: true,
        }
    }

    /// Create a `message` event, assigning the next unique event id and
    /// deriving the origin from the target's URL.
    #[must_use]
    pub fn message(target: FakeWebSocket, data: MessageData) -> Self {
        let last_event_id = NEXT_EVENT_ID.fetch_add(1, Ordering::Relaxed);
        let origin = target.url().origin();
        Self::new(
            EventKind::Message {
                data,
                last_event_id,
                origin,
            },
            target,
        )
    }

    /// The event type.
    #[must_use]
    pub fn event_type(&self) -> EventType {
        self.kind.event_type()
    }

    /// The event payload.
    #[must_use]
    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The socket the event was dispatched on.
    #[must_use]
    pub fn target(&self) -> &FakeWebSocket {
        &self.target
    }

    /// The currently registered target. Always the same as [`target`]: there
    /// is no tree to retarget through.
    ///
    /// [`target`]: WsEvent::target
    #[must_use]
    pub fn current_target(&self) -> &FakeWebSocket {
        &self.target
    }

    /// The current evaluation phase.
    #[must_use]
    pub fn event_phase(&self) -> EventPhase {
        self.phase
    }

    /// Whether the event is cancelable. Always `false` here.
    #[must_use]
    pub fn cancelable(&self) -> bool {
        self.cancelable
    }

    /// Whether `prevent_default` has been called on a cancelable event.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Whether the event bubbles. Always `false` here.
    #[must_use]
    pub fn bubbles(&self) -> bool {
        self.bubbles
    }

    /// Whether the event was generated by the implementation rather than
    /// synthesized by test code.
    #[must_use]
    pub fn is_trusted(&self) -> bool {
        self.is_trusted
    }

    /// Creation time, in milliseconds since the Unix epoch.
    #[must_use]
    pub fn time_stamp(&self) -> u128 {
        self.time_stamp
    }

    /// Cancel the event, if it is cancelable.
    pub fn prevent_default(&mut self) {
        if self.cancelable {
            self.default_prevented = true;
        }
    }

    /// Stop the propagation of the event beyond the current target.
    pub fn stop_propagation(&mut self) {
        self.cancel_bubble = true;
    }

    /// Stop propagation and suppress every listener not yet invoked for the
    /// current dispatch.
    pub fn stop_immediate_propagation(&mut self) {
        self.cancel_bubble = true;
        self.stopped = true;
    }

    /// The received payload, for `message` events.
    #[must_use]
    pub fn data(&self) -> Option<&MessageData> {
        match &self.kind {
            EventKind::Message { data, .. } => Some(data),
            _ => None,
        }
    }

    /// The unique event identifier, for `message` events.
    #[must_use]
    pub fn last_event_id(&self) -> Option<u64> {
        match &self.kind {
            EventKind::Message { last_event_id, .. } => Some(*last_event_id),
            _ => None,
        }
    }

    /// The emitter origin, for `message` events.
    #[must_use]
    pub fn origin(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Message { origin, .. } => Some(origin),
            _ => None,
        }
    }

    /// The close status code, for `close` events.
    #[must_use]
    pub fn code(&self) -> Option<u16> {
        match &self.kind {
            EventKind::Close { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// The close reason, for `close` events.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match &self.kind {
            EventKind::Close { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Whether the connection closed cleanly, for `close` events.
    #[must_use]
    pub fn was_clean(&self) -> Option<bool> {
        match &self.kind {
            EventKind::Close { was_clean, .. } => Some(*was_clean),
            _ => None,
        }
    }

    pub(crate) fn set_phase(&mut self, phase: EventPhase) {
        self.phase = phase;
    }

    pub(crate) fn stopped(&self) -> bool {
        self.stopped
    }
}
