//! # fakews - Deterministic Fake of the Browser WebSocket API
//!
//! `fakews` is a controllable, fully synchronous test double for the browser
//! `WebSocket` client API. Nothing here opens a network connection: the
//! "server" is your test, driving the connection through explicit handshake
//! objects and emit operations.
//!
//! ## Features
//!
//! - **Browser-faithful lifecycle** with the CONNECTING/OPEN/CLOSING/CLOSED
//!   state machine and its validation rules
//! - **Explicit handshakes** so tests decide exactly when (and whether) the
//!   connection opens and closes
//! - **DOM-style events** with direct handlers, ordered listeners, and
//!   propagation control
//! - **Sent-message log** for asserting on what the code under test
//!   transmitted
//! - **Connection tracker** to capture sockets created inside the code under
//!   test
//! - **Deterministic** with every operation running to completion before
//!   returning
//!
//! ## Quick Start
//!
//! ```rust
//! use fakews::{EventType, FakeWebSocket, Listener, Protocols, ReadyState};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! # fn main() -> fakews::Result<()> {
//! let ws = FakeWebSocket::connect("ws://localhost:9200/chat", "chat-v1")?;
//! assert_eq!(ws.ready_state(), ReadyState::Connecting);
//!
//! let received = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&received);
//! ws.add_event_listener(
//!     EventType::Message,
//!     &Listener::from_fn(move |event| {
//!         if let Some(text) = event.data().and_then(|d| d.as_text()) {
//!             sink.borrow_mut().push(text.to_string());
//!         }
//!     }),
//! );
//!
//! // The test plays the server.
//! ws.open_handshake().respond()?;
//! assert_eq!(ws.ready_state(), ReadyState::Open);
//!
//! ws.send("ping")?;
//! ws.emit_message("pong")?;
//! assert_eq!(*received.borrow(), ["pong"]);
//!
//! ws.close_with(1000, "done")?;
//! let closing = ws.close_handshake().expect("close() creates the close handshake");
//! closing.respond()?;
//! assert_eq!(ws.ready_state(), ReadyState::Closed);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod event;
pub mod handshake;
pub mod message;
pub mod socket;
pub mod tracker;
pub mod url;

pub use error::{Error, Result};
pub use event::{EventKind, EventListener, EventPhase, EventType, Listener, ListenerError, WsEvent};
pub use handshake::{
    CloseHandshake, CloseRequest, HandshakeRequest, HandshakeResponse, OpenHandshake,
    PartialResponse,
};
pub use message::{BinaryType, MessageData, Protocols};
pub use socket::{FakeWebSocket, ReadyState};
pub use tracker::ConnectionTracker;
pub use url::SocketUrl;
