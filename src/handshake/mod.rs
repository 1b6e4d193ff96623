//! Fake handshakes gating the socket's state transitions.
//!
//! A handshake is a one-shot request/response exchange. The request is built
//! by the socket; the response is triggered exactly once by test code acting
//! as the server, driving the socket into its next state. Re-resolving a
//! handshake is a usage error.

mod close;
mod key;
mod open;

pub use close::{CloseHandshake, CloseRequest};
pub use key::{WS_GUID, compute_accept_key, generate_key};
pub use open::{HandshakeRequest, HandshakeResponse, OpenHandshake, PartialResponse};
