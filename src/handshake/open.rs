//! The fake open handshake: the HTTP Upgrade request/response pair that
//! establishes a connection.

use crate::error::{Error, Result};
use crate::handshake::key::{compute_accept_key, generate_key};
use crate::message::Protocols;
use crate::socket::{FakeWebSocket, WeakSocket};
use crate::url::SocketUrl;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// The synthesized HTTP Upgrade request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeRequest {
    /// The request method. Always `GET`.
    pub method: &'static str,
    /// The request URL, with the `ws`/`wss` scheme mapped to `http`/`https`.
    pub url: String,
    /// The request headers.
    pub headers: HashMap<String, String>,
}

/// The HTTP response resolving an open handshake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeResponse {
    /// The response status. `101` opens the connection; anything else fails
    /// it.
    pub status: u16,
    /// The response headers.
    pub headers: HashMap<String, String>,
}

/// Caller-supplied fields merged over the status-101 default by
/// [`OpenHandshake::respond_with`].
#[derive(Debug, Clone, Default)]
pub struct PartialResponse {
    /// Response status; defaults to `101`.
    pub status: Option<u16>,
    /// Response headers; default to the success set for status 101, empty
    /// otherwise.
    pub headers: Option<HashMap<String, String>>,
}

impl PartialResponse {
    /// A partial response carrying only a status.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            headers: None,
        }
    }

    /// A partial response carrying a status and headers.
    #[must_use]
    pub fn with_headers(status: u16, headers: HashMap<String, String>) -> Self {
        Self {
            status: Some(status),
            headers: Some(headers),
        }
    }
}

struct OpenInner {
    socket: WeakSocket,
    request: HandshakeRequest,
    response: Option<HandshakeResponse>,
}

/// The fake open handshake owned by a socket.
///
/// Created in the socket constructor with a fully synthesized upgrade
/// request; test code resolves it exactly once through [`respond`],
/// [`respond_with`] or [`fail`], which drives the socket's connection-open or
/// connection-fail transition.
///
/// [`respond`]: OpenHandshake::respond
/// [`respond_with`]: OpenHandshake::respond_with
/// [`fail`]: OpenHandshake::fail
#[derive(Clone)]
pub struct OpenHandshake {
    inner: Rc<RefCell<OpenInner>>,
}

impl OpenHandshake {
    pub(crate) fn new(socket: WeakSocket, url: &SocketUrl, protocols: &Protocols) -> Self {
        let request_url = match url.query() {
            Some(query) => format!("{}://{}{}?{}", url.http_scheme(), url.host(), url.path(), query),
            None => format!("{}://{}{}", url.http_scheme(), url.host(), url.path()),
        };

        let mut headers = HashMap::from([
            ("Upgrade".to_string(), "websocket".to_string()),
            ("Sec-WebSocket-Key".to_string(), generate_key()),
            ("Sec-WebSocket-Version".to_string(), "13".to_string()),
        ]);

        if !protocols.is_empty() {
            headers.insert(
                "Sec-WebSocket-Protocol".to_string(),
                protocols.to_header_value(),
            );
        }

        Self {
            inner: Rc::new(RefCell::new(OpenInner {
                socket,
                request: HandshakeRequest {
                    method: "GET",
                    url: request_url,
                    headers,
                },
                response: None,
            })),
        }
    }

    /// The synthesized upgrade request.
    #[must_use]
    pub fn request(&self) -> HandshakeRequest {
        self.inner.borrow().request.clone()
    }

    /// The triggered response, absent until the handshake is resolved.
    #[must_use]
    pub fn response(&self) -> Option<HandshakeResponse> {
        self.inner.borrow().response.clone()
    }

    /// The request URL.
    #[must_use]
    pub fn url(&self) -> String {
        self.inner.borrow().request.url.clone()
    }

    /// The request method. Always `GET`.
    #[must_use]
    pub fn method(&self) -> &'static str {
        self.inner.borrow().request.method
    }

    /// The request headers (containing for example `Sec-WebSocket-Protocol`).
    #[must_use]
    pub fn headers(&self) -> HashMap<String, String> {
        self.inner.borrow().request.headers.clone()
    }

    /// Whether the response has already been triggered.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().response.is_some()
    }

    /// Resolve the handshake successfully: status 101 with the default
    /// success headers (`Upgrade`, `Connection: Upgrade` and a
    /// `Sec-WebSocket-Accept` computed from the request key).
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeAlreadyClosed`] if a response was already triggered.
    pub fn respond(&self) -> Result<()> {
        self.respond_with(PartialResponse::status(101))
    }

    /// Resolve the handshake with caller-supplied fields merged over the
    /// status-101 default. A non-101 status defaults the headers to empty
    /// instead of the success set, and fails the connection.
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeAlreadyClosed`] if a response was already triggered.
    pub fn respond_with(&self, partial: PartialResponse) -> Result<()> {
        let status = partial.status.unwrap_or(101);
        let headers = partial.headers.unwrap_or_else(|| {
            if status == 101 {
                let key = self.inner.borrow().request.headers["Sec-WebSocket-Key"].clone();
                HashMap::from([
                    ("Upgrade".to_string(), "websocket".to_string()),
                    ("Connection".to_string(), "Upgrade".to_string()),
                    ("Sec-WebSocket-Accept".to_string(), compute_accept_key(&key)),
                ])
            } else {
                HashMap::new()
            }
        });

        self.trigger_response(HandshakeResponse { status, headers })
    }

    /// Fail the handshake with status 500.
    ///
    /// # Errors
    ///
    /// [`Error::HandshakeAlreadyClosed`] if a response was already triggered.
    pub fn fail(&self) -> Result<()> {
        self.fail_with(500)
    }

    /// Fail the handshake with the given status.
    ///
    /// # Errors
    ///
    /// - [`Error::FailWithSuccessStatus`] if `status` is 101; use
    ///   [`respond`](OpenHandshake::respond) for success.
    /// - [`Error::HandshakeAlreadyClosed`] if a response was already
    ///   triggered.
    pub fn fail_with(&self, status: u16) -> Result<()> {
        if status == 101 {
            return Err(Error::FailWithSuccessStatus);
        }
        self.respond_with(PartialResponse::status(status))
    }

    fn trigger_response(&self, response: HandshakeResponse) -> Result<()> {
        let socket = {
            let mut inner = self.inner.borrow_mut();
            if inner.response.is_some() {
                return Err(Error::HandshakeAlreadyClosed { handshake: "open" });
            }
            let socket = FakeWebSocket::from_weak(&inner.socket).ok_or(Error::SocketGone)?;
            // Record the response before running the transition, so a
            // listener re-resolving this handshake hits the already-closed
            // error instead of corrupting state.
            inner.response = Some(response.clone());
            socket
        };

        if response.status == 101 {
            socket.open_connection(&response);
        } else {
            // A redirect or error status means the connection can never be
            // opened. The WebSocket protocol neither retries nor follows
            // redirects, so the socket fails with the abnormal-closure code.
            socket.fail_connection(1006, String::new(), false);
        }

        Ok(())
    }
}

impl std::fmt::Debug for OpenHandshake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("OpenHandshake")
            .field("request", &inner.request)
            .field("response", &inner.response)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::socket::{FakeWebSocket, ReadyState};

    fn socket_with(protocols: Protocols) -> FakeWebSocket {
        FakeWebSocket::connect("ws://localhost:9200/chat?room=1", protocols).unwrap()
    }

    #[test]
    fn test_request_url_maps_scheme_and_keeps_query() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        assert_eq!(handshake.method(), "GET");
        assert_eq!(handshake.url(), "http://localhost:9200/chat?room=1");
    }

    #[test]
    fn test_wss_maps_to_https() {
        let ws = FakeWebSocket::connect("wss://example.com/live", Protocols::none()).unwrap();
        assert_eq!(ws.open_handshake().url(), "https://example.com/live");
    }

    #[test]
    fn test_request_headers_seeded() {
        let headers = socket_with(Protocols::none()).open_handshake().headers();
        assert_eq!(headers["Upgrade"], "websocket");
        assert_eq!(headers["Sec-WebSocket-Version"], "13");
        assert!(headers.contains_key("Sec-WebSocket-Key"));
        assert!(!headers.contains_key("Sec-WebSocket-Protocol"));
    }

    #[test]
    fn test_protocol_header_joined_with_commas() {
        let headers = socket_with(Protocols::from(["chat", "superchat"]))
            .open_handshake()
            .headers();
        assert_eq!(headers["Sec-WebSocket-Protocol"], "chat,superchat");
    }

    #[test]
    fn test_respond_builds_success_headers() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        handshake.respond().unwrap();

        let response = handshake.response().unwrap();
        assert_eq!(response.status, 101);
        assert_eq!(response.headers["Upgrade"], "websocket");
        assert_eq!(response.headers["Connection"], "Upgrade");
        assert_eq!(
            response.headers["Sec-WebSocket-Accept"],
            compute_accept_key(&handshake.request().headers["Sec-WebSocket-Key"])
        );
        assert_eq!(ws.ready_state(), ReadyState::Open);
    }

    #[test]
    fn test_response_absent_until_resolved() {
        let ws = socket_with(Protocols::none());
        assert!(ws.open_handshake().response().is_none());
        assert!(!ws.open_handshake().is_closed());
    }

    #[test]
    fn test_respond_with_non_101_has_empty_headers_and_fails_connection() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        handshake.respond_with(PartialResponse::status(403)).unwrap();

        let response = handshake.response().unwrap();
        assert_eq!(response.status, 403);
        assert!(response.headers.is_empty());
        assert_eq!(ws.ready_state(), ReadyState::Closing);
    }

    #[test]
    fn test_respond_with_custom_headers_kept() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        let headers = HashMap::from([(
            "Sec-WebSocket-Protocol".to_string(),
            "chat".to_string(),
        )]);
        handshake
            .respond_with(PartialResponse::with_headers(101, headers))
            .unwrap();
        assert_eq!(ws.protocol(), Some("chat".to_string()));
    }

    #[test]
    fn test_fail_defaults_to_500() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        handshake.fail().unwrap();
        assert_eq!(handshake.response().unwrap().status, 500);
        assert_eq!(ws.ready_state(), ReadyState::Closing);
    }

    #[test]
    fn test_fail_with_101_is_a_usage_error() {
        let ws = socket_with(Protocols::none());
        let result = ws.open_handshake().fail_with(101);
        assert_eq!(result, Err(Error::FailWithSuccessStatus));
        assert!(ws.open_handshake().response().is_none());
    }

    #[test]
    fn test_second_resolution_always_errors() {
        let ws = socket_with(Protocols::none());
        let handshake = ws.open_handshake();
        handshake.respond().unwrap();

        assert_eq!(
            handshake.respond(),
            Err(Error::HandshakeAlreadyClosed { handshake: "open" })
        );
        assert_eq!(
            handshake.fail(),
            Err(Error::HandshakeAlreadyClosed { handshake: "open" })
        );
        assert_eq!(
            handshake.respond_with(PartialResponse::default()),
            Err(Error::HandshakeAlreadyClosed { handshake: "open" })
        );
    }

    #[test]
    fn test_resolving_after_socket_dropped_errors() {
        let handshake = {
            let ws = socket_with(Protocols::none());
            ws.open_handshake()
        };
        assert_eq!(handshake.respond(), Err(Error::SocketGone));
    }
}
