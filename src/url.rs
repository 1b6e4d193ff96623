//! Connection URL parsing and validation.
//!
//! The WHATWG WebSocket constructor only accepts `ws:` and `wss:` URLs and
//! rejects URLs carrying a fragment identifier. [`SocketUrl`] is the parsed,
//! immutable decomposition of a valid connection URL; the heavy lifting is
//! delegated to the `url` crate.

use crate::error::{Error, Result};
use url::Url;

/// Parsed decomposition of a WebSocket connection URL.
///
/// Immutable once parsed; owned by the socket that parsed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketUrl {
    scheme: String,
    hostname: String,
    port: Option<u16>,
    path: String,
    query: Option<String>,
    fragment: Option<String>,
}

impl SocketUrl {
    /// Parse and validate a connection URL.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidUrl`] if the URL cannot be parsed.
    /// - [`Error::InvalidScheme`] unless the scheme is exactly `ws` or `wss`.
    /// - [`Error::FragmentNotAllowed`] if the URL carries a non-empty
    ///   fragment. A bare trailing `#` is tolerated.
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|_| Error::InvalidUrl(input.to_string()))?;

        let scheme = url.scheme().to_string();
        if scheme != "ws" && scheme != "wss" {
            return Err(Error::InvalidScheme(scheme));
        }

        if let Some(fragment) = url.fragment() {
            if !fragment.is_empty() {
                return Err(Error::FragmentNotAllowed(fragment.to_string()));
            }
        }

        let hostname = url.host_str().unwrap_or_default().to_string();

        // ws/wss are special schemes, so the url crate guarantees a path
        // starting with '/' and strips default ports (80/443).
        Ok(Self {
            scheme,
            hostname,
            port: url.port(),
            path: url.path().to_string(),
            query: url.query().map(str::to_string),
            fragment: url.fragment().map(str::to_string),
        })
    }

    /// The URL scheme, `ws` or `wss`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The HTTP scheme used for the fake upgrade request
    /// (`ws` → `http`, `wss` → `https`).
    #[must_use]
    pub fn http_scheme(&self) -> &'static str {
        if self.scheme == "ws" { "http" } else { "https" }
    }

    /// The hostname without the port.
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// The explicit port, if any. Default ports are stripped during parsing.
    #[must_use]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// The host part, `hostname[:port]`.
    #[must_use]
    pub fn host(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.hostname, port),
            None => self.hostname.clone(),
        }
    }

    /// The URL path. Always begins with `/`.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The query string, without the leading `?`.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// The fragment, without the leading `#`. Only ever empty or absent on a
    /// successfully parsed URL.
    #[must_use]
    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    /// The origin of the connection: scheme and host, with path and query
    /// stripped (e.g. `ws://localhost:9200`).
    #[must_use]
    pub fn origin(&self) -> String {
        format!("{}://{}", self.scheme, self.host())
    }
}

impl std::fmt::Display for SocketUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host(), self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}
