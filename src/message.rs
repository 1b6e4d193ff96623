//! Message payloads, binary type tagging, and subprotocol lists.

use bytes::Bytes;

/// A message payload exchanged over the fake connection.
///
/// Binary payloads are tagged as `Blob` or `ArrayBuffer` to mirror the two
/// forms the browser API can deliver; no encoding or decoding happens, the
/// bytes pass through untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageData {
    /// A text payload.
    Text(String),
    /// A binary payload tagged as a `Blob`.
    Blob(Bytes),
    /// A binary payload tagged as an `ArrayBuffer`.
    ArrayBuffer(Bytes),
}

impl MessageData {
    /// Create a blob-tagged binary payload.
    #[must_use]
    pub fn blob(data: impl Into<Bytes>) -> Self {
        MessageData::Blob(data.into())
    }

    /// Create an array-buffer-tagged binary payload.
    #[must_use]
    pub fn array_buffer(data: impl Into<Bytes>) -> Self {
        MessageData::ArrayBuffer(data.into())
    }

    /// Payload size in bytes (UTF-8 length for text).
    #[must_use]
    pub fn byte_len(&self) -> usize {
        match self {
            MessageData::Text(s) => s.len(),
            MessageData::Blob(b) | MessageData::ArrayBuffer(b) => b.len(),
        }
    }

    /// Returns `true` for a text payload with no content.
    ///
    /// The browser `send('')` is a silent no-op; the socket uses this to
    /// reproduce that quirk.
    #[must_use]
    pub fn is_empty_text(&self) -> bool {
        matches!(self, MessageData::Text(s) if s.is_empty())
    }

    /// Borrow the text content, if this is a text payload.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageData::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the binary content, if this is a blob or array-buffer payload.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            MessageData::Blob(b) | MessageData::ArrayBuffer(b) => Some(b),
            MessageData::Text(_) => None,
        }
    }
}

impl From<&str> for MessageData {
    fn from(value: &str) -> Self {
        MessageData::Text(value.to_string())
    }
}

impl From<String> for MessageData {
    fn from(value: String) -> Self {
        MessageData::Text(value)
    }
}

/// How binary data is exposed to the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BinaryType {
    /// Binary data is delivered in blob form (the browser default).
    #[default]
    Blob,
    /// Binary data is delivered in array-buffer form.
    ArrayBuffer,
}

impl std::fmt::Display for BinaryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryType::Blob => write!(f, "blob"),
            BinaryType::ArrayBuffer => write!(f, "arraybuffer"),
        }
    }
}

/// The ordered list of subprotocols offered at construction time.
///
/// The browser constructor accepts either a single string or a sequence of
/// strings; the `From` implementations mirror that, normalizing a single
/// string into a one-element list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Protocols(Vec<String>);

impl Protocols {
    /// The empty protocol list (the constructor default).
    #[must_use]
    pub fn none() -> Self {
        Self(Vec::new())
    }

    /// The offered subprotocol names, in offer order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Whether no subprotocol was offered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The comma-joined form carried by the `Sec-WebSocket-Protocol` header.
    #[must_use]
    pub fn to_header_value(&self) -> String {
        self.0.join(",")
    }
}

impl From<&str> for Protocols {
    fn from(value: &str) -> Self {
        Self(vec![value.to_string()])
    }
}

impl From<String> for Protocols {
    fn from(value: String) -> Self {
        Self(vec![value])
    }
}

impl From<Vec<String>> for Protocols {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl From<&[&str]> for Protocols {
    fn from(value: &[&str]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Protocols {
    fn from(value: [&str; N]) -> Self {
        Self(value.iter().map(|s| s.to_string()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload() {
        let data = MessageData::from("hello");
        assert_eq!(data.as_text(), Some("hello"));
        assert_eq!(data.as_bytes(), None);
        assert_eq!(data.byte_len(), 5);
        assert!(!data.is_empty_text());
    }

    #[test]
    fn test_empty_text_detection() {
        assert!(MessageData::from("").is_empty_text());
        assert!(!MessageData::blob(Vec::new()).is_empty_text());
    }

    #[test]
    fn test_binary_payloads_keep_their_tag() {
        let blob = MessageData::blob(vec![1, 2, 3]);
        let buffer = MessageData::array_buffer(vec![1, 2, 3]);
        assert_ne!(blob, buffer);
        assert_eq!(blob.as_bytes(), Some([1, 2, 3].as_slice()));
        assert_eq!(buffer.byte_len(), 3);
    }

    #[test]
    fn test_binary_type_display() {
        assert_eq!(BinaryType::Blob.to_string(), "blob");
        assert_eq!(BinaryType::ArrayBuffer.to_string(), "arraybuffer");
        assert_eq!(BinaryType::default(), BinaryType::Blob);
    }

    #[test]
    fn test_single_protocol_normalized_to_one_element() {
        let protocols = Protocols::from("proto");
        assert_eq!(protocols.names(), ["proto".to_string()]);
    }

    #[test]
    fn test_protocol_list_keeps_order() {
        let protocols = Protocols::from(["chat", "superchat"]);
        assert_eq!(protocols.to_header_value(), "chat,superchat");
    }

    #[test]
    fn test_empty_protocols() {
        assert!(Protocols::none().is_empty());
        assert_eq!(Protocols::none().to_header_value(), "");
    }
}
