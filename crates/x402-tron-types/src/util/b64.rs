//! Base64 encoding and decoding for header values.
//!
//! Payment payloads and settlement responses travel as standard, padded
//! base64 in HTTP headers. [`Base64Bytes`] holds such a value and converts
//! it to and from raw bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use std::borrow::Cow;
use std::fmt::Display;

/// Base64 text as bytes, borrowed from a header or owned after encoding.
///
/// ```rust
/// use x402_tron_types::util::Base64Bytes;
///
/// let encoded = Base64Bytes::encode(b"tron:nile");
/// assert_eq!(encoded.to_string(), "dHJvbjpuaWxl");
///
/// let decoded = Base64Bytes::from(" dHJvbjpuaWxl ".as_bytes()).decode().unwrap();
/// assert_eq!(decoded, b"tron:nile");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Bytes<'a>(pub Cow<'a, [u8]>);

impl Base64Bytes<'_> {
    /// Decodes to raw bytes. Surrounding ASCII whitespace is ignored.
    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        b64.decode(self.0.trim_ascii())
    }

    pub fn encode<T: AsRef<[u8]>>(input: T) -> Base64Bytes<'static> {
        let encoded = b64.encode(input.as_ref());
        Base64Bytes(Cow::Owned(encoded.into_bytes()))
    }
}

impl AsRef<[u8]> for Base64Bytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<'a> From<&'a [u8]> for Base64Bytes<'a> {
    fn from(slice: &'a [u8]) -> Self {
        Base64Bytes(Cow::Borrowed(slice))
    }
}

impl<'a> From<&'a str> for Base64Bytes<'a> {
    fn from(s: &'a str) -> Self {
        Base64Bytes(Cow::Borrowed(s.as_bytes()))
    }
}

impl Display for Base64Bytes<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(self.0.as_ref()))
    }
}
