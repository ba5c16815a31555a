use std::fmt;

/// An API token presented as a bearer credential on every call.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerToken(String);

impl BearerToken {
    /// Build a token from raw credential bytes, trimming surrounding whitespace.
    ///
    /// Returns `None` when the bytes are not UTF-8 or the token is empty.
    pub fn from_bytes(raw: &[u8]) -> Option<Self> {
        let text = std::str::from_utf8(raw).ok()?.trim();
        if text.is_empty() {
            None
        } else {
            Some(Self(text.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("BearerToken(<redacted>)")
    }
}
