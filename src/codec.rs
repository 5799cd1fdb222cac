//! Codec
//!
//! Reversible encoding of keys and values into whitespace-free tokens so
//! arbitrary bytes survive the line-oriented journal format. An empty byte
//! string encodes to an empty token.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

/// Encode bytes into a journal token
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decode a journal token back into bytes
pub fn decode(token: &str) -> Result<Vec<u8>, base64::DecodeError> {
    STANDARD.decode(token)
}
