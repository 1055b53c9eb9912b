//! MEGA-style URL-safe base64 encoding/decoding.
//!
//! MEGA uses a variant of base64 that:
//! - Replaces `+` with `-`
//! - Replaces `/` with `_`
//! - Removes padding `=` characters
//!
//! Node handles are six bytes wide and encode to eight characters.

use base64::{Engine, engine::general_purpose};

use crate::error::{MegaError, Result};
use crate::fs::Handle;

/// Width of a node handle on the wire.
pub const NODE_HANDLE_LEN: usize = 6;

/// Encode bytes to MEGA's URL-safe base64 (no padding).
///
/// # Example
/// ```
/// use megafacade::base64::base64url_encode;
/// let encoded = base64url_encode(b"hello");
/// assert!(!encoded.contains('='));
/// assert!(!encoded.contains('+'));
/// assert!(!encoded.contains('/'));
/// ```
pub fn base64url_encode(data: &[u8]) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(data)
}

/// Decode MEGA's URL-safe base64 to bytes.
///
/// Standard-alphabet input and trailing padding are accepted too, since
/// links pasted by users are not always normalized.
pub fn base64url_decode(s: &str) -> std::result::Result<Vec<u8>, base64::DecodeError> {
    let normalized = s
        .trim_end_matches('=')
        .replace('+', "-")
        .replace('/', "_");
    general_purpose::URL_SAFE_NO_PAD.decode(normalized)
}

/// Encode a node handle as its eight-character base64 form.
pub fn handle_to_base64(handle: Handle) -> String {
    base64url_encode(&handle.to_le_bytes()[..NODE_HANDLE_LEN])
}

/// Decode an eight-character base64 node handle.
pub fn base64_to_handle(encoded: &str) -> Result<Handle> {
    let bytes = base64url_decode(encoded)?;
    if bytes.len() != NODE_HANDLE_LEN {
        return Err(MegaError::Custom(format!(
            "Invalid handle length: expected {}, got {}",
            NODE_HANDLE_LEN,
            bytes.len()
        )));
    }
    let mut raw = [0u8; 8];
    raw[..NODE_HANDLE_LEN].copy_from_slice(&bytes);
    Ok(Handle::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_padding() {
        let encoded = base64url_encode(b"test");
        assert!(!encoded.contains('='));
    }

    #[test]
    fn test_url_safe_chars() {
        let data: Vec<u8> = (0..255).collect();
        let encoded = base64url_encode(&data);
        assert!(!encoded.contains('+'));
        assert!(!encoded.contains('/'));
    }

    #[test]
    fn test_decode_accepts_standard_alphabet() {
        let data = [0xfbu8, 0xff, 0xbf];
        assert_eq!(base64url_decode("-_-_").unwrap(), data);
        assert_eq!(base64url_decode("+/+/").unwrap(), data);
        assert_eq!(base64url_decode("aGk=").unwrap(), b"hi");
    }

    #[test]
    fn test_handle_encoding() {
        let handle: Handle = 0x0000_a1b2_c3d4_e5f6;
        let encoded = handle_to_base64(handle);
        assert_eq!(encoded.len(), 8);
        assert_eq!(base64_to_handle(&encoded).unwrap(), handle);
    }

    #[test]
    fn test_handle_wrong_length() {
        assert!(base64_to_handle("AAAA").is_err());
        assert!(base64_to_handle("!!!!!!!!").is_err());
    }
}
