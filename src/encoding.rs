//! Percent-encoding and -decoding for query components.
//!
//! The encoder follows RFC 3986: everything outside the unreserved set
//! (ALPHA / DIGIT / `-` `.` `_` `~`) is percent-encoded over its UTF-8
//! bytes.  Two decoders are provided:
//!
//! * [`decode`] -- strict, used when re-encoding a raw query string.  A
//!   malformed escape or a non-UTF-8 byte sequence is a hard error,
//!   because silently passing it through would corrupt the re-encoded
//!   query.  `+` decodes to a space.
//! * [`lossy_decode`] -- lenient, used for display accessors
//!   ([`Url::username`](crate::Url::username) /
//!   [`Url::password`](crate::Url::password)) where a malformed escape
//!   should pass through verbatim rather than fail the whole URL.

use crate::Error;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

/// RFC 3986 unreserved set: encode everything except ALPHA / DIGIT /
/// `-` / `.` / `_` / `~`.
const QUERY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encode `raw` into `out`.
///
/// Multi-byte UTF-8 characters are encoded byte-by-byte (`é` → `%C3%A9`).
/// A space becomes `%20`, never `+`.
pub(crate) fn encode_to(out: &mut String, raw: &str) {
    for piece in utf8_percent_encode(raw, QUERY_ENCODE_SET) {
        out.push_str(piece);
    }
}

/// Strictly percent-decode a query component.
///
/// `+` decodes to a space.  `%` must be followed by exactly two hex
/// digits, and the decoded byte sequence must be valid UTF-8; any
/// violation returns a decode error.
pub(crate) fn decode(encoded: &str) -> Result<String, Error> {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' => {
                let (hi, lo) = match (bytes.get(i + 1), bytes.get(i + 2)) {
                    (Some(&hi), Some(&lo)) => (hex_nibble(hi), hex_nibble(lo)),
                    _ => (None, None),
                };
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        out.push(hi << 4 | lo);
                        i += 3;
                    }
                    _ => {
                        return Err(Error::decode(format!(
                            "malformed percent escape at byte {i} in {encoded:?}"
                        )));
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out)
        .map_err(|e| Error::decode(format!("decoded query is not UTF-8: {encoded:?}")).with_source(e))
}

/// Leniently percent-decode: malformed escapes pass through verbatim and
/// `+` is left alone.  Invalid UTF-8 is replaced, never rejected.
pub(crate) fn lossy_decode(encoded: &str) -> String {
    let bytes = encoded.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_nibble(bytes[i + 1]), hex_nibble(bytes[i + 2]))
        {
            out.push(hi << 4 | lo);
            i += 3;
            continue;
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8(out).unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

/// Convert an ASCII hex character to its nibble value.
fn hex_nibble(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        b'a'..=b'f' => Some(b - b'a' + 10),
        _ => None,
    }
}
