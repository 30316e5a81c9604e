//! Codec primitives - digest, compression and URL encodings
//!
//! Thin wrappers over sha2, flate2, base64 and percent-encoding so the rest
//! of the crate speaks in strings.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};
use std::io::Write;

/// Characters left alone by `quote`: unreserved marks plus `/`
const QUOTE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Characters left alone by `quote_plus`, before spaces become `+`
const QUOTE_PLUS_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b' ');

/// SHA-256 of a string as 64 lowercase hex characters
pub fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// zlib-compress bytes at the default level
pub fn compress(bytes: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes)?;
    encoder.finish()
}

pub fn base64_encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// URL path-style percent encoding (`/` kept, space as `%20`)
pub fn quote(input: &str) -> String {
    utf8_percent_encode(input, QUOTE_SET).to_string()
}

/// Form encoding (`/` escaped, space as `+`)
pub fn quote_plus(input: &str) -> String {
    utf8_percent_encode(input, QUOTE_PLUS_SET)
        .to_string()
        .replace(' ', "+")
}
