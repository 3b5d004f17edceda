//! Compression codec for stored CV documents.
//!
//! CVs are persisted as deflate-compressed, base64-encoded text so they fit
//! a text-oriented document field. The codec is a pure storage-size
//! optimization: `decompress(compress(x)) == x` for any text, and it must
//! never alter document content.
//!
//! Legacy rows predate compression and hold raw HTML. `decompress` detects a
//! document prefix and passes such input through unchanged instead of trying
//! to decode it.

use std::io::{Read, Write};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("token is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("token failed to inflate: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("inflated bytes are not valid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Compresses HTML text into a printable storage token.
pub fn compress(text: &str) -> String {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // Writing into a Vec cannot fail.
    encoder
        .write_all(text.as_bytes())
        .expect("deflate into Vec cannot fail");
    let compressed = encoder.finish().expect("deflate into Vec cannot fail");
    BASE64.encode(compressed)
}

/// Decompresses a storage token back into HTML text.
///
/// Input that already reads as a document (legacy uncompressed rows) is
/// returned unchanged. A malformed token is reported as a typed error —
/// callers fall back to raw content where available or surface a
/// content-unavailable state; they must not crash.
pub fn decompress(token: &str) -> Result<String, CodecError> {
    if looks_like_document(token) {
        return Ok(token.to_string());
    }
    let bytes = BASE64.decode(token.trim())?;
    let mut decoder = ZlibDecoder::new(&bytes[..]);
    let mut buf = Vec::new();
    decoder.read_to_end(&mut buf)?;
    Ok(String::from_utf8(buf)?)
}

fn looks_like_document(text: &str) -> bool {
    let head = text.trim_start();
    let prefix: String = head.chars().take(10).collect::<String>().to_lowercase();
    prefix.starts_with("<!doctype") || prefix.starts_with("<html")
}
