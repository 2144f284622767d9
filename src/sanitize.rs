//! Best-effort normalization of text of unknown or mixed encoding.
//!
//! Stored chunks come from whatever files were indexed upstream, so the
//! similarity path treats their text as untrusted bytes: decode if
//! possible, NFKC-normalize, and strip embedded NULs. These functions are
//! total and never panic.

use unicode_normalization::UnicodeNormalization;

/// NFKC-normalize already-decoded text and strip embedded NULs.
///
/// Idempotent: sanitizing sanitized text is a no-op.
pub fn sanitize_text(text: &str) -> String {
    text.nfkc().filter(|&c| c != '\0').collect()
}

/// Decode raw bytes into clean text.
///
/// Tries UTF-8 first, then falls back to Latin-1. Latin-1 maps every byte
/// to the code point with the same value, so the fallback always succeeds
/// and this function always returns a printable string.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => sanitize_text(text),
        Err(_) => {
            let decoded: String = bytes.iter().map(|&b| b as char).collect();
            sanitize_text(&decoded)
        }
    }
}
