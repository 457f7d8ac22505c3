//! Lossless text-safe payload encoding.
//!
//! Block bodies travel inside a markup attribute between the compile pass
//! and the post-processing pass, so everything an attribute could choke on
//! is percent-encoded. The encoding must round-trip exactly: the adapter
//! receives the verbatim block body, quotes, newlines and all.

use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};

/// Attribute-hostile bytes, plus `%` itself so decoding is unambiguous.
const PAYLOAD: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'\'')
    .add(b'<')
    .add(b'>')
    .add(b'&')
    .add(b'%')
    .add(b'\\')
    .add(b'`');

pub fn encode_payload(payload: &str) -> String {
    utf8_percent_encode(payload, PAYLOAD).to_string()
}

pub fn decode_payload(encoded: &str) -> String {
    percent_decode_str(encoded).decode_utf8_lossy().into_owned()
}
