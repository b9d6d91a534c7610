//! Conversion between fixed-capacity null-terminated buffers and Rust strings
//!
//! Callback payloads are single-byte text. Bytes decode as Latin-1; characters outside
//! Latin-1 encode as `?`.

use crate::error::{Error, Result};
use encoding_rs::mem;
use std::borrow::Cow;
use std::ffi::CString;

/// Decode the text held in `buffer`
///
/// Scanning stops at the first zero byte or at the end of the slice, whichever comes
/// first; nothing past `buffer.len()` is read.
pub(crate) fn decode(buffer: &[u8]) -> String {
    let end = buffer.iter().position(|&b| b == 0).unwrap_or(buffer.len());
    mem::decode_latin1(&buffer[..end]).into_owned()
}

/// Zero-fill `buffer`, then write as much of `text` as fits while keeping one trailing
/// zero byte. Longer text is truncated. Returns the number of text bytes written.
pub(crate) fn encode(text: &str, buffer: &mut [u8]) -> usize {
    buffer.fill(0);
    let Some(room) = buffer.len().checked_sub(1) else {
        return 0;
    };

    let bytes = to_single_byte(text);
    let len = bytes.len().min(room);
    buffer[..len].copy_from_slice(&bytes[..len]);
    len
}

/// Like [`encode`], but fails instead of truncating. `buffer` is left untouched on error.
pub(crate) fn encode_exact(text: &str, buffer: &mut [u8]) -> Result<usize> {
    let bytes = to_single_byte(text);
    if bytes.len() >= buffer.len() {
        return Err(Error::Encoding(format!(
            "{} bytes do not fit a {}-byte buffer with terminator",
            bytes.len(),
            buffer.len()
        )));
    }

    buffer.fill(0);
    buffer[..bytes.len()].copy_from_slice(&bytes);
    Ok(bytes.len())
}

/// Null-terminated single-byte copy of `text` for names, masks and paths sent to the engine
///
/// Unlike callback text, these are never substituted: a `?` would turn into a wildcard.
pub(crate) fn to_cstring(text: &str) -> Result<CString> {
    if !mem::is_str_latin1(text) {
        return Err(Error::Encoding(format!("{text:?} has characters outside Latin-1")));
    }
    CString::new(mem::encode_latin1_lossy(text).into_owned())
        .map_err(|_| Error::InvalidArgument(format!("{text:?} contains a null byte")))
}

fn to_single_byte(text: &str) -> Cow<'_, [u8]> {
    if mem::is_str_latin1(text) {
        mem::encode_latin1_lossy(text)
    } else {
        Cow::Owned(
            text.chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
        )
    }
}
