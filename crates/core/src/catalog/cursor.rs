//! Opaque cursors and safe slicing over a sorted view.
//!
//! A cursor is the standard base64 encoding of an absolute decimal offset
//! into the sorted index (`0` is `"MA=="`).

use base64::{engine::general_purpose::STANDARD, Engine};

/// Encode an absolute offset as an opaque cursor.
pub fn encode_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

/// Decode a cursor back to its offset.
///
/// Anything that is not base64 of a non-negative decimal integer yields `None`.
pub fn decode_cursor(cursor: Option<&str>) -> Option<usize> {
    let bytes = STANDARD.decode(cursor?).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    text.parse::<usize>().ok()
}

/// Cut `sorted[offset .. offset + limit]`, clamped to the slice bounds.
///
/// Returns the window and the full length of `sorted`.
pub fn slice<T: Clone>(sorted: &[T], limit: usize, offset: usize) -> (Vec<T>, usize) {
    let total_count = sorted.len();
    let start = offset.min(total_count);
    let end = start.saturating_add(limit).min(total_count);

    if start >= end {
        return (Vec::new(), total_count);
    }
    (sorted[start..end].to_vec(), total_count)
}
