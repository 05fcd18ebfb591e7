//! Primitives over UTF-16 code units
//!
//! Every algorithm in this crate measures positions and lengths in UTF-16
//! code units so that serialized deltas and patches are interoperable with
//! other engines that fix the same unit. Strings cross the API boundary as
//! `&str` and are converted here.

use thiserror::Error;

pub(crate) fn to_units(text: &str) -> Vec<u16> {
    text.encode_utf16().collect()
}

pub(crate) fn to_string_lossy(units: &[u16]) -> String {
    String::from_utf16_lossy(units)
}

/// Determine the number of units common to the start of both slices.
///
/// Binary search over candidate lengths, comparing whole chunks at a time.
pub(crate) fn common_prefix_len(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() || a[0] != b[0] {
        return 0;
    }
    let mut pointer_min = 0;
    let mut pointer_max = a.len().min(b.len());
    let mut pointer_mid = pointer_max;
    let mut pointer_start = 0;
    while pointer_min < pointer_mid {
        if a[pointer_start..pointer_mid] == b[pointer_start..pointer_mid] {
            pointer_min = pointer_mid;
            pointer_start = pointer_min;
        } else {
            pointer_max = pointer_mid;
        }
        pointer_mid = (pointer_max - pointer_min) / 2 + pointer_min;
    }
    pointer_mid
}

/// Determine the number of units common to the end of both slices.
pub(crate) fn common_suffix_len(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() || a[a.len() - 1] != b[b.len() - 1] {
        return 0;
    }
    let mut pointer_min = 0;
    let mut pointer_max = a.len().min(b.len());
    let mut pointer_mid = pointer_max;
    let mut pointer_end = 0;
    while pointer_min < pointer_mid {
        if a[a.len() - pointer_mid..a.len() - pointer_end]
            == b[b.len() - pointer_mid..b.len() - pointer_end]
        {
            pointer_min = pointer_mid;
            pointer_end = pointer_min;
        } else {
            pointer_max = pointer_mid;
        }
        pointer_mid = (pointer_max - pointer_min) / 2 + pointer_min;
    }
    pointer_mid
}

/// Determine if the suffix of `a` is the prefix of `b`, returning the number
/// of overlapping units.
pub(crate) fn common_overlap_len(a: &[u16], b: &[u16]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    // Truncate the longer slice.
    let a = if a.len() > b.len() {
        &a[a.len() - b.len()..]
    } else {
        a
    };
    let b = if b.len() > a.len() { &b[..a.len()] } else { b };
    let text_length = a.len();
    if a == b {
        return text_length;
    }
    // Start by looking for a single unit match and increase length until no
    // match is found.
    let mut best = 0;
    let mut length = 1;
    loop {
        let pattern = &a[text_length.saturating_sub(length)..];
        let found = match find_sub(b, pattern, 0) {
            Some(found) => found,
            None => return best,
        };
        length += found;
        if found == 0 || a[text_length.saturating_sub(length)..] == b[..length] {
            best = length;
            length += 1;
        }
    }
}

/// Index of the first occurrence of `needle` in `haystack` at or after
/// `from`.
pub(crate) fn find_sub(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let last = haystack.len() - needle.len();
    if from > last {
        return None;
    }
    (from..=last).find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// Index of the last occurrence of `needle` in `haystack` starting at or
/// before `from`.
pub(crate) fn rfind_sub(haystack: &[u16], needle: &[u16], from: usize) -> Option<usize> {
    if needle.is_empty() {
        return Some(from.min(haystack.len()));
    }
    if needle.len() > haystack.len() {
        return None;
    }
    let last = (haystack.len() - needle.len()).min(from);
    (0..=last).rev().find(|&i| haystack[i..i + needle.len()] == *needle)
}

/// An error returned when a percent-encoded payload cannot be decoded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A `%` escape was cut off by the end of the input
    #[error("truncated percent escape")]
    TruncatedEscape,
    /// A `%` escape did not carry two hex digits
    #[error("invalid percent escape `%{0}`")]
    InvalidEscape(String),
    /// The decoded bytes were not valid UTF-8
    #[error("decoded bytes are not valid UTF-8")]
    InvalidUtf8,
}

// The characters that survive percent-encoding unescaped, beyond
// alphanumerics. Wire compatibility requires exactly this set.
const UNESCAPED: &str = "-_.!~*'();/?:@&=+$,# ";

const HEX: &[u8; 16] = b"0123456789ABCDEF";

/// Percent-encode `units` for the delta and patch wire formats.
///
/// Alphanumerics and the fixed `UNESCAPED` pool pass through; everything
/// else is emitted as uppercase `%XX` escapes of its UTF-8 bytes.
pub(crate) fn percent_encode(units: &[u16]) -> String {
    let text = to_string_lossy(units);
    let mut encoded = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || UNESCAPED.contains(c) {
            encoded.push(c);
        } else {
            let mut buf = [0u8; 4];
            for &byte in c.encode_utf8(&mut buf).as_bytes() {
                encoded.push('%');
                encoded.push(HEX[usize::from(byte >> 4)] as char);
                encoded.push(HEX[usize::from(byte & 0xf)] as char);
            }
        }
    }
    encoded
}

/// Decode a percent-encoded payload back into UTF-16 units.
///
/// Accepts upper- or lower-case hex digits.
pub(crate) fn percent_decode(input: &str) -> Result<Vec<u16>, DecodeError> {
    let raw = input.as_bytes();
    let mut bytes = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] == b'%' {
            let escape = raw.get(i + 1..i + 3).ok_or(DecodeError::TruncatedEscape)?;
            let digit = |b: u8| (b as char).to_digit(16);
            let (hi, lo) = match (digit(escape[0]), digit(escape[1])) {
                (Some(hi), Some(lo)) => (hi, lo),
                _ => {
                    let escape = String::from_utf8_lossy(escape).into_owned();
                    return Err(DecodeError::InvalidEscape(escape));
                }
            };
            bytes.push((hi * 16 + lo) as u8);
            i += 3;
        } else {
            bytes.push(raw[i]);
            i += 1;
        }
    }
    let text = String::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok(to_units(&text))
}
