//! Length header encoding and decoding.

use crate::error::FrameError;

/// Header width used by existing clients.
pub const DEFAULT_HEADER_WIDTH: usize = 64;

/// Narrowest header a server will run with. Eight digits frame any reply
/// under 100 MB, which covers every names array and error text.
pub const MIN_HEADER_WIDTH: usize = 8;

/// Format a length header: ASCII decimal, right-padded with spaces to `width`.
pub fn encode_header(len: usize, width: usize) -> Result<Vec<u8>, FrameError> {
    let digits = len.to_string();
    if digits.len() > width {
        return Err(FrameError::HeaderOverflow { len, width });
    }

    let mut header = Vec::with_capacity(width);
    header.extend_from_slice(digits.as_bytes());
    header.resize(width, b' ');
    Ok(header)
}

/// Decode a length header.
///
/// Surrounding ASCII whitespace and NUL padding are ignored, so both
/// left- and right-padded headers are accepted. A blank header decodes to 0.
pub fn parse_header(header: &[u8]) -> Result<usize, FrameError> {
    let text = std::str::from_utf8(header)
        .map_err(|_| FrameError::InvalidHeader(String::from_utf8_lossy(header).into_owned()))?;

    let trimmed = text.trim_matches(|c: char| c.is_ascii_whitespace() || c == '\0');
    if trimmed.is_empty() {
        return Ok(0);
    }

    if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FrameError::InvalidHeader(trimmed.to_string()));
    }

    trimmed
        .parse()
        .map_err(|_| FrameError::InvalidHeader(trimmed.to_string()))
}
