//! Case-insensitive HTTP/1.1 status-line and header parsing over byte slices.
//!
//! Grounded on the reference's `strstr_lc` and the hand-rolled header
//! scanning in `ota_get_final_location` / `ota_get_file_ex`, reimplemented
//! without the reference's latent bug: `strstr_lc` computes
//! `strlen(haystack) - strlen(needle)` as an *unsigned* loop bound, which
//! underflows (wrapping to a huge value) whenever the haystack is shorter
//! than the needle. The search below bails out up front instead.

/// Case-insensitive substring search. Returns the byte offset of the first
/// match, or `None` if `needle` does not occur in `haystack` or is longer
/// than it.
pub fn find_ci(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

/// Returns the offset just past the first `\r\n\r\n`, i.e. the start of the
/// response body, if the header block is complete in `buf`.
pub fn find_header_end(buf: &[u8]) -> Option<usize> {
    find_ci(buf, b"\r\n\r\n").map(|pos| pos + 4)
}

/// Parses the status code off a line beginning with `HTTP/1.1` (matched
/// case-insensitively, per the wire protocol's requirement).
pub fn parse_status_code(buf: &[u8]) -> Option<u16> {
    let start = find_ci(buf, b"http/1.1 ")? + 9;
    let rest = &buf[start..];
    let end = rest.iter().position(|&b| !b.is_ascii_digit()).unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    core::str::from_utf8(&rest[..end]).ok()?.parse().ok()
}

/// Returns the trimmed value of the named header (case-insensitive), i.e.
/// the bytes between `Name:` and the following `\r\n`.
pub fn find_header_value<'a>(buf: &'a [u8], name: &str) -> Option<&'a [u8]> {
    // Search with a leading "\n" so we never match a name that's merely a
    // suffix of another header (e.g. "Content-Length" inside
    // "X-Content-Length"), mirroring the reference's "\ncontent-length:"
    // needle.
    let mut needle_buf = [0u8; 64];
    let needle = build_needle(&mut needle_buf, name)?;
    let pos = find_ci(buf, needle)?;
    let value_start = pos + needle.len();
    let rest = &buf[value_start..];
    let value_end = find_ci(rest, b"\r").unwrap_or(rest.len());
    let mut value = &rest[..value_end];
    while value.first() == Some(&b' ') {
        value = &value[1..];
    }
    Some(value)
}

fn build_needle<'a>(buf: &'a mut [u8; 64], name: &str) -> Option<&'a [u8]> {
    let needed = name.len() + 2; // "\n" + name + ":"
    if needed > buf.len() {
        return None;
    }
    buf[0] = b'\n';
    buf[1..1 + name.len()].copy_from_slice(name.as_bytes());
    buf[1 + name.len()] = b':';
    Some(&buf[..needed])
}

/// Parses a `Content-Length:` header value as a `u32`.
pub fn parse_content_length(buf: &[u8]) -> Option<u32> {
    let value = find_header_value(buf, "content-length")?;
    core::str::from_utf8(value).ok()?.trim().parse().ok()
}

/// Parses the total resource size `Z` out of a `Content-Range: bytes X-Y/Z`
/// header value.
pub fn parse_content_range_total(buf: &[u8]) -> Option<u32> {
    let value = find_header_value(buf, "content-range")?;
    let slash = value.iter().position(|&b| b == b'/')?;
    core::str::from_utf8(&value[slash + 1..]).ok()?.trim().parse().ok()
}

/// Parses a `Location:` header, applying the redirect-target normalization
/// the wire protocol requires: trim at CR (done by `find_header_value`), skip
/// one optional leading space (also done by `find_header_value`), then skip a
/// leading `//` if the target is protocol-relative.
pub fn parse_location<'a>(buf: &'a [u8]) -> Option<&'a [u8]> {
    let value = find_header_value(buf, "location")?;
    Some(value.strip_prefix(b"//").unwrap_or(value))
}
