//! Byte input decoding.
//!
//! Markup handed to the ingestor as raw bytes is turned into UTF-8 text here:
//! a byte order mark picks the initial encoding, and an `encoding="..."`
//! pseudo-attribute in a leading declaration may override it. Anything other
//! than UTF-8 is transcoded through `encoding_rs`.

use std::borrow::Cow;

use thiserror::Error;

/// Byte input could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("encoding error: {message}")]
pub struct EncodingError {
    /// What went wrong.
    pub message: String,
}

impl EncodingError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Inspects a byte order mark, returning the encoding label it implies and
/// the number of bytes it occupies. Without a mark, UTF-8 is assumed.
///
/// # Examples
///
/// ```
/// use tagtree::encoding::sniff_bom;
///
/// assert_eq!(sniff_bom(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
/// assert_eq!(sniff_bom(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
/// assert_eq!(sniff_bom(b"<a/>"), ("UTF-8", 0));
/// ```
#[must_use]
pub fn sniff_bom(bytes: &[u8]) -> (&'static str, usize) {
    match bytes {
        [0xEF, 0xBB, 0xBF, ..] => ("UTF-8", 3),
        [0xFE, 0xFF, ..] => ("UTF-16BE", 2),
        [0xFF, 0xFE, ..] => ("UTF-16LE", 2),
        _ => ("UTF-8", 0),
    }
}

/// Decodes `bytes` from the encoding named by `label` (any WHATWG label).
///
/// # Errors
///
/// Returns [`EncodingError`] for an unknown label or for byte sequences that
/// are invalid in that encoding.
pub fn transcode(bytes: &[u8], label: &str) -> Result<String, EncodingError> {
    let encoding = encoding_rs::Encoding::for_label(label.as_bytes())
        .ok_or_else(|| EncodingError::new(format!("unsupported encoding: {label}")))?;
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(EncodingError::new(format!(
            "malformed byte sequence for encoding {label}"
        )));
    }
    Ok(text.into_owned())
}

/// Decodes markup bytes to UTF-8, honoring a byte order mark and a declared
/// encoding. The mark itself is never part of the result.
///
/// # Errors
///
/// Returns [`EncodingError`] if no usable encoding can decode the input.
pub fn decode_to_utf8(bytes: &[u8]) -> Result<Cow<'_, str>, EncodingError> {
    let (bom_label, skip) = sniff_bom(bytes);
    let content = &bytes[skip..];

    if bom_label != "UTF-8" {
        return transcode(content, bom_label).map(Cow::Owned);
    }

    let declared = declared_encoding(content);
    match declared {
        Some(label) if !is_utf8_label(&label) => transcode(content, &label).map(Cow::Owned),
        _ => std::str::from_utf8(content)
            .map(Cow::Borrowed)
            .map_err(|e| EncodingError::new(format!("input is not valid UTF-8: {e}"))),
    }
}

/// Reads the `encoding` pseudo-attribute out of a leading `<?xml ...?>`
/// declaration. The declaration is ASCII by construction, so the raw bytes
/// are scanned directly.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(200)];
    if !head.starts_with(b"<?xml") {
        return None;
    }
    let end = head.windows(2).position(|w| w == b"?>")?;
    let decl = &head[..end];
    let at = decl.windows(8).position(|w| w == b"encoding")?;
    let rest = trim_ascii_start(&decl[at + 8..]);
    let rest = trim_ascii_start(rest.strip_prefix(b"=")?);
    let quote = *rest.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let rest = &rest[1..];
    let close = rest.iter().position(|&b| b == quote)?;
    let label = &rest[..close];
    label
        .is_ascii()
        .then(|| String::from_utf8_lossy(label).into_owned())
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let skip = bytes
        .iter()
        .take_while(|b| matches!(b, b' ' | b'\t' | b'\r' | b'\n'))
        .count();
    &bytes[skip..]
}

fn is_utf8_label(label: &str) -> bool {
    label.eq_ignore_ascii_case("UTF-8") || label.eq_ignore_ascii_case("UTF8")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sniff_boms() {
        assert_eq!(sniff_bom(b"\xEF\xBB\xBF<a/>"), ("UTF-8", 3));
        assert_eq!(sniff_bom(b"\xFE\xFF\x00<"), ("UTF-16BE", 2));
        assert_eq!(sniff_bom(b"\xFF\xFE<\x00"), ("UTF-16LE", 2));
        assert_eq!(sniff_bom(b""), ("UTF-8", 0));
        assert_eq!(sniff_bom(b"\xEF"), ("UTF-8", 0));
    }

    #[test]
    fn test_decode_plain_utf8_borrows() {
        let decoded = decode_to_utf8(b"<root>hello</root>").unwrap();
        assert!(matches!(decoded, Cow::Borrowed(_)));
        assert_eq!(decoded, "<root>hello</root>");
    }

    #[test]
    fn test_decode_strips_utf8_bom() {
        let decoded = decode_to_utf8(b"\xEF\xBB\xBF<root/>").unwrap();
        assert_eq!(decoded, "<root/>");
    }

    #[test]
    fn test_decode_utf16le() {
        let bytes = b"\xFF\xFE<\x00a\x00/\x00>\x00";
        assert_eq!(decode_to_utf8(bytes).unwrap(), "<a/>");
    }

    #[test]
    fn test_decode_declared_latin1() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>");
        bytes.extend_from_slice(b"<root>caf\xE9</root>");
        let decoded = decode_to_utf8(&bytes).unwrap();
        assert!(decoded.contains("caf\u{00E9}"));
    }

    #[test]
    fn test_declared_encoding_single_quotes() {
        let label = declared_encoding(b"<?xml version='1.0' encoding='windows-1252'?><r/>");
        assert_eq!(label.as_deref(), Some("windows-1252"));
        assert_eq!(declared_encoding(b"<?xml version=\"1.0\"?><r/>"), None);
        assert_eq!(declared_encoding(b"<r/>"), None);
    }

    #[test]
    fn test_transcode_unknown_label() {
        let err = transcode(b"hello", "NOT-AN-ENCODING").unwrap_err();
        assert!(err.message.contains("unsupported encoding"));
        assert_eq!(
            err.to_string(),
            "encoding error: unsupported encoding: NOT-AN-ENCODING"
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        assert!(decode_to_utf8(&[0x80, 0x81, 0x82]).is_err());
    }
}
