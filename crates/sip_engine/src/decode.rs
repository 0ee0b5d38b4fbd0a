//! Text decoding for report bodies fetched over HTTP or read from disk.

use std::fmt;

use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How many leading bytes are searched for a `<meta charset>` declaration.
const META_SCAN_LIMIT: usize = 1024;

/// Where the encoding used for a body came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharsetSource {
    ByteOrderMark,
    ContentType,
    MetaTag,
    Detected,
}

impl fmt::Display for CharsetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CharsetSource::ByteOrderMark => "byte order mark",
            CharsetSource::ContentType => "Content-Type header",
            CharsetSource::MetaTag => "meta charset",
            CharsetSource::Detected => "detection",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
    pub source: CharsetSource,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("report is not valid {encoding} (charset from {origin})")]
    Malformed {
        encoding: &'static str,
        origin: CharsetSource,
    },
}

/// Decodes a report body to UTF-8.
///
/// The charset is taken from the first of: byte order mark, `Content-Type`
/// charset, an HTML `<meta charset>` near the start, `chardetng` detection.
/// A BOM is stripped from the text.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(&bytes[bom_len..], encoding, CharsetSource::ByteOrderMark);
    }

    let declared = content_type
        .and_then(header_charset)
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .map(|encoding| (encoding, CharsetSource::ContentType))
        .or_else(|| {
            meta_charset(bytes)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .map(|encoding| (encoding, CharsetSource::MetaTag))
        });
    if let Some((encoding, source)) = declared {
        return decode_with(bytes, encoding, source);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true), CharsetSource::Detected)
}

fn header_charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

/// Finds `charset=<label>` in the head of an HTML document. Covers both
/// `<meta charset="...">` and the `http-equiv` content form.
fn meta_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(META_SCAN_LIMIT)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let meta = head.find("<meta")?;
    let start = meta + head[meta..].find("charset")? + "charset".len();
    let rest = head[start..].trim_start().strip_prefix('=')?;
    let label: String = rest
        .trim_start()
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | ':' | '.'))
        .collect();
    (!label.is_empty()).then_some(label)
}

fn decode_with(
    bytes: &[u8],
    encoding: &'static Encoding,
    source: CharsetSource,
) -> Result<DecodedText, DecodeError> {
    let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name(),
            origin: source,
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding,
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};

    #[test]
    fn header_charset_is_case_insensitive() {
        assert_eq!(
            header_charset("text/html; Charset=\"ISO-8859-1\""),
            Some("ISO-8859-1".to_string())
        );
        assert_eq!(header_charset("text/html"), None);
    }

    #[test]
    fn header_charset_decodes_latin1() {
        let decoded = decode_body(b"caf\xe9", Some("text/html; charset=iso-8859-1")).unwrap();
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.encoding, WINDOWS_1252);
        assert_eq!(decoded.source, CharsetSource::ContentType);
    }

    #[test]
    fn meta_charset_is_used_for_files_without_headers() {
        let body = b"<html><head><meta charset='windows-1252'></head><body>\xa3500</body></html>";

        let decoded = decode_body(body, None).unwrap();

        assert_eq!(decoded.source, CharsetSource::MetaTag);
        assert!(decoded.text.contains("£500"));
    }

    #[test]
    fn header_wins_over_meta_tag() {
        let body = "<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\">₹".as_bytes();

        let decoded = decode_body(body, Some("text/html; charset=utf-8")).unwrap();

        assert_eq!(decoded.encoding, UTF_8);
        assert!(decoded.text.ends_with('₹'));
    }

    #[test]
    fn bom_is_stripped() {
        let decoded = decode_body(b"\xef\xbb\xbf<html></html>", Some("text/html; charset=latin1")).unwrap();

        assert_eq!(decoded.text, "<html></html>");
        assert_eq!(decoded.source, CharsetSource::ByteOrderMark);
    }

    #[test]
    fn malformed_utf8_names_its_charset_source() {
        let err = decode_body(b"\xc3\x28 plan", Some("text/html; charset=utf-8")).unwrap_err();

        assert_eq!(
            err,
            DecodeError::Malformed {
                encoding: "UTF-8",
                origin: CharsetSource::ContentType,
            }
        );
    }
}
