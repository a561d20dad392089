//! Encoding-tolerant file reading.
//!
//! Each candidate encoding gets one strict decode attempt; the first one that
//! decodes without inserting a replacement character wins.

use crate::error::ReadError;
use encoding_rs::Encoding;
use std::fs;
use std::path::Path;

/// Text decoded from a file, plus the encoding that produced it
#[derive(Debug, Clone)]
pub struct DecodedText {
    pub text: String,
    pub encoding: &'static Encoding,
}

/// Reads files and decodes them with an ordered list of candidate encodings
#[derive(Debug, Clone)]
pub struct EncodingReader {
    encodings: Vec<&'static Encoding>,
}

impl EncodingReader {
    pub fn new(encodings: Vec<&'static Encoding>) -> Self {
        Self { encodings }
    }

    /// Read `path` and return the first clean decode
    pub fn read(&self, path: &Path) -> Result<DecodedText, ReadError> {
        let bytes = fs::read(path).map_err(|source| ReadError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        decode_strict(&bytes, &self.encodings).ok_or_else(|| ReadError::Undecodable {
            path: path.to_path_buf(),
        })
    }

    pub fn encodings(&self) -> &[&'static Encoding] {
        &self.encodings
    }
}

/// Try each encoding in order. A byte-order mark is only honoured (and
/// stripped) when it belongs to the encoding being tried.
pub fn decode_strict(bytes: &[u8], encodings: &[&'static Encoding]) -> Option<DecodedText> {
    let bom = Encoding::for_bom(bytes);

    for &encoding in encodings {
        let body = match bom {
            Some((bom_encoding, bom_len)) if bom_encoding == encoding => &bytes[bom_len..],
            _ => bytes,
        };

        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(body) {
            return Some(DecodedText {
                text: text.into_owned(),
                encoding,
            });
        }
    }

    None
}

/// Check decoded text for a NUL character (binary content)
pub fn is_binary(text: &str) -> bool {
    memchr::memchr(0, text.as_bytes()).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_8, UTF_16LE, WINDOWS_1252};

    #[test]
    fn test_utf8_decodes() {
        let decoded = decode_strict("héllo".as_bytes(), &[UTF_8]).unwrap();
        assert_eq!(decoded.text, "héllo");
        assert_eq!(decoded.encoding, UTF_8);
    }

    #[test]
    fn test_falls_through_to_next_encoding() {
        // 0xE9 is 'é' in windows-1252 and invalid as standalone UTF-8
        let bytes = b"caf\xE9";
        let decoded = decode_strict(bytes, &[UTF_8, WINDOWS_1252]).unwrap();
        assert_eq!(decoded.text, "café");
        assert_eq!(decoded.encoding, WINDOWS_1252);
    }

    #[test]
    fn test_no_clean_decode() {
        let bytes = b"caf\xE9";
        assert!(decode_strict(bytes, &[UTF_8]).is_none());
        assert!(decode_strict(bytes, &[]).is_none());
    }

    #[test]
    fn test_bom_stripped_for_matching_encoding() {
        let bytes = b"\xEF\xBB\xBFhello";
        let decoded = decode_strict(bytes, &[UTF_8]).unwrap();
        assert_eq!(decoded.text, "hello");
    }

    #[test]
    fn test_utf16_bom() {
        let bytes = b"\xFF\xFEh\x00i\x00";
        let decoded = decode_strict(bytes, &[UTF_8, UTF_16LE]).unwrap();
        assert_eq!(decoded.text, "hi");
        assert_eq!(decoded.encoding, UTF_16LE);
    }

    #[test]
    fn test_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("検索");
        let decoded = decode_strict(&bytes, &[UTF_8, SHIFT_JIS]).unwrap();
        assert_eq!(decoded.text, "検索");
    }

    #[test]
    fn test_read_missing_file_is_unreadable() {
        let reader = EncodingReader::new(vec![UTF_8]);
        let err = reader.read(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, ReadError::Unreadable { .. }));
    }

    #[test]
    fn test_read_undecodable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin.txt");
        fs::write(&path, b"caf\xE9").unwrap();

        let reader = EncodingReader::new(vec![UTF_8]);
        assert!(matches!(reader.read(&path), Err(ReadError::Undecodable { .. })));

        let reader = EncodingReader::new(vec![UTF_8, WINDOWS_1252]);
        assert_eq!(reader.read(&path).unwrap().text, "café");
    }

    #[test]
    fn test_is_binary() {
        assert!(is_binary("abc\0def"));
        assert!(!is_binary("plain text"));
    }
}
