use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode input with {encoding}")]
    DecodeFailure { encoding: String },
}

/// Decode an uploaded text file into UTF-8 using: BOM -> strict UTF-8 -> chardetng fallback.
///
/// Spreadsheet tools often export CSV in a legacy code page (GBK, Windows-1252),
/// so plain UTF-8 is not assumed.
pub fn decode_text(bytes: &[u8]) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Ok(text) = std::str::from_utf8(bytes) {
        return Ok(DecodedText {
            text: text.to_string(),
            encoding_label: encoding_rs::UTF_8.name().to_string(),
        });
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<DecodedText, DecodeError> {
    // `decode` strips a leading BOM.
    let (text, used, had_errors) = enc.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: used.name().to_string(),
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding_label: used.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        let bytes = b"\xEF\xBB\xBFurl\nhttps://a.example/\n";
        let decoded = decode_text(bytes).unwrap();
        assert_eq!(decoded.text, "url\nhttps://a.example/\n");
        assert_eq!(decoded.encoding_label, "UTF-8");
    }

    #[test]
    fn plain_utf8_passes_through() {
        let decoded = decode_text("url,状态\n".as_bytes()).unwrap();
        assert_eq!(decoded.text, "url,状态\n");
    }

    #[test]
    fn legacy_encoding_is_detected() {
        let text = "网址,状态\n\
            https://a.example/,已提交并编入索引的网址\n\
            https://b.example/,已抓取但尚未编入索引的网页\n\
            https://c.example/,已发现但尚未编入索引的网页\n";
        let (bytes, _, _) = encoding_rs::GBK.encode(text);
        let decoded = decode_text(&bytes).unwrap();
        assert!(decoded.text.contains("https://a.example/"));
        assert_ne!(decoded.encoding_label, "UTF-8");
    }
}
