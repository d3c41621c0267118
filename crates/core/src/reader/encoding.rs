//! Byte decoding shared by the text-based readers.

use encoding_rs::{Encoding, UTF_8};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Removes every leading UTF-8 byte-order mark. Some exports carry two.
pub fn strip_utf8_boms(mut content: &[u8]) -> &[u8] {
    while let Some(rest) = content.strip_prefix(UTF8_BOM) {
        content = rest;
    }
    content
}

/// Decoded text plus a note when the content was not clean UTF-8.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedText {
    pub text: String,
    pub warning: Option<String>,
}

/// Decodes raw file bytes to text.
///
/// UTF-8 (with or without BOMs) is taken as is. UTF-16 is recognized by its
/// BOM; anything else is decoded with a detected legacy encoding, since
/// several brokers still publish Windows-1252 files.
pub fn decode_bytes(content: &[u8]) -> DecodedText {
    let content = strip_utf8_boms(content);

    if let Some((encoding, bom_len)) = Encoding::for_bom(content) {
        let (text, had_errors) = encoding.decode_without_bom_handling(&content[bom_len..]);
        return DecodedText {
            text: text.into_owned(),
            warning: had_errors.then(|| format!("Malformed {} sequences replaced", encoding.name())),
        };
    }

    match std::str::from_utf8(content) {
        Ok(s) => DecodedText {
            text: s.to_string(),
            warning: None,
        },
        Err(e) => {
            let mut detector = chardetng::EncodingDetector::new();
            detector.feed(content, true);
            let encoding = detector.guess(None, true);
            let (text, _, had_errors) = encoding.decode(content);
            let mut warning = format!(
                "Invalid UTF-8 at byte {}; decoded as {}",
                e.valid_up_to(),
                encoding.name()
            );
            if had_errors || encoding == UTF_8 {
                warning.push_str(". Some characters may be replaced.");
            }
            DecodedText {
                text: text.into_owned(),
                warning: Some(warning),
            }
        }
    }
}
