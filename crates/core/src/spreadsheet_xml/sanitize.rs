//! Repairs for spreadsheet XML as brokers actually publish it.
//!
//! Exports are commonly prefixed with one or more byte-order marks and
//! contain raw `&` in security names ("S&P 500"), both of which a strict XML
//! parser rejects.

use log::warn;

use crate::reader::decode_bytes;

/// Decodes the bytes and repairs the markup so it can be parsed.
pub fn sanitize_document(content: &[u8]) -> String {
    let decoded = decode_bytes(content);
    if let Some(warning) = &decoded.warning {
        warn!("Spreadsheet XML decoding: {}", warning);
    }
    let text = decoded.text.trim_start_matches(['\u{feff}', ' ', '\t', '\r', '\n']);
    escape_bare_ampersands(text)
}

/// Rewrites every `&` that does not start a predefined entity or a character
/// reference as `&amp;`.
pub fn escape_bare_ampersands(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if starts_with_reference(tail) {
            out.push('&');
        } else {
            out.push_str("&amp;");
        }
        rest = &tail[1..];
    }
    out.push_str(rest);
    out
}

fn starts_with_reference(tail: &str) -> bool {
    const PREDEFINED: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&quot;", "&apos;"];
    if PREDEFINED.iter().any(|e| tail.starts_with(e)) {
        return true;
    }

    let Some(body) = tail.strip_prefix("&#") else {
        return false;
    };
    let Some(end) = body.find(';') else {
        return false;
    };
    let digits = &body[..end];
    match digits.strip_prefix(['x', 'X']) {
        Some(hex) => !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()),
        None => !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()),
    }
}
