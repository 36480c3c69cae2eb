// Non-ASCII escaping for report text cells

use std::fmt::Write;

/// Escape text to plain ASCII: backslash and `\t \n \r` as escapes,
/// Latin-1 and control characters as `\xNN`, the rest of the BMP as
/// `\uNNNN`, anything above as `\UNNNNNNNN`.
pub fn escape_non_ascii(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        match ch {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            ' '..='~' => out.push(ch),
            _ if code < 0x100 => {
                let _ = write!(out, "\\x{code:02x}");
            }
            _ if code < 0x10000 => {
                let _ = write!(out, "\\u{code:04x}");
            }
            _ => {
                let _ = write!(out, "\\U{code:08x}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        assert_eq!(escape_non_ascii("NOCREDIT,FT1-FT2"), "NOCREDIT,FT1-FT2");
    }

    #[test]
    fn escapes_by_code_point_range() {
        assert_eq!(escape_non_ascii("CAFÉ"), "CAF\\xc9");
        assert_eq!(escape_non_ascii("a\tb\\c\n"), "a\\tb\\\\c\\n");
        assert_eq!(escape_non_ascii("\u{1}"), "\\x01");
        assert_eq!(escape_non_ascii("€"), "\\u20ac");
        assert_eq!(escape_non_ascii("😀"), "\\U0001f600");
    }
}
