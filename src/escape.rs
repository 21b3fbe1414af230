//! JSON string-body escaping.
//!
//! Produces exactly what a JSON encoder with HTML escaping turned off would
//! write between the quotes of a string: `<`, `>` and `&` are left alone,
//! control characters are escaped, invalid UTF-8 bytes become `\ufffd` one
//! byte at a time, and U+2028 / U+2029 are always escaped so the output stays
//! safe to evaluate as script source.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// ASCII bytes that can be copied into a JSON string without escaping.
static SAFE: [bool; 128] = safe_set();

const fn safe_set() -> [bool; 128] {
    let mut set = [false; 128];
    let mut b = 0x20;
    while b < 128 {
        set[b] = b != b'"' as usize && b != b'\\' as usize;
        b += 1;
    }
    set
}

/// Append the escaped form of `s` to `buf`.
pub fn append_escaped_str(buf: &mut Vec<u8>, s: &str) {
    append_escaped(buf, s.as_bytes());
}

/// Append the escaped form of the bytes `s` to `buf`, without surrounding quotes.
///
/// `s` need not be valid UTF-8.
pub fn append_escaped(buf: &mut Vec<u8>, s: &[u8]) {
    let mut start = 0;
    let mut i = 0;
    while i < s.len() {
        let b = s[i];
        if b < 0x80 {
            if SAFE[b as usize] {
                i += 1;
                continue;
            }
            buf.extend_from_slice(&s[start..i]);
            buf.push(b'\\');
            match b {
                b'\\' | b'"' => buf.push(b),
                b'\n' => buf.push(b'n'),
                b'\r' => buf.push(b'r'),
                b'\t' => buf.push(b't'),
                _ => {
                    buf.extend_from_slice(b"u00");
                    buf.push(HEX[(b >> 4) as usize]);
                    buf.push(HEX[(b & 0xF) as usize]);
                }
            }
            i += 1;
            start = i;
            continue;
        }
        match decode_char(&s[i..]) {
            None => {
                buf.extend_from_slice(&s[start..i]);
                buf.extend_from_slice(b"\\ufffd");
                i += 1;
                start = i;
            }
            Some((c @ ('\u{2028}' | '\u{2029}'), width)) => {
                buf.extend_from_slice(&s[start..i]);
                buf.extend_from_slice(b"\\u202");
                buf.push(HEX[(c as u32 & 0xF) as usize]);
                i += width;
                start = i;
            }
            Some((_, width)) => i += width,
        }
    }
    buf.extend_from_slice(&s[start..]);
}

/// Decode the UTF-8 sequence at the start of `s`.
///
/// Returns `None` when the leading bytes do not form a valid sequence
/// (bad lead byte, truncated, overlong, surrogate or out of range).
fn decode_char(s: &[u8]) -> Option<(char, usize)> {
    let width = match s.first()? {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    let seq = std::str::from_utf8(s.get(..width)?).ok()?;
    seq.chars().next().map(|c| (c, width))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn escape(s: &[u8]) -> String {
        let mut buf = Vec::new();
        append_escaped(&mut buf, s);
        String::from_utf8(buf).expect("escaped output is valid UTF-8")
    }

    #[test]
    fn test_plain_ascii_passes_through() {
        assert_eq!(escape(b"hello world"), "hello world");
        assert_eq!(escape(b""), "");
        assert_eq!(escape(b"~!@#$%^*()_+-=[]{}|;':,./?`"), "~!@#$%^*()_+-=[]{}|;':,./?`");
    }

    #[test]
    fn test_quote_and_backslash() {
        assert_eq!(escape(br#"say "hi""#), r#"say \"hi\""#);
        assert_eq!(escape(br"C:\temp"), r"C:\\temp");
    }

    #[test]
    fn test_short_control_escapes() {
        assert_eq!(escape(b"a\nb\rc\td"), r"a\nb\rc\td");
    }

    #[test]
    fn test_other_control_bytes_use_lowercase_hex() {
        assert_eq!(escape(b"\x00"), r"\u0000");
        assert_eq!(escape(b"\x01\x1b"), r"\u0001\u001b");
        assert_eq!(escape(b"\x1f"), r"\u001f");
        assert_eq!(escape(b"\x0c\x08"), r"\u000c\u0008");
        assert_eq!(escape(b"\x7f"), "\x7f", "DEL is not escaped");
    }

    #[test]
    fn test_html_characters_not_escaped() {
        assert_eq!(escape(b"<script>&amp;</script>"), "<script>&amp;</script>");
    }

    #[test]
    fn test_line_and_paragraph_separators_escaped() {
        assert_eq!(escape("a\u{2028}b\u{2029}c".as_bytes()), r"a\u2028b\u2029c");
        // Neighbouring code points pass through.
        assert_eq!(escape("\u{2027}\u{202a}".as_bytes()), "\u{2027}\u{202a}");
    }

    #[test]
    fn test_valid_multibyte_passes_through() {
        assert_eq!(escape("héllo wörld".as_bytes()), "héllo wörld");
        assert_eq!(escape("日本語".as_bytes()), "日本語");
        assert_eq!(escape("🦀".as_bytes()), "🦀");
        assert_eq!(escape("\u{fffd}".as_bytes()), "\u{fffd}");
    }

    #[test]
    fn test_invalid_bytes_replaced_one_at_a_time() {
        assert_eq!(escape(b"\xff"), r"\ufffd");
        assert_eq!(escape(b"a\xffb"), r"a\ufffdb");
        // Truncated three-byte sequence: each byte is invalid on its own.
        assert_eq!(escape(b"\xe2\x82"), r"\ufffd\ufffd");
        // Truncated sequence followed by ASCII resumes at the next byte.
        assert_eq!(escape(b"\xe2\x82x"), r"\ufffd\ufffdx");
        // Lone continuation byte.
        assert_eq!(escape(b"\x80"), r"\ufffd");
        // Overlong encoding of '/'.
        assert_eq!(escape(b"\xc0\xaf"), r"\ufffd\ufffd");
        // Encoded surrogate half.
        assert_eq!(escape(b"\xed\xa0\x80"), r"\ufffd\ufffd\ufffd");
        // Beyond U+10FFFF.
        assert_eq!(escape(b"\xf4\x90\x80\x80"), r"\ufffd\ufffd\ufffd\ufffd");
    }

    #[test]
    fn test_mixed_runs() {
        let input = "ok\"\u{2028}é\x01<".as_bytes();
        assert_eq!(escape(input), "ok\\\"\\u2028é\\u0001<");
    }

    #[test]
    fn test_appends_to_existing_buffer() {
        let mut buf = b"prefix:".to_vec();
        append_escaped_str(&mut buf, "a\"b");
        assert_eq!(buf, b"prefix:a\\\"b");
    }

    #[test]
    fn test_unescape_recovers_input() {
        let inputs = [
            "plain",
            "quote \" and backslash \\",
            "tabs\tand\nnewlines\r",
            "\u{0}\u{1}\u{1f}\u{7f}",
            "<>&'",
            "\u{2028}\u{2029}",
            "mixed 日本 🦀 \u{fffd}",
        ];
        for input in inputs {
            let mut buf = vec![b'"'];
            append_escaped_str(&mut buf, input);
            buf.push(b'"');
            let decoded: String = serde_json::from_slice(&buf).expect("valid JSON string");
            assert_eq!(decoded, input);
        }
    }

    #[test]
    fn test_unescape_of_invalid_bytes_recovers_replacement() {
        let mut buf = vec![b'"'];
        append_escaped(&mut buf, b"a\xffb\xe2\x82");
        buf.push(b'"');
        let decoded: String = serde_json::from_slice(&buf).expect("valid JSON string");
        assert_eq!(decoded, "a\u{fffd}b\u{fffd}\u{fffd}");
    }
}
