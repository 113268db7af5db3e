use crate::constants::is_bare_key_byte;

/// Keys made of `A-Za-z0-9_-` can be written without quotes.
pub fn is_bare_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(is_bare_key_byte)
}

/// Escape `value` for a single-line basic string (without the quotes).
pub fn escape_string_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    let mut start = 0;
    for (idx, byte) in bytes.iter().enumerate() {
        let escaped = match byte {
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            b'\x08' => "\\b",
            b'\x0c' => "\\f",
            b'"' => "\\\"",
            b'\\' => "\\\\",
            0x00..=0x1f | 0x7f => {
                if start < idx {
                    out.push_str(&value[start..idx]);
                }
                out.push_str(&format!("\\u{:04X}", byte));
                start = idx + 1;
                continue;
            }
            _ => continue,
        };
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        out.push_str(escaped);
        start = idx + 1;
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
}

pub fn write_quoted_into(out: &mut String, value: &str) {
    out.push('"');
    escape_string_into(out, value);
    out.push('"');
}

pub fn write_key_into(out: &mut String, key: &str) {
    if is_bare_key(key) {
        out.push_str(key);
    } else {
        write_quoted_into(out, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("name", true)]
    #[case("bare-key_1", true)]
    #[case("1234", true)]
    #[case("", false)]
    #[case("a.b", false)]
    #[case("a b", false)]
    #[case("ключ", false)]
    fn test_is_bare_key(#[case] key: &str, #[case] expected: bool) {
        assert_eq!(is_bare_key(key), expected);
    }

    #[rstest::rstest]
    #[case("plain", "\"plain\"")]
    #[case("say \"hi\"", "\"say \\\"hi\\\"\"")]
    #[case("a\\b", "\"a\\\\b\"")]
    #[case("line\nbreak\ttab", "\"line\\nbreak\\ttab\"")]
    #[case("bell\x07", "\"bell\\u0007\"")]
    #[case("üñí", "\"üñí\"")]
    fn test_write_quoted(#[case] input: &str, #[case] expected: &str) {
        let mut out = String::new();
        write_quoted_into(&mut out, input);
        assert_eq!(out, expected);
    }

    #[rstest::rstest]
    fn test_write_key_quotes_when_needed() {
        let mut out = String::new();
        write_key_into(&mut out, "site");
        out.push('.');
        write_key_into(&mut out, "google.com");
        assert_eq!(out, "site.\"google.com\"");
    }
}
