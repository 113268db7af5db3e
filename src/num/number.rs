//! Integer and float tokens in both directions.

pub fn format_integer(value: i64) -> String {
    let mut buffer = itoa::Buffer::new();
    buffer.format(value).to_string()
}

pub fn format_float(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let mut buffer = ryu::Buffer::new();
    let raw = buffer.format_finite(value);
    normalize_float_str(raw)
}

// ryu may emit `1e16`; both forms are valid, but keep a fractional part when
// there is no exponent so the token never reads back as an integer.
fn normalize_float_str(raw: &str) -> String {
    if raw.contains(['.', 'e', 'E']) {
        return raw.to_string();
    }
    format!("{raw}.0")
}

fn is_digit_run(s: &str, is_digit: fn(&u8) -> bool) -> bool {
    !s.is_empty()
        && !s.starts_with('_')
        && !s.ends_with('_')
        && !s.contains("__")
        && s.bytes().all(|b| b == b'_' || is_digit(&b))
}

fn is_decimal_int(s: &str) -> bool {
    if !is_digit_run(s, u8::is_ascii_digit) {
        return false;
    }
    // no leading zeros
    !(s.len() > 1 && s.starts_with('0'))
}

fn strip_sign(token: &str) -> (&str, &str) {
    match token.as_bytes().first() {
        Some(b'+') | Some(b'-') => token.split_at(1),
        _ => ("", token),
    }
}

/// Parse a TOML integer token. `None` if the token is not an integer or does
/// not fit in `i64`.
pub fn parse_integer(token: &str) -> Option<i64> {
    let radix = match token.get(..2) {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &token[2..];
        let valid = match radix {
            16 => is_digit_run(digits, u8::is_ascii_hexdigit),
            8 => is_digit_run(digits, |b| (b'0'..=b'7').contains(b)),
            _ => is_digit_run(digits, |b| *b == b'0' || *b == b'1'),
        };
        if !valid {
            return None;
        }
        return i64::from_str_radix(&digits.replace('_', ""), radix).ok();
    }

    let (_, unsigned) = strip_sign(token);
    if !is_decimal_int(unsigned) {
        return None;
    }
    token.replace('_', "").parse::<i64>().ok()
}

/// Parse a TOML float token, including `inf` and `nan` with optional sign.
pub fn parse_float(token: &str) -> Option<f64> {
    let (sign, unsigned) = strip_sign(token);
    match unsigned {
        "inf" => {
            return Some(if sign == "-" {
                f64::NEG_INFINITY
            } else {
                f64::INFINITY
            })
        }
        "nan" => return Some(f64::NAN),
        _ => {}
    }

    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(idx) => (&unsigned[..idx], Some(&unsigned[idx + 1..])),
        None => (unsigned, None),
    };
    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], Some(&mantissa[idx + 1..])),
        None => (mantissa, None),
    };
    if frac_part.is_none() && exponent.is_none() {
        return None;
    }
    if !is_decimal_int(int_part) {
        return None;
    }
    if let Some(frac) = frac_part {
        if !is_digit_run(frac, u8::is_ascii_digit) {
            return None;
        }
    }
    if let Some(exp) = exponent {
        let (_, digits) = strip_sign(exp);
        if !is_digit_run(digits, u8::is_ascii_digit) {
            return None;
        }
    }
    token.replace('_', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    #[case("42", Some(42))]
    #[case("+17", Some(17))]
    #[case("-17", Some(-17))]
    #[case("0", Some(0))]
    #[case("-0", Some(0))]
    #[case("1_000", Some(1000))]
    #[case("0xDEAD_beef", Some(0xdead_beef))]
    #[case("0o755", Some(0o755))]
    #[case("0b1101", Some(13))]
    #[case("-9223372036854775808", Some(i64::MIN))]
    #[case("9223372036854775808", None)]
    #[case("007", None)]
    #[case("1__0", None)]
    #[case("_1", None)]
    #[case("1_", None)]
    #[case("0x", None)]
    #[case("-0x1", None)]
    #[case("0o8", None)]
    #[case("1.5", None)]
    fn test_parse_integer(#[case] token: &str, #[case] expected: Option<i64>) {
        assert_eq!(parse_integer(token), expected);
    }

    #[rstest::rstest]
    #[case("1.0", Some(1.0))]
    #[case("-3.1415", Some(-3.1415))]
    #[case("5e+22", Some(5e22))]
    #[case("1e06", Some(1e6))]
    #[case("6.626e-34", Some(6.626e-34))]
    #[case("224_617.445_991", Some(224_617.445_991))]
    #[case("+inf", Some(f64::INFINITY))]
    #[case("-inf", Some(f64::NEG_INFINITY))]
    #[case("1.", None)]
    #[case(".5", None)]
    #[case("01.5", None)]
    #[case("1e", None)]
    #[case("1.5_", None)]
    #[case("42", None)]
    #[case("infinity", None)]
    fn test_parse_float(#[case] token: &str, #[case] expected: Option<f64>) {
        assert_eq!(parse_float(token), expected);
    }

    #[rstest::rstest]
    fn test_parse_nan() {
        assert!(parse_float("nan").unwrap().is_nan());
        assert!(parse_float("-nan").unwrap().is_nan());
    }

    #[rstest::rstest]
    #[case(1.0, "1.0")]
    #[case(-2.5, "-2.5")]
    #[case(0.1, "0.1")]
    #[case(1e300, "1e300")]
    #[case(f64::INFINITY, "inf")]
    #[case(f64::NEG_INFINITY, "-inf")]
    #[case(f64::NAN, "nan")]
    fn test_format_float(#[case] value: f64, #[case] expected: &str) {
        assert_eq!(format_float(value), expected);
    }

    #[rstest::rstest]
    fn test_format_float_reads_back() {
        for value in [0.1, 123456.789, -1e-7, 3.0e16, f64::MAX] {
            assert_eq!(parse_float(&format_float(value)), Some(value));
        }
    }

    #[rstest::rstest]
    fn test_format_integer() {
        assert_eq!(format_integer(-42), "-42");
        assert_eq!(format_integer(i64::MAX), "9223372036854775807");
    }
}
