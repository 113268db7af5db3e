pub const DEFAULT_INDENT: usize = 2;

/// Deepest nesting of tables, arrays and key paths accepted by the parser.
pub const MAX_DEPTH: usize = 256;

/// Digits kept from a fractional second; further digits are truncated.
pub const MAX_FRACTION_DIGITS: usize = 9;

#[inline]
pub fn is_bare_key_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_is_bare_key_byte() {
        assert!(is_bare_key_byte(b'a'));
        assert!(is_bare_key_byte(b'Z'));
        assert!(is_bare_key_byte(b'7'));
        assert!(is_bare_key_byte(b'_'));
        assert!(is_bare_key_byte(b'-'));
        assert!(!is_bare_key_byte(b'.'));
        assert!(!is_bare_key_byte(b' '));
        assert!(!is_bare_key_byte(b'"'));
    }
}
