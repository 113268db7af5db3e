use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::constants::{is_bare_key_byte, MAX_DEPTH, MAX_FRACTION_DIGITS};
use crate::num::number::{parse_float, parse_integer};
use crate::tree::{
    ArrayFormat, ArrayNode, DateTime, LocalDate, LocalTime, Node, TableFormat, TableNode,
    TimeOffset, Value,
};
use crate::{ParseOptions, Result};

use super::scanner::{is_control, Scanner};

pub(crate) type KeyPath = SmallVec<[SmolStr; 4]>;

/// `a.b."c d"` with optional whitespace around the dots.
pub(crate) fn parse_key(scanner: &mut Scanner<'_>, options: &ParseOptions) -> Result<KeyPath> {
    let mut keys = KeyPath::new();
    loop {
        scanner.skip_whitespace();
        if keys.len() == MAX_DEPTH {
            return Err(scanner.error("key nested too deeply"));
        }
        keys.push(parse_simple_key(scanner, options)?);
        scanner.skip_whitespace();
        if !scanner.eat(b'.') {
            return Ok(keys);
        }
    }
}

fn parse_simple_key(scanner: &mut Scanner<'_>, options: &ParseOptions) -> Result<SmolStr> {
    match scanner.peek() {
        Some(b'"') => {
            if scanner.starts_with("\"\"\"") {
                return Err(scanner.error("multi-line strings cannot be keys"));
            }
            Ok(SmolStr::new(parse_basic_string(scanner, options)?))
        }
        Some(b'\'') => {
            if scanner.starts_with("'''") {
                return Err(scanner.error("multi-line strings cannot be keys"));
            }
            Ok(SmolStr::new(parse_literal_string(scanner)?))
        }
        Some(byte) if is_bare_key_byte(byte) => {
            Ok(SmolStr::new(scanner.take_while(is_bare_key_byte)))
        }
        _ => Err(scanner.error("expected a key")),
    }
}

pub(crate) fn parse_value(
    scanner: &mut Scanner<'_>,
    options: &ParseOptions,
    depth: usize,
) -> Result<Node> {
    if depth > MAX_DEPTH {
        return Err(scanner.error("value nested too deeply"));
    }
    let value = match scanner.peek() {
        Some(b'"') if scanner.starts_with("\"\"\"") => {
            Value::String(parse_multiline_basic_string(scanner, options)?)
        }
        Some(b'"') => Value::String(parse_basic_string(scanner, options)?),
        Some(b'\'') if scanner.starts_with("'''") => {
            Value::String(parse_multiline_literal_string(scanner)?)
        }
        Some(b'\'') => Value::String(parse_literal_string(scanner)?),
        Some(b'[') => return parse_array(scanner, options, depth),
        Some(b'{') => Value::Table(parse_inline_table(scanner, options, depth)?),
        Some(_) => parse_scalar_token(scanner, options)?,
        None => return Err(scanner.error("expected a value")),
    };
    Ok(Node::new(value))
}

fn is_token_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'+' | b'-' | b'_' | b'.' | b':')
}

fn looks_like_date(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() >= 10
        && b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5..7].iter().all(u8::is_ascii_digit)
        && b[7] == b'-'
        && b[8..10].iter().all(u8::is_ascii_digit)
}

fn looks_like_time(token: &str) -> bool {
    let b = token.as_bytes();
    b.len() >= 5 && b[..2].iter().all(u8::is_ascii_digit) && b[2] == b':'
}

fn parse_scalar_token(scanner: &mut Scanner<'_>, options: &ParseOptions) -> Result<Value> {
    let start = scanner.pos();
    let mut token = scanner.take_while(is_token_byte);
    if token.is_empty() {
        return Err(scanner.error("expected a value"));
    }

    // `1979-05-27 07:32:00` uses a space between date and time.
    if token.len() == 10
        && looks_like_date(token)
        && scanner.peek() == Some(b' ')
        && looks_like_time(&scanner.rest()[1..])
    {
        scanner.bump();
        scanner.take_while(is_token_byte);
        token = scanner.slice(start, scanner.pos());
    }

    let value = match token {
        "true" => Some(Value::Boolean(true)),
        "false" => Some(Value::Boolean(false)),
        "null" if options.allow_null => Some(Value::Null),
        _ if looks_like_date(token) => Some(
            parse_datetime_token(token, options)
                .map_err(|message| scanner.error_at(start, message))?,
        ),
        _ if looks_like_time(token) => Some(Value::Time(
            parse_time(token, options)
                .and_then(|(time, rest)| {
                    if rest.is_empty() {
                        Ok(time)
                    } else {
                        Err(format!("unexpected `{rest}` after time"))
                    }
                })
                .map_err(|message| scanner.error_at(start, message))?,
        )),
        _ => parse_integer(token)
            .map(Value::Integer)
            .or_else(|| parse_float(token).map(Value::Float)),
    };
    value.ok_or_else(|| scanner.error_at(start, format!("invalid value `{token}`")))
}

fn two_digits(s: &str, what: &str) -> std::result::Result<u8, String> {
    let b = s.as_bytes();
    if b.len() < 2 || !b[0].is_ascii_digit() || !b[1].is_ascii_digit() {
        return Err(format!("expected two-digit {what}"));
    }
    Ok((b[0] - b'0') * 10 + (b[1] - b'0'))
}

fn parse_datetime_token(token: &str, options: &ParseOptions) -> std::result::Result<Value, String> {
    let year: u16 = token[..4].parse().map_err(|_| "invalid year".to_string())?;
    let month = two_digits(&token[5..7], "month")?;
    let day = two_digits(&token[8..10], "day")?;
    let date = LocalDate::new(year, month, day).map_err(|err| err.to_string())?;

    let rest = &token[10..];
    if rest.is_empty() {
        return Ok(Value::Date(date));
    }
    let rest = match rest.as_bytes()[0] {
        b'T' | b't' | b' ' => &rest[1..],
        _ => return Err(format!("unexpected `{rest}` after date")),
    };
    let (time, rest) = parse_time(rest, options)?;
    let offset = match rest {
        "" => None,
        "Z" | "z" => Some(TimeOffset::UTC),
        _ => Some(parse_offset(rest)?),
    };
    Ok(Value::DateTime(DateTime { date, time, offset }))
}

/// Parse `HH:MM[:SS[.frac]]` and return the unparsed remainder.
fn parse_time<'t>(
    token: &'t str,
    options: &ParseOptions,
) -> std::result::Result<(LocalTime, &'t str), String> {
    let hour = two_digits(token, "hour")?;
    let minute = match token.as_bytes().get(2) {
        Some(b':') => two_digits(&token[3..], "minute")?,
        _ => return Err("expected `:` in time".to_string()),
    };
    let mut rest = &token[5..];
    let mut second = 0;
    let mut nanosecond = 0;
    if let Some(tail) = rest.strip_prefix(':') {
        second = two_digits(tail, "second")?;
        rest = &tail[2..];
        if let Some(frac) = rest.strip_prefix('.') {
            let digits = frac.bytes().take_while(u8::is_ascii_digit).count();
            if digits == 0 {
                return Err("expected digits after `.` in time".to_string());
            }
            let kept = &frac[..digits.min(MAX_FRACTION_DIGITS)];
            let scale = 10u32.pow((MAX_FRACTION_DIGITS - kept.len()) as u32);
            nanosecond = kept.parse::<u32>().map_err(|err| err.to_string())? * scale;
            rest = &frac[digits..];
        }
    } else if !options.is_v1_1() {
        return Err("seconds are required in TOML 1.0 times".to_string());
    }
    let time = LocalTime::new(hour, minute, second, nanosecond).map_err(|err| err.to_string())?;
    Ok((time, rest))
}

fn parse_offset(text: &str) -> std::result::Result<TimeOffset, String> {
    let sign: i16 = match text.as_bytes().first() {
        Some(b'+') => 1,
        Some(b'-') => -1,
        _ => return Err(format!("invalid offset `{text}`")),
    };
    let body = &text[1..];
    if body.len() != 5 || body.as_bytes()[2] != b':' {
        return Err(format!("invalid offset `{text}`"));
    }
    let hours = two_digits(body, "offset hour")?;
    let minutes = two_digits(&body[3..], "offset minute")?;
    if hours > 23 || minutes > 59 {
        return Err(format!("offset `{text}` out of range"));
    }
    TimeOffset::from_minutes(sign * (i16::from(hours) * 60 + i16::from(minutes)))
        .map_err(|err| err.to_string())
}

pub(crate) fn parse_basic_string(
    scanner: &mut Scanner<'_>,
    options: &ParseOptions,
) -> Result<String> {
    debug_assert_eq!(scanner.peek(), Some(b'"'));
    scanner.bump();
    let mut out = String::new();
    loop {
        let chunk = scanner.take_while(|b| b != b'"' && b != b'\\' && !is_control(b) || b == b'\t');
        out.push_str(chunk);
        match scanner.peek() {
            Some(b'"') => {
                scanner.bump();
                return Ok(out);
            }
            Some(b'\\') => parse_escape(scanner, options, &mut out)?,
            Some(b'\n') | Some(b'\r') | None => return Err(scanner.error("unterminated string")),
            Some(_) => return Err(scanner.error("control character in string")),
        }
    }
}

fn parse_multiline_basic_string(
    scanner: &mut Scanner<'_>,
    options: &ParseOptions,
) -> Result<String> {
    scanner.advance(3);
    scanner.eat_newline();
    let mut out = String::new();
    loop {
        let chunk = scanner.take_while(|b| b != b'"' && b != b'\\' && !is_control(b) || b == b'\t');
        out.push_str(chunk);
        match scanner.peek() {
            Some(b'"') => {
                if close_multiline(scanner, b'"', &mut out)? {
                    return Ok(out);
                }
            }
            Some(b'\\') => {
                // line-ending backslash trims the break and following whitespace
                let after = &scanner.rest()[1..];
                let blanks = after.bytes().take_while(|b| *b == b' ' || *b == b'\t').count();
                let tail = &after[blanks..];
                if tail.starts_with('\n') || tail.starts_with("\r\n") {
                    scanner.advance(1 + blanks);
                    while scanner.eat_newline() || matches!(scanner.peek(), Some(b' ' | b'\t')) {
                        scanner.skip_whitespace();
                    }
                } else {
                    parse_escape(scanner, options, &mut out)?;
                }
            }
            Some(b'\n') | Some(b'\r') => {
                if !scanner.eat_newline() {
                    return Err(scanner.error("bare carriage return in string"));
                }
                out.push('\n');
            }
            None => return Err(scanner.error("unterminated multi-line string")),
            Some(_) => return Err(scanner.error("control character in string")),
        }
    }
}

fn parse_literal_string(scanner: &mut Scanner<'_>) -> Result<String> {
    scanner.bump();
    let text = scanner.take_while(|b| b != b'\'' && (!is_control(b) || b == b'\t'));
    if scanner.eat(b'\'') {
        return Ok(text.to_string());
    }
    match scanner.peek() {
        Some(b'\n') | Some(b'\r') | None => Err(scanner.error("unterminated string")),
        Some(_) => Err(scanner.error("control character in string")),
    }
}

fn parse_multiline_literal_string(scanner: &mut Scanner<'_>) -> Result<String> {
    scanner.advance(3);
    scanner.eat_newline();
    let mut out = String::new();
    loop {
        let chunk = scanner.take_while(|b| b != b'\'' && (!is_control(b) || b == b'\t'));
        out.push_str(chunk);
        match scanner.peek() {
            Some(b'\'') => {
                if close_multiline(scanner, b'\'', &mut out)? {
                    return Ok(out);
                }
            }
            Some(b'\n') | Some(b'\r') => {
                if !scanner.eat_newline() {
                    return Err(scanner.error("bare carriage return in string"));
                }
                out.push('\n');
            }
            None => return Err(scanner.error("unterminated multi-line string")),
            Some(_) => return Err(scanner.error("control character in string")),
        }
    }
}

/// At a run of quote bytes inside a multi-line string. Up to two quotes may
/// precede the closing delimiter; returns true once the string is closed.
fn close_multiline(scanner: &mut Scanner<'_>, quote: u8, out: &mut String) -> Result<bool> {
    let run = scanner.take_while(|b| b == quote).len();
    if run < 3 {
        out.extend(std::iter::repeat_n(quote as char, run));
        return Ok(false);
    }
    if run > 5 {
        return Err(scanner.error("too many quotes closing multi-line string"));
    }
    out.extend(std::iter::repeat_n(quote as char, run - 3));
    Ok(true)
}

fn parse_escape(scanner: &mut Scanner<'_>, options: &ParseOptions, out: &mut String) -> Result<()> {
    let start = scanner.pos();
    scanner.bump();
    let Some(code) = scanner.peek() else {
        return Err(scanner.error("unterminated escape sequence"));
    };
    scanner.bump();
    let ch = match code {
        b'b' => '\x08',
        b't' => '\t',
        b'n' => '\n',
        b'f' => '\x0c',
        b'r' => '\r',
        b'"' => '"',
        b'\\' => '\\',
        b'e' if options.is_v1_1() => '\x1b',
        b'x' if options.is_v1_1() => read_unicode_escape(scanner, start, 2)?,
        b'u' => read_unicode_escape(scanner, start, 4)?,
        b'U' => read_unicode_escape(scanner, start, 8)?,
        _ => return Err(scanner.error_at(start, "invalid escape sequence")),
    };
    out.push(ch);
    Ok(())
}

fn read_unicode_escape(scanner: &mut Scanner<'_>, start: usize, len: usize) -> Result<char> {
    let digits = scanner.rest().get(..len).unwrap_or("");
    if digits.len() != len || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(scanner.error_at(start, "invalid unicode escape"));
    }
    let code = u32::from_str_radix(digits, 16)
        .map_err(|_| scanner.error_at(start, "invalid unicode escape"))?;
    scanner.advance(len);
    char::from_u32(code).ok_or_else(|| scanner.error_at(start, "escape is not a unicode scalar value"))
}

/// Skip whitespace, line breaks and comments inside an array, collecting
/// the comment texts.
fn skip_array_filler(scanner: &mut Scanner<'_>, comments: &mut Vec<String>) -> Result<()> {
    loop {
        scanner.skip_whitespace();
        match scanner.peek() {
            Some(b'#') => comments.push(scanner.read_comment()?.to_string()),
            Some(b'\n') | Some(b'\r') => {
                if !scanner.eat_newline() {
                    return Err(scanner.error("bare carriage return"));
                }
            }
            _ => return Ok(()),
        }
    }
}

fn parse_array(scanner: &mut Scanner<'_>, options: &ParseOptions, depth: usize) -> Result<Node> {
    let open = scanner.pos();
    scanner.bump();
    let mut array = ArrayNode::with_format(ArrayFormat::Default);
    let mut pending = Vec::new();
    loop {
        skip_array_filler(scanner, &mut pending)?;
        if scanner.eat(b']') {
            break;
        }
        if scanner.is_eof() {
            return Err(scanner.error_at(open, "unterminated array"));
        }
        let mut item = parse_value(scanner, options, depth + 1)?;
        item.comments.append(&mut pending);
        scanner.skip_whitespace();
        if scanner.peek() == Some(b'#') {
            item.comments.push(scanner.read_comment()?.to_string());
        }
        skip_array_filler(scanner, &mut pending)?;
        if scanner.eat(b',') {
            scanner.skip_whitespace();
            if scanner.peek() == Some(b'#') {
                item.comments.push(scanner.read_comment()?.to_string());
            }
            array.items.push(item);
            continue;
        }
        array.items.push(item);
        skip_array_filler(scanner, &mut pending)?;
        if scanner.eat(b']') {
            break;
        }
        return Err(scanner.error("expected `,` or `]` in array"));
    }
    Ok(Node::new(Value::Array(array)))
}

fn skip_inline_filler(scanner: &mut Scanner<'_>, options: &ParseOptions) -> Result<()> {
    if !options.is_v1_1() {
        scanner.skip_whitespace();
        return Ok(());
    }
    let mut dropped = Vec::new();
    skip_array_filler(scanner, &mut dropped)
}

fn parse_inline_table(
    scanner: &mut Scanner<'_>,
    options: &ParseOptions,
    depth: usize,
) -> Result<TableNode> {
    scanner.bump();
    let mut table = TableNode::with_format(TableFormat::Inline);
    skip_inline_filler(scanner, options)?;
    if scanner.eat(b'}') {
        return Ok(table);
    }
    loop {
        let key_start = scanner.pos();
        let keys = parse_key(scanner, options)?;
        if !scanner.eat(b'=') {
            return Err(scanner.error("expected `=` after key"));
        }
        scanner.skip_whitespace();
        let value = parse_value(scanner, options, depth + keys.len())?;
        insert_inline(&mut table, &keys, value)
            .map_err(|message| scanner.error_at(key_start, message))?;
        skip_inline_filler(scanner, options)?;
        if scanner.eat(b'}') {
            return Ok(table);
        }
        if !scanner.eat(b',') {
            return Err(scanner.error("expected `,` or `}` in inline table"));
        }
        skip_inline_filler(scanner, options)?;
        if scanner.peek() == Some(b'}') {
            if !options.is_v1_1() {
                return Err(scanner.error("trailing comma in inline table"));
            }
            scanner.bump();
            return Ok(table);
        }
    }
}

fn insert_inline(
    table: &mut TableNode,
    keys: &[SmolStr],
    value: Node,
) -> std::result::Result<(), String> {
    let (last, parents) = keys.split_last().ok_or_else(|| "empty key".to_string())?;
    let mut current = table;
    for key in parents {
        let entry = current
            .entries
            .entry(key.to_string())
            .or_insert_with(|| Node::new(Value::Table(TableNode::with_format(TableFormat::Inline))));
        current = entry
            .as_table_mut()
            .ok_or_else(|| format!("key `{key}` is already defined as a value"))?;
    }
    if current.entries.contains_key(last.as_str()) {
        return Err(format!("duplicate key `{last}`"));
    }
    current.entries.insert(last.to_string(), value);
    Ok(())
}
