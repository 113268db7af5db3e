use crate::num::number::{format_float, format_integer};
use crate::text::string::{write_key_into, write_quoted_into};
use crate::FormatOptions;

pub(crate) struct Writer {
    buffer: String,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(options: &FormatOptions) -> Self {
        Self {
            buffer: String::new(),
            indent_unit: " ".repeat(options.indent.get_spaces()),
            indent_cache: vec![String::new()],
        }
    }

    pub fn finish(self) -> String {
        self.buffer
    }

    pub fn write_str(&mut self, s: &str) {
        self.buffer.push_str(s);
    }

    pub fn write_char(&mut self, ch: char) {
        self.buffer.push(ch);
    }

    pub fn write_newline(&mut self) {
        self.buffer.push('\n');
    }

    pub fn write_indent(&mut self, depth: usize) {
        if depth == 0 || self.indent_unit.is_empty() {
            return;
        }
        while self.indent_cache.len() <= depth {
            let next = format!("{}{}", self.indent_cache[self.indent_cache.len() - 1], self.indent_unit);
            self.indent_cache.push(next);
        }
        self.buffer.push_str(&self.indent_cache[depth]);
    }

    /// One `#text` line per comment.
    pub fn write_comments(&mut self, comments: &[String], depth: usize) {
        for comment in comments {
            self.write_indent(depth);
            self.buffer.push('#');
            self.buffer.push_str(comment);
            self.buffer.push('\n');
        }
    }

    pub fn write_key(&mut self, key: &str) {
        write_key_into(&mut self.buffer, key);
    }

    /// `a."b c".d`
    pub fn write_dotted_key(&mut self, keys: &[&str]) {
        for (idx, key) in keys.iter().enumerate() {
            if idx > 0 {
                self.buffer.push('.');
            }
            write_key_into(&mut self.buffer, key);
        }
    }

    pub fn write_string(&mut self, value: &str) {
        write_quoted_into(&mut self.buffer, value);
    }

    pub fn write_integer(&mut self, value: i64) {
        self.buffer.push_str(&format_integer(value));
    }

    pub fn write_float(&mut self, value: f64) {
        self.buffer.push_str(&format_float(value));
    }

    pub fn write_display(&mut self, value: &impl std::fmt::Display) {
        use std::fmt::Write as _;
        // writing into a String cannot fail
        let _ = write!(self.buffer, "{value}");
    }

    pub fn ends_with_blank_line(&self) -> bool {
        self.buffer.is_empty() || self.buffer.ends_with("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Indent;

    #[rstest::rstest]
    fn test_indent_and_comments() {
        let mut writer = Writer::new(&FormatOptions::new().with_indent(Indent::spaces(4)));
        writer.write_comments(&[" note".to_string()], 2);
        writer.write_indent(1);
        writer.write_dotted_key(&["a", "b c"]);
        assert_eq!(writer.finish(), "        # note\n    a.\"b c\"");
    }
}
