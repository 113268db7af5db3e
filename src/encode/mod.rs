mod writer;

use std::io::Write;

use tracing::trace;

use crate::constants::MAX_DEPTH;
use crate::tree::{ArrayFormat, ArrayNode, Node, TableFormat, TableNode, Value};
use crate::{Error, FormatOptions, Result};

use writer::Writer;

/// Format a document tree as TOML text.
///
/// A table root is written as a document; any other root is written as a
/// single value.
///
/// ```
/// use toml_views::tree::{Node, Value};
/// use toml_views::{encode, FormatOptions};
///
/// let root = toml_views::decode::parse("a = 1\n", &Default::default())?;
/// assert_eq!(encode::format(&root, &FormatOptions::default())?, "a = 1\n\n");
/// let single = Node::new(Value::Boolean(true));
/// assert_eq!(encode::format(&single, &FormatOptions::default())?, "true");
/// # Ok::<(), toml_views::Error>(())
/// ```
pub fn format(root: &Node, options: &FormatOptions) -> Result<String> {
    let mut writer = Writer::new(options);
    match &root.value {
        Value::Table(table) => {
            if !root.comments.is_empty() {
                writer.write_comments(&root.comments, 0);
                writer.write_newline();
            }
            let mut keys = Vec::new();
            write_table_body(&mut writer, table, &mut keys)?;
        }
        _ => write_value(&mut writer, root, 0)?,
    }
    let out = writer.finish();
    trace!(bytes = out.len(), "formatted document");
    Ok(out)
}

pub fn to_writer<W: Write>(mut sink: W, root: &Node, options: &FormatOptions) -> Result<()> {
    let text = format(root, options)?;
    sink.write_all(text.as_bytes())?;
    Ok(())
}

/// Entries written under a header of their own rather than as `key = value`.
fn is_section(node: &Node) -> bool {
    match &node.value {
        Value::Table(table) => {
            matches!(table.format, TableFormat::Multiline | TableFormat::Implicit)
        }
        Value::Array(array) => is_array_of_tables(array),
        _ => false,
    }
}

fn is_array_of_tables(array: &ArrayNode) -> bool {
    array.format == ArrayFormat::ArrayOfTables
        && !array.items.is_empty()
        && array.items.iter().all(Node::is_table)
}

/// An implicit table that can be left out of the text: its sub-tables'
/// headers recreate it on parse.
fn is_headerless(node: &Node, table: &TableNode) -> bool {
    table.format == TableFormat::Implicit
        && node.comments.is_empty()
        && !table.entries.is_empty()
        && table.entries.values().all(is_section)
}

fn write_table_body<'t>(
    writer: &mut Writer,
    table: &'t TableNode,
    keys: &mut Vec<&'t str>,
) -> Result<()> {
    if keys.len() > MAX_DEPTH {
        return Err(Error::invalid_value("table nested too deeply to format"));
    }

    // Sections ahead of the last plain entry stay in the key/value block so
    // the entry order survives a reparse.
    let headed_from = table
        .entries
        .values()
        .rposition(|node| !is_section(node))
        .map_or(0, |last| last + 1);

    let mut prefix = Vec::new();
    for (key, node) in table.entries.iter().take(headed_from) {
        prefix.push(key.as_str());
        write_dotted_entry(writer, node, keys.len(), &mut prefix)?;
        prefix.pop();
    }
    if headed_from > 0 {
        writer.write_newline();
    }

    for (key, node) in table.entries.iter().skip(headed_from) {
        keys.push(key.as_str());
        match &node.value {
            Value::Table(child) if is_headerless(node, child) => {
                write_table_body(writer, child, keys)?;
            }
            Value::Table(child) => {
                writer.write_comments(&node.comments, 0);
                writer.write_char('[');
                writer.write_dotted_key(keys);
                writer.write_str("]\n");
                write_table_body(writer, child, keys)?;
                if !writer.ends_with_blank_line() {
                    writer.write_newline();
                }
            }
            Value::Array(array) => {
                writer.write_comments(&node.comments, 0);
                for element in &array.items {
                    let Value::Table(child) = &element.value else {
                        continue;
                    };
                    writer.write_comments(&element.comments, 0);
                    writer.write_str("[[");
                    writer.write_dotted_key(keys);
                    writer.write_str("]]\n");
                    write_table_body(writer, child, keys)?;
                    if !writer.ends_with_blank_line() {
                        writer.write_newline();
                    }
                }
            }
            _ => {}
        }
        keys.pop();
    }
    Ok(())
}

/// `key = value`, or one `a.b.c = value` line per leaf of a table that is
/// not written inline.
fn write_dotted_entry<'t>(
    writer: &mut Writer,
    node: &'t Node,
    depth: usize,
    prefix: &mut Vec<&'t str>,
) -> Result<()> {
    match &node.value {
        Value::Table(table)
            if table.format != TableFormat::Inline
                && node.comments.is_empty()
                && !table.entries.is_empty() =>
        {
            if depth + prefix.len() > MAX_DEPTH {
                return Err(Error::invalid_value("table nested too deeply to format"));
            }
            for (key, child) in &table.entries {
                prefix.push(key.as_str());
                write_dotted_entry(writer, child, depth, prefix)?;
                prefix.pop();
            }
        }
        _ => {
            writer.write_comments(&node.comments, 0);
            writer.write_dotted_key(prefix);
            writer.write_str(" = ");
            write_value(writer, node, 0)?;
            writer.write_newline();
        }
    }
    Ok(())
}

fn write_value(writer: &mut Writer, node: &Node, depth: usize) -> Result<()> {
    if depth > MAX_DEPTH {
        return Err(Error::invalid_value("value nested too deeply to format"));
    }
    match &node.value {
        Value::Null => writer.write_str("null"),
        Value::Boolean(value) => writer.write_str(if *value { "true" } else { "false" }),
        Value::Integer(value) => writer.write_integer(*value),
        Value::Float(value) => writer.write_float(*value),
        Value::String(value) => writer.write_string(value),
        Value::Date(value) => writer.write_display(value),
        Value::Time(value) => writer.write_display(value),
        Value::DateTime(value) => writer.write_display(value),
        Value::Array(array) => write_array(writer, array, depth)?,
        Value::Table(table) => write_inline_table(writer, table, depth)?,
    }
    Ok(())
}

fn write_array(writer: &mut Writer, array: &ArrayNode, depth: usize) -> Result<()> {
    let commented = array.items.iter().any(|item| !item.comments.is_empty());
    if !commented {
        writer.write_char('[');
        for (idx, item) in array.items.iter().enumerate() {
            if idx > 0 {
                writer.write_str(", ");
            }
            write_value(writer, item, depth + 1)?;
        }
        writer.write_char(']');
        return Ok(());
    }

    writer.write_str("[\n");
    for item in &array.items {
        writer.write_comments(&item.comments, depth + 1);
        writer.write_indent(depth + 1);
        write_value(writer, item, depth + 1)?;
        writer.write_str(",\n");
    }
    writer.write_indent(depth);
    writer.write_char(']');
    Ok(())
}

fn write_inline_table(writer: &mut Writer, table: &TableNode, depth: usize) -> Result<()> {
    if table.entries.is_empty() {
        writer.write_str("{}");
        return Ok(());
    }
    writer.write_str("{ ");
    for (idx, (key, node)) in table.entries.iter().enumerate() {
        if idx > 0 {
            writer.write_str(", ");
        }
        writer.write_key(key);
        writer.write_str(" = ");
        write_value(writer, node, depth + 1)?;
    }
    writer.write_str(" }");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::parse;
    use crate::ParseOptions;

    fn reformat(input: &str) -> String {
        let root = parse(input, &ParseOptions::default()).unwrap();
        format(&root, &FormatOptions::default()).unwrap()
    }

    #[rstest::rstest]
    fn test_values_then_sections() {
        let out = reformat("[owner]\nage = 5\n\n[owner.pet]\nname = \"rex\"\n");
        assert_eq!(out, "[owner]\nage = 5\n\n[owner.pet]\nname = \"rex\"\n\n");
    }

    #[rstest::rstest]
    fn test_implicit_table_has_no_header() {
        let out = reformat("[a.b]\nx = 1\n");
        assert_eq!(out, "[a.b]\nx = 1\n\n");
    }

    #[rstest::rstest]
    fn test_array_of_tables() {
        let out = reformat("[[p]]\nx = 1\n[[p]]\nx = 2\n");
        assert_eq!(out, "[[p]]\nx = 1\n\n[[p]]\nx = 2\n\n");
    }

    #[rstest::rstest]
    fn test_inline_and_arrays() {
        let out = reformat("p = { x = 1, y = [1, 2] }\nq = []\n");
        assert_eq!(out, "p = { x = 1, y = [1, 2] }\nq = []\n\n");
    }

    #[rstest::rstest]
    fn test_commented_array_is_multiline() {
        let out = reformat("a = [\n  # first\n  1,\n  2,\n]\n");
        assert_eq!(out, "a = [\n  # first\n  1,\n  2,\n]\n\n");
    }

    #[rstest::rstest]
    fn test_comments_and_quoted_keys() {
        let out = reformat("# about\n\"a b\" = 'x' # tail\n");
        assert_eq!(out, "# about\n# tail\n\"a b\" = \"x\"\n\n");
    }

    #[rstest::rstest]
    #[case("x.y = 1\nz = 2\n", "x.y = 1\nz = 2\n\n")]
    #[case("[p]\na.b = 1\nc = 2\n", "[p]\na.b = 1\nc = 2\n\n")]
    #[case("[a.b]\nx = 1\n[a]\ny = 2\n", "[a]\nb.x = 1\ny = 2\n\n")]
    #[case("[a.b]\n[a]\nx = 1\n", "[a]\nb = {}\nx = 1\n\n")]
    fn test_entry_order_is_kept(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(reformat(input), expected);
    }

    #[rstest::rstest]
    fn test_dotted_table_extended_by_header() {
        let out = reformat("x.y = 1\n[x.z]\nw = 2\n");
        assert_eq!(out, "x.y = 1\nx.z.w = 2\n\n");
    }

    #[rstest::rstest]
    fn test_empty_table_keeps_header() {
        assert_eq!(reformat("[empty]\n"), "[empty]\n\n");
    }
}
