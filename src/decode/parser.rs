use std::collections::HashSet;

use indexmap::map::Entry;
use smol_str::SmolStr;

use crate::constants::MAX_DEPTH;
use crate::path::{Path, Seg};
use crate::resolve::resolve_mut;
use crate::tree::{ArrayFormat, ArrayNode, Node, TableFormat, TableNode, Value};
use crate::{Error, ParseOptions, Result};

use super::scanner::Scanner;
use super::value::{parse_key, parse_value, KeyPath};

pub fn parse_document(input: &str, options: &ParseOptions) -> Result<Node> {
    let mut parser = DocumentParser::new(input, options);
    parser.parse()?;
    let mut root = parser.root;
    root.normalize_formats();
    Ok(root)
}

struct DocumentParser<'a, 'o> {
    scanner: Scanner<'a>,
    options: &'o ParseOptions,
    root: Node,
    /// Concrete path of the table the next key/value lands in.
    current: Path,
    /// Tables opened by a `[header]` or `[[header]]`.
    defined: HashSet<Path>,
    /// Tables created by dotted keys.
    dotted: HashSet<Path>,
    pending: Vec<String>,
}

enum Header {
    Table,
    ArrayOfTables,
}

impl<'a, 'o> DocumentParser<'a, 'o> {
    fn new(input: &'a str, options: &'o ParseOptions) -> Self {
        Self {
            scanner: Scanner::new(input),
            options,
            root: Node::new(Value::Table(TableNode::with_format(TableFormat::Implicit))),
            current: Path::root(),
            defined: HashSet::new(),
            dotted: HashSet::new(),
            pending: Vec::new(),
        }
    }

    fn parse(&mut self) -> Result<()> {
        loop {
            self.scanner.skip_whitespace();
            match self.scanner.peek() {
                None => return Ok(()),
                Some(b'#') => {
                    let text = self.scanner.read_comment()?;
                    self.pending.push(text.to_string());
                    self.scanner.finish_line()?;
                }
                Some(b'\n') | Some(b'\r') => {
                    if !self.scanner.eat_newline() {
                        return Err(self.scanner.error("bare carriage return"));
                    }
                    self.pending.clear();
                }
                Some(b'[') => self.parse_header()?,
                Some(_) => self.parse_key_value()?,
            }
        }
    }

    fn take_comments(&mut self, trailing: Option<&str>) -> Vec<String> {
        let mut comments = std::mem::take(&mut self.pending);
        comments.extend(trailing.map(str::to_string));
        comments
    }

    fn parse_header(&mut self) -> Result<()> {
        let start = self.scanner.pos();
        self.scanner.bump();
        let kind = if self.scanner.eat(b'[') {
            Header::ArrayOfTables
        } else {
            Header::Table
        };
        let keys = parse_key(&mut self.scanner, self.options)?;
        let closed = match kind {
            Header::Table => self.scanner.eat(b']'),
            Header::ArrayOfTables => self.scanner.eat(b']') && self.scanner.eat(b']'),
        };
        if !closed {
            return Err(self.scanner.error("unterminated table header"));
        }
        let trailing = self.scanner.finish_line()?;
        let comments = self.take_comments(trailing);

        let Some((last, parents)) = keys.split_last() else {
            return Err(self.scanner.error_at(start, "empty table header"));
        };
        let parent = self.open_parents(parents, start)?;
        let child = parent.with_segment(Seg::key(last.as_str()));
        let redefined = self.defined.contains(&child) || self.dotted.contains(&child);
        let target = table_at(&mut self.root, &parent)?;

        let path = match kind {
            Header::Table => {
                match target.entries.get_mut(last.as_str()) {
                    None => {
                        let table = TableNode::with_format(TableFormat::Multiline);
                        let node = Node::with_comments(Value::Table(table), comments);
                        target.entries.insert(last.to_string(), node);
                    }
                    Some(node) => match node.as_table_mut() {
                        Some(table) if table.format != TableFormat::Inline && !redefined => {
                            table.format = TableFormat::Multiline;
                            node.comments.extend(comments);
                        }
                        _ => {
                            return Err(self
                                .scanner
                                .error_at(start, format!("table `{last}` is already defined")))
                        }
                    },
                }
                child
            }
            Header::ArrayOfTables => {
                let table = TableNode::with_format(TableFormat::Multiline);
                let element = Node::with_comments(Value::Table(table), comments);
                let index = match target.entries.get_mut(last.as_str()) {
                    None => {
                        let mut array = ArrayNode::with_format(ArrayFormat::ArrayOfTables);
                        array.items.push(element);
                        target
                            .entries
                            .insert(last.to_string(), Node::new(Value::Array(array)));
                        0
                    }
                    Some(node) => match node.as_array_mut() {
                        Some(array) if array.format == ArrayFormat::ArrayOfTables => {
                            array.items.push(element);
                            array.items.len() - 1
                        }
                        _ => {
                            return Err(self
                                .scanner
                                .error_at(start, format!("`{last}` is not an array of tables")))
                        }
                    },
                };
                child.index(index)
            }
        };
        self.defined.insert(path.clone());
        self.current = path;
        Ok(())
    }

    /// Walk header keys from the root, creating implicit tables and stepping
    /// into the last element of arrays of tables.
    fn open_parents(&mut self, keys: &[SmolStr], start: usize) -> Result<Path> {
        let mut path = Path::root();
        for key in keys {
            let table = table_at(&mut self.root, &path)?;
            let child = table.entries.entry(key.to_string()).or_insert_with(|| {
                Node::new(Value::Table(TableNode::with_format(TableFormat::Implicit)))
            });
            path.push(Seg::key(key.as_str()));
            let message = match &child.value {
                Value::Table(table) if table.format == TableFormat::Inline => {
                    format!("cannot extend inline table `{key}`")
                }
                Value::Table(_) => continue,
                Value::Array(array)
                    if array.format == ArrayFormat::ArrayOfTables && !array.items.is_empty() =>
                {
                    path.push(Seg::index(array.items.len() - 1));
                    continue;
                }
                Value::Array(_) => format!("cannot extend static array `{key}`"),
                _ => format!("key `{key}` is already defined as a value"),
            };
            return Err(self.scanner.error_at(start, message));
        }
        Ok(path)
    }

    fn parse_key_value(&mut self) -> Result<()> {
        let start = self.scanner.pos();
        let keys: KeyPath = parse_key(&mut self.scanner, self.options)?;
        if !self.scanner.eat(b'=') {
            return Err(self.scanner.error("expected `=` after key"));
        }
        self.scanner.skip_whitespace();
        let mut value = parse_value(&mut self.scanner, self.options, 0)?;
        let trailing = self.scanner.finish_line()?;
        value.comments = self.take_comments(trailing);

        let Some((last, parents)) = keys.split_last() else {
            return Err(self.scanner.error_at(start, "empty key"));
        };
        if self.current.len() + keys.len() > MAX_DEPTH {
            return Err(self.scanner.error_at(start, "key nested too deeply"));
        }

        let mut path = self.current.clone();
        let mut table = table_at(&mut self.root, &self.current)?;
        for key in parents {
            path.push(Seg::key(key.as_str()));
            let node = match table.entries.entry(key.to_string()) {
                Entry::Vacant(slot) => {
                    self.dotted.insert(path.clone());
                    slot.insert(Node::new(Value::Table(TableNode::with_format(
                        TableFormat::Dotted,
                    ))))
                }
                Entry::Occupied(slot) if self.dotted.contains(&path) => slot.into_mut(),
                Entry::Occupied(_) => {
                    return Err(self.scanner.error_at(
                        start,
                        format!("cannot extend `{key}` with a dotted key"),
                    ))
                }
            };
            table = node.as_table_mut().ok_or_else(|| {
                self.scanner
                    .error_at(start, format!("key `{key}` is already defined as a value"))
            })?;
        }

        if table.entries.contains_key(last.as_str()) {
            return Err(self.scanner.error_at(start, format!("duplicate key `{last}`")));
        }
        table.entries.insert(last.to_string(), value);
        Ok(())
    }
}

fn table_at<'n>(root: &'n mut Node, path: &Path) -> Result<&'n mut TableNode> {
    let node = resolve_mut(root, path.segments())?;
    let found = node.type_name();
    node.as_table_mut()
        .ok_or_else(|| Error::type_mismatch(path.clone(), "table", found))
}
