//! The document tree shared by every view.
//!
//! A [`Tree`] owns one root [`Node`]. Views never hold references into it;
//! they keep a [`Tree`] handle plus a [`crate::Path`] and resolve on demand.

pub mod datetime;

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

pub use datetime::{DateTime, LocalDate, LocalTime, TimeOffset};

/// Display hint for tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TableFormat {
    /// `[header]` followed by its entries.
    #[default]
    Multiline,
    /// No header of its own; only its sub-tables are written.
    Implicit,
    /// `{ key = value, ... }`
    Inline,
    /// Written through its entries as `table.key = value` lines.
    Dotted,
}

/// Display hint for arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayFormat {
    /// `[a, b, c]`
    #[default]
    Default,
    /// One `[[header]]` block per element.
    ArrayOfTables,
}

#[derive(Debug, Clone, Default)]
pub struct TableNode {
    pub entries: IndexMap<String, Node>,
    pub format: TableFormat,
}

impl TableNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: TableFormat) -> Self {
        Self {
            entries: IndexMap::new(),
            format,
        }
    }

    /// Keep the display hint writable after the entries changed.
    ///
    /// An implicit table cannot carry scalar entries, so any non-table entry
    /// forces `Multiline`; a multiline table whose entries are all tables
    /// becomes `Implicit`. Inline and dotted tables are left alone.
    pub fn normalize_format(&mut self) {
        let contains_non_table = self.entries.values().any(|node| !node.is_table());
        match self.format {
            TableFormat::Implicit if contains_non_table => self.format = TableFormat::Multiline,
            TableFormat::Multiline if !contains_non_table => self.format = TableFormat::Implicit,
            _ => {}
        }
    }
}

impl PartialEq for TableNode {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality ignores order; document order is part of the content.
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(other.entries.iter())
                .all(|((ka, va), (kb, vb))| ka == kb && va == vb)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ArrayNode {
    pub items: Vec<Node>,
    pub format: ArrayFormat,
}

impl ArrayNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(format: ArrayFormat) -> Self {
        Self {
            items: Vec::new(),
            format,
        }
    }

    /// An array of tables falls back to the default form once it holds a
    /// non-table element.
    pub fn normalize_format(&mut self) {
        if self.format == ArrayFormat::ArrayOfTables && self.items.iter().any(|n| !n.is_table()) {
            self.format = ArrayFormat::Default;
        }
    }
}

impl PartialEq for ArrayNode {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(LocalDate),
    Time(LocalTime),
    DateTime(DateTime),
    Array(ArrayNode),
    Table(TableNode),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
            Value::Array(_) => "array",
            Value::Table(_) => "table",
        }
    }
}

/// One position in the tree: a value and the comments attached to it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    pub value: Value,
    pub comments: Vec<String>,
}

impl Node {
    pub fn new(value: Value) -> Self {
        Self {
            value,
            comments: Vec::new(),
        }
    }

    pub fn with_comments(value: Value, comments: Vec<String>) -> Self {
        Self { value, comments }
    }

    pub fn table() -> Self {
        Self::new(Value::Table(TableNode::new()))
    }

    pub fn array() -> Self {
        Self::new(Value::Array(ArrayNode::new()))
    }

    #[inline]
    pub fn is_table(&self) -> bool {
        matches!(self.value, Value::Table(_))
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.value.type_name()
    }

    pub fn as_table(&self) -> Option<&TableNode> {
        match &self.value {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut TableNode> {
        match &mut self.value {
            Value::Table(table) => Some(table),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayNode> {
        match &self.value {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayNode> {
        match &mut self.value {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Apply the format heuristics to every container below and including
    /// this node.
    pub fn normalize_formats(&mut self) {
        match &mut self.value {
            Value::Table(table) => {
                for child in table.entries.values_mut() {
                    child.normalize_formats();
                }
                table.normalize_format();
            }
            Value::Array(array) => {
                for child in array.items.iter_mut() {
                    child.normalize_formats();
                }
                array.normalize_format();
            }
            _ => {}
        }
    }
}

/// Shared handle to one document tree.
///
/// Cloning the handle shares the tree; [`Tree::snapshot`] deep-copies it.
/// Not `Send`: every view over a tree must be driven from one thread.
#[derive(Clone)]
pub struct Tree(Rc<RefCell<Node>>);

impl Tree {
    pub fn new(node: Node) -> Self {
        Self(Rc::new(RefCell::new(node)))
    }

    #[inline]
    pub fn borrow(&self) -> Ref<'_, Node> {
        self.0.borrow()
    }

    #[inline]
    pub fn borrow_mut(&self) -> RefMut<'_, Node> {
        self.0.borrow_mut()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Tree) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn snapshot(&self) -> Node {
        self.borrow().clone()
    }

    /// Move the root node out, leaving `Null` behind.
    pub(crate) fn take(&self) -> Node {
        std::mem::take(&mut *self.borrow_mut())
    }
}

impl fmt::Debug for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Tree").field(&self.borrow().type_name()).finish()
    }
}
