//! Live views over a shared document tree.
//!
//! A view is a tree handle plus a [`Path`]. It never holds a reference into
//! the tree; every read resolves the path again. Containers cache the child
//! views they hand out so that repeated reads return the same view, and
//! re-point those cached children whenever a mutation moves them.
//!
//! A view with an empty path is *detached*: it is the root of its own tree
//! and may be placed into a container. A view with a non-empty path is
//! *attached*; placing it somewhere else fails with
//! [`Error::AlreadyAttached`] until it is [`Item::copy`]-ed.

mod array;
mod scalar;
mod table;

use std::cell::Ref;
use std::fmt;

use crate::path::{Path, Seg};
use crate::resolve::{resolve, resolve_mut};
use crate::tree::{Node, Tree, Value};
use crate::{Error, Result};

pub use array::Array;
pub use scalar::{Boolean, Date, DateTime, DateTimeValue, Float, Integer, Null, Str, Time};
pub use table::Table;

/// Where a view currently lives.
#[derive(Clone)]
pub(crate) enum Binding {
    /// Root of a private tree.
    Detached { tree: Tree },
    /// Placed at `path` inside a container of `tree`.
    Attached { tree: Tree, path: Path },
}

impl Binding {
    pub(crate) fn new(tree: Tree, path: Path) -> Self {
        if path.is_empty() {
            Binding::Detached { tree }
        } else {
            Binding::Attached { tree, path }
        }
    }

    pub(crate) fn detached(node: Node) -> Self {
        Binding::Detached {
            tree: Tree::new(node),
        }
    }

    pub(crate) fn tree(&self) -> &Tree {
        match self {
            Binding::Detached { tree } | Binding::Attached { tree, .. } => tree,
        }
    }

    pub(crate) fn segments(&self) -> &[Seg] {
        match self {
            Binding::Detached { .. } => &[],
            Binding::Attached { path, .. } => path.segments(),
        }
    }

    pub(crate) fn path(&self) -> Path {
        match self {
            Binding::Detached { .. } => Path::root(),
            Binding::Attached { path, .. } => path.clone(),
        }
    }

    pub(crate) fn is_attached(&self) -> bool {
        matches!(self, Binding::Attached { .. })
    }

    pub(crate) fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> Result<R> {
        let root = self.tree().borrow();
        let node = resolve(&root, self.segments())?;
        Ok(f(node))
    }

    pub(crate) fn with_node_mut<R>(&self, f: impl FnOnce(&mut Node) -> R) -> Result<R> {
        let mut root = self.tree().borrow_mut();
        let node = resolve_mut(&mut root, self.segments())?;
        Ok(f(node))
    }

    pub(crate) fn snapshot(&self) -> Result<Node> {
        self.with_node(Node::clone)
    }

    /// Resolve, then require a payload the caller can project out.
    pub(crate) fn project<R>(
        &self,
        expected: &'static str,
        f: impl FnOnce(&Value) -> Option<R>,
    ) -> Result<R> {
        self.with_node(|node| f(&node.value).ok_or_else(|| node.type_name()))?
            .map_err(|found| Error::type_mismatch(self.path(), expected, found))
    }
}

/// Node kind of a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Null,
    Boolean,
    Integer,
    Float,
    String,
    Date,
    Time,
    DateTime,
    Array,
    Table,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Null => "null",
            Kind::Boolean => "boolean",
            Kind::Integer => "integer",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Date => "date",
            Kind::Time => "time",
            Kind::DateTime => "datetime",
            Kind::Array => "array",
            Kind::Table => "table",
        }
    }

    fn of(value: &Value) -> Self {
        match value {
            Value::Null => Kind::Null,
            Value::Boolean(_) => Kind::Boolean,
            Value::Integer(_) => Kind::Integer,
            Value::Float(_) => Kind::Float,
            Value::String(_) => Kind::String,
            Value::Date(_) => Kind::Date,
            Value::Time(_) => Kind::Time,
            Value::DateTime(_) => Kind::DateTime,
            Value::Array(_) => Kind::Array,
            Value::Table(_) => Kind::Table,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any view.
#[derive(Clone)]
pub enum Item {
    Null(Null),
    Boolean(Boolean),
    Integer(Integer),
    Float(Float),
    String(Str),
    Date(Date),
    Time(Time),
    DateTime(DateTime),
    Array(Array),
    Table(Table),
}

macro_rules! dispatch {
    ($item:expr, $view:ident => $body:expr) => {
        match $item {
            Item::Null($view) => $body,
            Item::Boolean($view) => $body,
            Item::Integer($view) => $body,
            Item::Float($view) => $body,
            Item::String($view) => $body,
            Item::Date($view) => $body,
            Item::Time($view) => $body,
            Item::DateTime($view) => $body,
            Item::Array($view) => $body,
            Item::Table($view) => $body,
        }
    };
}

macro_rules! accessor {
    ($fn_name:ident, $variant:ident, $ty:ty) => {
        pub fn $fn_name(&self) -> Option<&$ty> {
            match self {
                Item::$variant(view) => Some(view),
                _ => None,
            }
        }
    };
}

impl Item {
    pub(crate) fn from_node(node: Node) -> Item {
        let kind = Kind::of(&node.value);
        Item::bind(kind, Binding::detached(node))
    }

    fn bind(kind: Kind, binding: Binding) -> Item {
        match kind {
            Kind::Null => Item::Null(Null::bind(binding)),
            Kind::Boolean => Item::Boolean(Boolean::bind(binding)),
            Kind::Integer => Item::Integer(Integer::bind(binding)),
            Kind::Float => Item::Float(Float::bind(binding)),
            Kind::String => Item::String(Str::bind(binding)),
            Kind::Date => Item::Date(Date::bind(binding)),
            Kind::Time => Item::Time(Time::bind(binding)),
            Kind::DateTime => Item::DateTime(DateTime::bind(binding)),
            Kind::Array => Item::Array(Array::bind(binding)),
            Kind::Table => Item::Table(Table::bind(binding)),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Item::Null(_) => Kind::Null,
            Item::Boolean(_) => Kind::Boolean,
            Item::Integer(_) => Kind::Integer,
            Item::Float(_) => Kind::Float,
            Item::String(_) => Kind::String,
            Item::Date(_) => Kind::Date,
            Item::Time(_) => Kind::Time,
            Item::DateTime(_) => Kind::DateTime,
            Item::Array(_) => Kind::Array,
            Item::Table(_) => Kind::Table,
        }
    }

    pub(crate) fn binding(&self) -> Ref<'_, Binding> {
        dispatch!(self, view => view.binding())
    }

    /// Re-point this view, and every cached descendant, at `path` in `tree`.
    pub(crate) fn rewrite(&self, tree: &Tree, path: Path) {
        dispatch!(self, view => view.rewrite(tree, path))
    }

    /// Move this view's content into a fresh private tree.
    pub(crate) fn detach_into(&self, node: Node) {
        self.rewrite(&Tree::new(node), Path::root());
    }

    /// Move the content of a detached view out of its private tree.
    pub(crate) fn take_node(&self) -> Node {
        self.binding().tree().take()
    }

    pub fn is_attached(&self) -> bool {
        self.binding().is_attached()
    }

    pub fn path(&self) -> Path {
        self.binding().path()
    }

    pub fn comments(&self) -> Result<Vec<String>> {
        self.binding().with_node(|node| node.comments.clone())
    }

    pub fn set_comments<I, S>(&self, comments: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comments: Vec<String> = comments.into_iter().map(Into::into).collect();
        self.binding().with_node_mut(|node| node.comments = comments)
    }

    /// Deep copy into a new detached view.
    pub fn copy(&self) -> Result<Item> {
        Ok(Item::from_node(self.binding().snapshot()?))
    }

    /// Debug text of the resolved content, nested for containers.
    pub fn repr(&self) -> Result<String> {
        dispatch!(self, view => view.repr())
    }

    /// Same view, not merely equal content.
    pub fn ptr_eq(&self, other: &Item) -> bool {
        match (self, other) {
            (Item::Null(a), Item::Null(b)) => a.ptr_eq(b),
            (Item::Boolean(a), Item::Boolean(b)) => a.ptr_eq(b),
            (Item::Integer(a), Item::Integer(b)) => a.ptr_eq(b),
            (Item::Float(a), Item::Float(b)) => a.ptr_eq(b),
            (Item::String(a), Item::String(b)) => a.ptr_eq(b),
            (Item::Date(a), Item::Date(b)) => a.ptr_eq(b),
            (Item::Time(a), Item::Time(b)) => a.ptr_eq(b),
            (Item::DateTime(a), Item::DateTime(b)) => a.ptr_eq(b),
            (Item::Array(a), Item::Array(b)) => a.ptr_eq(b),
            (Item::Table(a), Item::Table(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    accessor!(as_null, Null, Null);
    accessor!(as_boolean, Boolean, Boolean);
    accessor!(as_integer, Integer, Integer);
    accessor!(as_float, Float, Float);
    accessor!(as_str, String, Str);
    accessor!(as_date, Date, Date);
    accessor!(as_time, Time, Time);
    accessor!(as_datetime, DateTime, DateTime);
    accessor!(as_array, Array, Array);
    accessor!(as_table, Table, Table);
}

/// Structural equality of the resolved nodes; paths and caches are ignored.
pub(crate) fn same_content(a: &Binding, b: &Binding) -> bool {
    let Ok(left) = a.snapshot() else {
        return false;
    };
    b.with_node(|right| left == *right).unwrap_or(false)
}

impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        same_content(&self.binding(), &other.binding())
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&repr_or_marker(self))
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

pub(crate) fn repr_or_marker(item: &Item) -> String {
    item.repr()
        .unwrap_or_else(|err| format!("<repr-error: {err}>"))
}

/// Reject values that cannot be placed into a container of `target`: attached
/// views, the target's own tree, and the same value twice in one batch.
pub(crate) fn check_insertable<'i>(
    target: &Tree,
    items: impl IntoIterator<Item = &'i Item>,
) -> Result<()> {
    let mut seen: Vec<Tree> = Vec::new();
    for item in items {
        let binding = item.binding();
        if binding.is_attached() {
            return Err(Error::already_attached(binding.path()));
        }
        let tree = binding.tree();
        if tree.ptr_eq(target) || seen.iter().any(|other| other.ptr_eq(tree)) {
            return Err(Error::already_attached(Path::root()));
        }
        seen.push(tree.clone());
    }
    Ok(())
}

/// Methods shared by every concrete view. The type must provide
/// `binding()`, `rewrite()`, `repr()` and `from_node()`.
macro_rules! view_common {
    ($name:ident, $variant:ident) => {
        impl $name {
            /// Whether this view is placed inside a container.
            pub fn is_attached(&self) -> bool {
                self.binding().is_attached()
            }

            pub fn path(&self) -> $crate::Path {
                self.binding().path()
            }

            pub fn comments(&self) -> $crate::Result<Vec<String>> {
                self.binding().with_node(|node| node.comments.clone())
            }

            pub fn set_comments<I, S>(&self, comments: I) -> $crate::Result<()>
            where
                I: IntoIterator<Item = S>,
                S: Into<String>,
            {
                let comments: Vec<String> = comments.into_iter().map(Into::into).collect();
                self.binding().with_node_mut(|node| node.comments = comments)
            }

            /// Deep copy into a new detached view.
            pub fn copy(&self) -> $crate::Result<Self> {
                Ok(Self::from_node(self.binding().snapshot()?))
            }

            pub fn ptr_eq(&self, other: &Self) -> bool {
                std::rc::Rc::ptr_eq(&self.0, &other.0)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                $crate::view::same_content(&self.binding(), &other.binding())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self.repr() {
                    Ok(text) => f.write_str(&text),
                    Err(err) => write!(f, "<repr-error: {err}>"),
                }
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(self, f)
            }
        }

        impl From<$name> for $crate::view::Item {
            fn from(view: $name) -> Self {
                $crate::view::Item::$variant(view)
            }
        }
    };
}

pub(crate) use view_common;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[rstest::rstest]
    fn test_from_node_builds_matching_view() {
        let item = Item::from_node(Node::new(Value::Integer(3)));
        assert_eq!(item.kind(), Kind::Integer);
        assert!(!item.is_attached());
        assert_eq!(item.as_integer().unwrap().value().unwrap(), 3);
        assert!(item.as_table().is_none());
    }

    #[rstest::rstest]
    fn test_check_insertable_rejects_same_value_twice() {
        let target = Tree::new(Node::table());
        let item: Item = Integer::new(1).into();
        let err = check_insertable(&target, [&item, &item]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);

        let own = Item::Table(Table::bind(Binding::new(target.clone(), Path::root())));
        let err = check_insertable(&target, [&own]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);
    }

    #[rstest::rstest]
    fn test_equality_is_structural() {
        let a: Item = Str::new("x").into();
        let b: Item = Str::new("x").into();
        assert_eq!(a, b);
        assert!(!a.ptr_eq(&b));
        b.set_comments([" note"]).unwrap();
        assert_ne!(a, b);
    }

    #[rstest::rstest]
    fn test_kind_display() {
        assert_eq!(Kind::DateTime.to_string(), "datetime");
    }
}
