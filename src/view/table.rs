use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tracing::{debug, trace};

use super::{check_insertable, repr_or_marker, view_common, Binding, Item, Kind};
use crate::path::{Path, Seg};
use crate::tree::{Node, TableFormat, TableNode, Tree, Value};
use crate::{Error, Result};

pub(crate) struct TableState {
    binding: Binding,
    /// Child views handed out so far, by key.
    cache: HashMap<SmolStr, Item>,
}

/// Ordered key/value view over a table node.
///
/// ```
/// use toml_views::{Integer, Table};
///
/// let table = Table::new();
/// table.set("a", Integer::new(1))?;
/// let a = table.get("a")?;
/// assert!(a.is_attached());
/// assert_eq!(a.path().to_string(), "$.a");
/// # Ok::<(), toml_views::Error>(())
/// ```
#[derive(Clone)]
pub struct Table(Rc<RefCell<TableState>>);

fn read_table<R>(binding: &Binding, f: impl FnOnce(&TableNode) -> R) -> Result<R> {
    binding.project("table", |value| match value {
        Value::Table(table) => Some(f(table)),
        _ => None,
    })
}

fn write_table<R>(binding: &Binding, f: impl FnOnce(&mut TableNode) -> R) -> Result<R> {
    binding
        .with_node_mut(|node| {
            let found = node.type_name();
            node.as_table_mut().map(f).ok_or(found)
        })?
        .map_err(|found| Error::type_mismatch(binding.path(), "table", found))
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl Table {
    /// An empty detached table.
    pub fn new() -> Self {
        Self::from_node(Node::new(Value::Table(TableNode::new())))
    }

    pub fn with_comments<I, S>(comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comments = comments.into_iter().map(Into::into).collect();
        Self::from_node(Node::with_comments(Value::Table(TableNode::new()), comments))
    }

    /// A detached table holding `items` in iteration order. Every value must
    /// be detached.
    pub fn from_items<I, K, V>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Item>,
    {
        let table = Self::new();
        table.update(items)?;
        Ok(table)
    }

    pub(crate) fn bind(binding: Binding) -> Self {
        Self(Rc::new(RefCell::new(TableState {
            binding,
            cache: HashMap::new(),
        })))
    }

    pub(crate) fn from_node(node: Node) -> Self {
        Self::bind(Binding::detached(node))
    }

    pub(crate) fn binding(&self) -> Ref<'_, Binding> {
        Ref::map(self.0.borrow(), |state| &state.binding)
    }

    pub(crate) fn rewrite(&self, tree: &Tree, path: Path) {
        let mut state = self.0.borrow_mut();
        trace!(%path, cached = state.cache.len(), "re-pointing table view");
        for (key, child) in &state.cache {
            child.rewrite(tree, path.with_segment(Seg::key(key.as_str())));
        }
        state.binding = Binding::new(tree.clone(), path);
    }

    /// The view at `key`. Repeated calls return the same view.
    pub fn get(&self, key: &str) -> Result<Item> {
        let mut state = self.0.borrow_mut();
        let kind = read_table(&state.binding, |table| {
            table.entries.get(key).map(|node| Kind::of(&node.value))
        })?
        .ok_or_else(|| Error::key_not_found(key, state.binding.path()))?;

        if let Some(item) = state.cache.get(key) {
            trace!(key, "table cache hit");
            return Ok(item.clone());
        }
        let path = state.binding.path().key(key);
        let item = Item::bind(kind, Binding::new(state.binding.tree().clone(), path));
        state.cache.insert(SmolStr::new(key), item.clone());
        Ok(item)
    }

    /// Like [`Table::get`], but `None` for a missing key.
    pub fn find(&self, key: &str) -> Result<Option<Item>> {
        if !self.contains_key(key)? {
            return Ok(None);
        }
        self.get(key).map(Some)
    }

    /// Place a detached value at `key`. An existing entry is replaced in
    /// place, keeping the key order; its cached view is detached.
    ///
    /// Views cached under the replaced value stay attached to it: after
    /// replacing `owner`, an old `owner.age` view still reads its value at
    /// path `$.age` inside the detached owner.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Item>) -> Result<()> {
        let key = key.into();
        let item = value.into();
        {
            // shared borrow: `item` may be this very table
            let state = self.0.borrow();
            check_insertable(state.binding.tree(), [&item])?;
            read_table(&state.binding, |_| ())?;
        }

        let mut state = self.0.borrow_mut();
        let node = item.take_node();
        let replaced = write_table(&state.binding, |table| {
            let replaced = match table.entries.get_mut(&key) {
                Some(slot) => Some(std::mem::replace(slot, node)),
                None => {
                    table.entries.insert(key.clone(), node);
                    None
                }
            };
            table.normalize_format();
            replaced
        })?;

        if let Some(old) = replaced {
            if let Some(previous) = state.cache.remove(key.as_str()) {
                previous.detach_into(old);
                debug!(key = %key, "detached replaced table entry");
            }
        }

        let path = state.binding.path().key(key.as_str());
        debug!(%path, kind = %item.kind(), "attached value");
        item.rewrite(state.binding.tree(), path);
        state.cache.insert(SmolStr::new(&key), item);
        Ok(())
    }

    /// Remove `key` and return its value as a detached view.
    pub fn pop(&self, key: &str) -> Result<Item> {
        let mut state = self.0.borrow_mut();
        let removed = write_table(&state.binding, |table| {
            let removed = table.entries.shift_remove(key);
            if removed.is_some() {
                table.normalize_format();
            }
            removed
        })?;
        let Some(old) = removed else {
            return Err(Error::key_not_found(key, state.binding.path()));
        };

        let item = match state.cache.remove(key) {
            Some(view) => {
                view.detach_into(old);
                view
            }
            None => Item::from_node(old),
        };
        debug!(key, kind = %item.kind(), "detached table entry");
        Ok(item)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.pop(key).map(drop)
    }

    /// [`Table::set`] for every pair, after checking that all values are
    /// detached. Nothing changes if the check fails.
    pub fn update<I, K, V>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Item>,
    {
        let items: Vec<(String, Item)> = items
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        {
            let state = self.0.borrow();
            check_insertable(state.binding.tree(), items.iter().map(|(_, item)| item))?;
            read_table(&state.binding, |_| ())?;
        }
        for (key, item) in items {
            self.set(key, item)?;
        }
        Ok(())
    }

    pub fn contains_key(&self, key: &str) -> Result<bool> {
        read_table(&self.binding(), |table| table.entries.contains_key(key))
    }

    pub fn len(&self) -> Result<usize> {
        read_table(&self.binding(), |table| table.entries.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn keys(&self) -> Result<Vec<String>> {
        read_table(&self.binding(), |table| table.entries.keys().cloned().collect())
    }

    /// Every entry as a view, in document order.
    pub fn items(&self) -> Result<IndexMap<String, Item>> {
        let keys = self.keys()?;
        let mut items = IndexMap::with_capacity(keys.len());
        for key in keys {
            let item = self.get(&key)?;
            items.insert(key, item);
        }
        Ok(items)
    }

    pub fn format(&self) -> Result<TableFormat> {
        read_table(&self.binding(), |table| table.format)
    }

    pub fn set_format(&self, format: TableFormat) -> Result<()> {
        write_table(&self.binding(), |table| table.format = format)
    }

    pub fn repr(&self) -> Result<String> {
        let items = self.items()?;
        let body: Vec<String> = items
            .iter()
            .map(|(key, item)| format!("{key:?}: {}", repr_or_marker(item)))
            .collect();
        Ok(format!("Table({{{}}})", body.join(", ")))
    }
}

view_common!(Table, Table);
