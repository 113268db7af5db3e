use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, trace};

use super::{check_insertable, repr_or_marker, view_common, Binding, Item, Kind};
use crate::path::{Path, Seg};
use crate::tree::{ArrayFormat, ArrayNode, Node, Tree, Value};
use crate::{Error, Result};

pub(crate) struct ArrayState {
    binding: Binding,
    /// Child views handed out so far, by index.
    cache: BTreeMap<usize, Item>,
}

/// Index-ordered view over an array node.
#[derive(Clone)]
pub struct Array(Rc<RefCell<ArrayState>>);

fn read_array<R>(binding: &Binding, f: impl FnOnce(&ArrayNode) -> R) -> Result<R> {
    binding.project("array", |value| match value {
        Value::Array(array) => Some(f(array)),
        _ => None,
    })
}

fn write_array<R>(binding: &Binding, f: impl FnOnce(&mut ArrayNode) -> R) -> Result<R> {
    binding
        .with_node_mut(|node| {
            let found = node.type_name();
            node.as_array_mut().map(f).ok_or(found)
        })?
        .map_err(|found| Error::type_mismatch(binding.path(), "array", found))
}

impl Default for Array {
    fn default() -> Self {
        Self::new()
    }
}

impl Array {
    pub fn new() -> Self {
        Self::from_node(Node::new(Value::Array(ArrayNode::new())))
    }

    pub fn with_comments<I, S>(comments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let comments = comments.into_iter().map(Into::into).collect();
        Self::from_node(Node::with_comments(Value::Array(ArrayNode::new()), comments))
    }

    /// A detached array holding `items` in order. Every value must be
    /// detached.
    pub fn from_items<I, V>(items: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Item>,
    {
        let array = Self::new();
        array.extend(items)?;
        Ok(array)
    }

    pub(crate) fn bind(binding: Binding) -> Self {
        Self(Rc::new(RefCell::new(ArrayState {
            binding,
            cache: BTreeMap::new(),
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
        trace!(%path, cached = state.cache.len(), "re-pointing array view");
        for (index, child) in &state.cache {
            child.rewrite(tree, path.with_segment(Seg::index(*index)));
        }
        state.binding = Binding::new(tree.clone(), path);
    }

    fn out_of_range(state: &ArrayState, index: usize, len: usize) -> Error {
        Error::index_out_of_range(index, len, state.binding.path())
    }

    /// The view at `index`. Repeated calls return the same view.
    pub fn get(&self, index: usize) -> Result<Item> {
        let mut state = self.0.borrow_mut();
        let (kind, len) = read_array(&state.binding, |array| {
            (array.items.get(index).map(|node| Kind::of(&node.value)), array.items.len())
        })?;
        let Some(kind) = kind else {
            return Err(Self::out_of_range(&state, index, len));
        };

        if let Some(item) = state.cache.get(&index) {
            trace!(index, "array cache hit");
            return Ok(item.clone());
        }
        let path = state.binding.path().index(index);
        let item = Item::bind(kind, Binding::new(state.binding.tree().clone(), path));
        state.cache.insert(index, item.clone());
        Ok(item)
    }

    pub fn append(&self, value: impl Into<Item>) -> Result<()> {
        let item = value.into();
        self.precheck([&item])?;
        Self::push_checked(&mut self.0.borrow_mut(), item)
    }

    /// Ownership and type checks, under a shared borrow since a value may be
    /// this very array.
    fn precheck<'i>(&self, items: impl IntoIterator<Item = &'i Item>) -> Result<()> {
        let state = self.0.borrow();
        check_insertable(state.binding.tree(), items)?;
        read_array(&state.binding, |_| ())
    }

    /// Append after the ownership and type checks have passed.
    fn push_checked(state: &mut ArrayState, item: Item) -> Result<()> {
        let node = item.take_node();
        let index = write_array(&state.binding, |array| {
            array.items.push(node);
            array.normalize_format();
            array.items.len() - 1
        })?;
        let path = state.binding.path().index(index);
        debug!(%path, kind = %item.kind(), "attached value");
        item.rewrite(state.binding.tree(), path);
        state.cache.insert(index, item);
        Ok(())
    }

    /// Append every value, after checking that all are detached. Nothing
    /// changes if the check fails.
    pub fn extend<I, V>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = V>,
        V: Into<Item>,
    {
        let items: Vec<Item> = items.into_iter().map(Into::into).collect();
        self.precheck(&items)?;
        let mut state = self.0.borrow_mut();
        for item in items {
            Self::push_checked(&mut state, item)?;
        }
        Ok(())
    }

    /// Insert before the element at `index`, which must exist; use
    /// [`Array::append`] to grow at the end.
    pub fn insert(&self, index: usize, value: impl Into<Item>) -> Result<()> {
        let item = value.into();
        {
            let state = self.0.borrow();
            let len = read_array(&state.binding, |array| array.items.len())?;
            if index >= len {
                return Err(Self::out_of_range(&state, index, len));
            }
        }
        self.precheck([&item])?;

        let mut state = self.0.borrow_mut();
        let node = item.take_node();
        write_array(&state.binding, |array| {
            array.items.insert(index, node);
            array.normalize_format();
        })?;

        // highest first so a moved view never lands on an occupied slot
        let tree = state.binding.tree().clone();
        let base = state.binding.path();
        let moved: Vec<usize> = state.cache.range(index..).rev().map(|(i, _)| *i).collect();
        for from in moved {
            if let Some(view) = state.cache.remove(&from) {
                trace!(from, to = from + 1, "shifting cached view");
                view.rewrite(&tree, base.with_segment(Seg::index(from + 1)));
                state.cache.insert(from + 1, view);
            }
        }

        let path = base.index(index);
        debug!(%path, kind = %item.kind(), "attached value");
        item.rewrite(&tree, path);
        state.cache.insert(index, item);
        Ok(())
    }

    /// Remove the element at `index` and return it as a detached view.
    pub fn pop(&self, index: usize) -> Result<Item> {
        let mut state = self.0.borrow_mut();
        let removed = write_array(&state.binding, |array| {
            if index >= array.items.len() {
                return Err(array.items.len());
            }
            let node = array.items.remove(index);
            array.normalize_format();
            Ok(node)
        })?;
        let old = removed.map_err(|len| Self::out_of_range(&state, index, len))?;

        let item = match state.cache.remove(&index) {
            Some(view) => {
                view.detach_into(old);
                view
            }
            None => Item::from_node(old),
        };

        let tree = state.binding.tree().clone();
        let base = state.binding.path();
        let moved: Vec<usize> = state.cache.range(index + 1..).map(|(i, _)| *i).collect();
        for from in moved {
            if let Some(view) = state.cache.remove(&from) {
                trace!(from, to = from - 1, "shifting cached view");
                view.rewrite(&tree, base.with_segment(Seg::index(from - 1)));
                state.cache.insert(from - 1, view);
            }
        }
        debug!(index, kind = %item.kind(), "detached array element");
        Ok(item)
    }

    pub fn delete(&self, index: usize) -> Result<()> {
        self.pop(index).map(drop)
    }

    /// Remove every element; cached views are detached with their content.
    pub fn clear(&self) -> Result<()> {
        let mut state = self.0.borrow_mut();
        let removed = write_array(&state.binding, |array| {
            let removed = std::mem::take(&mut array.items);
            array.normalize_format();
            removed
        })?;
        let cache = std::mem::take(&mut state.cache);
        let mut removed: Vec<Option<Node>> = removed.into_iter().map(Some).collect();
        for (index, view) in cache {
            if let Some(node) = removed.get_mut(index).and_then(Option::take) {
                view.detach_into(node);
            }
        }
        debug!(count = removed.len(), "cleared array");
        Ok(())
    }

    /// Whether any element is structurally equal to `value`.
    pub fn contains(&self, value: &Item) -> Result<bool> {
        let needle = value.binding().snapshot()?;
        read_array(&self.binding(), |array| array.items.contains(&needle))
    }

    pub fn len(&self) -> Result<usize> {
        read_array(&self.binding(), |array| array.items.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Every element as a view, in order.
    pub fn items(&self) -> Result<Vec<Item>> {
        (0..self.len()?).map(|index| self.get(index)).collect()
    }

    pub fn format(&self) -> Result<ArrayFormat> {
        read_array(&self.binding(), |array| array.format)
    }

    pub fn set_format(&self, format: ArrayFormat) -> Result<()> {
        write_array(&self.binding(), |array| {
            array.format = format;
            array.normalize_format();
        })
    }

    pub fn repr(&self) -> Result<String> {
        let body: Vec<String> = self.items()?.iter().map(repr_or_marker).collect();
        Ok(format!("Array([{}])", body.join(", ")))
    }
}

view_common!(Array, Array);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Integer, Table};
    use crate::ErrorKind;

    fn ints(values: &[i64]) -> Array {
        Array::from_items(values.iter().map(|v| Integer::new(*v))).unwrap()
    }

    fn values(array: &Array) -> Vec<i64> {
        array
            .items()
            .unwrap()
            .iter()
            .map(|item| item.as_integer().unwrap().value().unwrap())
            .collect()
    }

    #[rstest::rstest]
    fn test_insert_shifts_cached_views() {
        let array = ints(&[1, 2, 3]);
        let first = array.get(0).unwrap();
        let third = array.get(2).unwrap();
        array.insert(1, Integer::new(99)).unwrap();
        assert_eq!(values(&array), [1, 99, 2, 3]);
        assert_eq!(third.path().to_string(), "$[3]");
        assert_eq!(third.as_integer().unwrap().value().unwrap(), 3);
        assert_eq!(first.path().to_string(), "$[0]");
        assert!(array.get(3).unwrap().ptr_eq(&third));
    }

    #[rstest::rstest]
    fn test_insert_at_end_is_rejected() {
        let array = ints(&[1]);
        let err = array.insert(1, Integer::new(2)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(array.len().unwrap(), 1);
    }

    #[rstest::rstest]
    fn test_pop_shifts_cached_views_down() {
        let array = ints(&[10, 20, 30, 40]);
        let second = array.get(1).unwrap();
        let last = array.get(3).unwrap();
        let popped = array.pop(1).unwrap();
        assert!(popped.ptr_eq(&second));
        assert!(!second.is_attached());
        assert_eq!(last.path().to_string(), "$[2]");
        assert_eq!(values(&array), [10, 30, 40]);
        assert_eq!(array.pop(3).unwrap_err().kind(), ErrorKind::IndexOutOfRange);
    }

    #[rstest::rstest]
    fn test_clear_detaches_everything() {
        let array = ints(&[1, 2]);
        let second = array.get(1).unwrap();
        array.clear().unwrap();
        assert!(array.is_empty().unwrap());
        assert!(!second.is_attached());
        assert_eq!(second.as_integer().unwrap().value().unwrap(), 2);
    }

    #[rstest::rstest]
    fn test_extend_checks_all_first() {
        let source = ints(&[1]);
        let attached = source.get(0).unwrap();
        let target = Array::new();
        let err = target
            .extend([Item::from(Integer::new(5)), attached])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);
        assert!(target.is_empty().unwrap());

        let same: Item = Integer::new(5).into();
        let err = target.extend([same.clone(), same]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);
    }

    #[rstest::rstest]
    fn test_array_cannot_contain_itself() {
        let array = ints(&[1]);
        let err = array.append(array.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);
        let err = array.insert(0, array.clone()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::AlreadyAttached);
        assert_eq!(values(&array), [1]);
    }

    #[rstest::rstest]
    fn test_contains_is_structural() {
        let array = ints(&[1, 2]);
        assert!(array.contains(&Integer::new(2).into()).unwrap());
        assert!(!array.contains(&Integer::new(7).into()).unwrap());
    }

    #[rstest::rstest]
    fn test_array_of_tables_falls_back_on_scalar() {
        let array = Array::from_items([Table::new(), Table::new()]).unwrap();
        array.set_format(ArrayFormat::ArrayOfTables).unwrap();
        assert_eq!(array.format().unwrap(), ArrayFormat::ArrayOfTables);
        array.append(Integer::new(1)).unwrap();
        assert_eq!(array.format().unwrap(), ArrayFormat::Default);
    }

    #[rstest::rstest]
    fn test_repr() {
        assert_eq!(ints(&[]).repr().unwrap(), "Array([])");
        assert_eq!(ints(&[1, 2]).repr().unwrap(), "Array([Integer(1), Integer(2)])");
    }
}
