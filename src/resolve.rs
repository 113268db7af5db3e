//! Walk a [`Path`] from the tree root to the node it names.
//!
//! Resolution is all-or-nothing: a key step needs a table holding the key, an
//! index step needs an array long enough. The error names the prefix of the
//! path that was walked when the step failed.

use crate::path::{Path, Seg};
use crate::tree::Node;
use crate::{Error, Result};

pub fn resolve<'a>(root: &'a Node, path: &[Seg]) -> Result<&'a Node> {
    let mut node = root;
    for (depth, seg) in path.iter().enumerate() {
        node = step(node, seg, &path[..depth])?;
    }
    Ok(node)
}

pub fn resolve_mut<'a>(root: &'a mut Node, path: &[Seg]) -> Result<&'a mut Node> {
    let mut node = root;
    for (depth, seg) in path.iter().enumerate() {
        node = step_mut(node, seg, &path[..depth])?;
    }
    Ok(node)
}

fn step<'a>(node: &'a Node, seg: &Seg, walked: &[Seg]) -> Result<&'a Node> {
    match seg {
        Seg::Key(key) => {
            let table = node
                .as_table()
                .ok_or_else(|| Error::type_mismatch(Path::from(walked), "table", node.type_name()))?;
            table
                .entries
                .get(key)
                .ok_or_else(|| Error::key_not_found(key.clone(), Path::from(walked)))
        }
        Seg::Index(index) => {
            let array = node
                .as_array()
                .ok_or_else(|| Error::type_mismatch(Path::from(walked), "array", node.type_name()))?;
            array
                .items
                .get(*index)
                .ok_or_else(|| Error::index_out_of_range(*index, array.items.len(), Path::from(walked)))
        }
    }
}

fn step_mut<'a>(node: &'a mut Node, seg: &Seg, walked: &[Seg]) -> Result<&'a mut Node> {
    let found = node.type_name();
    match seg {
        Seg::Key(key) => {
            let table = node
                .as_table_mut()
                .ok_or_else(|| Error::type_mismatch(Path::from(walked), "table", found))?;
            table
                .entries
                .get_mut(key)
                .ok_or_else(|| Error::key_not_found(key.clone(), Path::from(walked)))
        }
        Seg::Index(index) => {
            let array = node
                .as_array_mut()
                .ok_or_else(|| Error::type_mismatch(Path::from(walked), "array", found))?;
            let len = array.items.len();
            array
                .items
                .get_mut(*index)
                .ok_or_else(|| Error::index_out_of_range(*index, len, Path::from(walked)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{ArrayNode, TableNode, Value};
    use crate::{path, ErrorKind};

    fn sample() -> Node {
        let mut ports = ArrayNode::new();
        ports.items.push(Node::new(Value::Integer(8000)));
        ports.items.push(Node::new(Value::Integer(8001)));

        let mut server = TableNode::new();
        server.entries.insert("ports".into(), Node::new(Value::Array(ports)));

        let mut root = TableNode::new();
        root.entries.insert("name".into(), Node::new(Value::String("x".into())));
        root.entries.insert("server".into(), Node::new(Value::Table(server)));
        Node::new(Value::Table(root))
    }

    #[rstest::rstest]
    fn test_resolve_nested() {
        let root = sample();
        let node = resolve(&root, path!("server", "ports", 1).segments()).unwrap();
        assert_eq!(node.value, Value::Integer(8001));
        assert!(std::ptr::eq(resolve(&root, &[]).unwrap(), &root));
    }

    #[rstest::rstest]
    #[case(path!("missing"), ErrorKind::KeyNotFound)]
    #[case(path!("name", "x"), ErrorKind::TypeMismatch)]
    #[case(path!("server", 0), ErrorKind::TypeMismatch)]
    #[case(path!("server", "ports", 2), ErrorKind::IndexOutOfRange)]
    #[case(path!("server", "ports", "a"), ErrorKind::TypeMismatch)]
    fn test_resolve_failures(#[case] path: Path, #[case] kind: ErrorKind) {
        let mut root = sample();
        assert_eq!(resolve(&root, path.segments()).unwrap_err().kind(), kind);
        assert_eq!(resolve_mut(&mut root, path.segments()).unwrap_err().kind(), kind);
    }

    #[rstest::rstest]
    fn test_resolve_mut_writes_through() {
        let mut root = sample();
        let node = resolve_mut(&mut root, path!("server", "ports", 0).segments()).unwrap();
        node.value = Value::Integer(9000);
        let node = resolve(&root, path!("server", "ports", 0).segments()).unwrap();
        assert_eq!(node.value, Value::Integer(9000));
    }

    #[rstest::rstest]
    fn test_error_reports_walked_prefix() {
        let root = sample();
        let err = resolve(&root, path!("server", "ports", 7).segments()).unwrap_err();
        assert_eq!(err.to_string(), "index 7 out of range (len: 2) at $.server.ports");
    }
}
