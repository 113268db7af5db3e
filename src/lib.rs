//! Live, path-addressed views over a shared, mutable TOML document.
//!
//! [`loads`] parses text into one shared tree and returns a root [`Item`].
//! Container views ([`Table`], [`Array`]) hand out child views that stay in
//! sync with the tree: mutations re-point every cached child instead of
//! copying data around.
//!
//! ```
//! use toml_views::{loads, dumps, Integer};
//!
//! let doc = loads("name = \"x\"\n[owner]\nage = 5\n")?;
//! let root = doc.as_table().unwrap();
//! let owner = root.get("owner")?;
//! let owner = owner.as_table().unwrap();
//! assert_eq!(owner.get("age")?.as_integer().unwrap().value()?, 5);
//!
//! owner.set("age", Integer::new(6))?;
//! assert_eq!(dumps(&doc)?, "name = \"x\"\n\n[owner]\nage = 6\n\n");
//! # Ok::<(), toml_views::Error>(())
//! ```

pub mod decode;
pub mod encode;
pub mod error;
pub mod num;
pub mod options;
pub mod path;
pub mod resolve;
pub mod text;
pub mod tree;
pub mod view;

mod constants;
mod serde;

use std::io::{Read, Write};

pub use crate::constants::MAX_DEPTH;
pub use crate::error::{Error, ErrorKind, Location};
pub use crate::options::{FormatOptions, Indent, ParseOptions, TomlVersion};
pub use crate::path::{Path, Seg};
pub use crate::view::{
    Array, Boolean, Date, DateTime, DateTimeValue, Float, Integer, Item, Kind, Null, Str, Table,
    Time,
};

pub type Result<T> = std::result::Result<T, Error>;

pub fn loads(text: &str) -> Result<Item> {
    loads_with_options(text, &ParseOptions::default())
}

pub fn loads_with_options(text: &str, options: &ParseOptions) -> Result<Item> {
    let root = decode::parse(text, options)?;
    Ok(Item::from_node(root))
}

pub fn from_reader<R: Read>(reader: R) -> Result<Item> {
    from_reader_with_options(reader, &ParseOptions::default())
}

pub fn from_reader_with_options<R: Read>(reader: R, options: &ParseOptions) -> Result<Item> {
    let root = decode::parse_reader(reader, options)?;
    Ok(Item::from_node(root))
}

pub fn dumps(item: &Item) -> Result<String> {
    dumps_with_options(item, &FormatOptions::default())
}

pub fn dumps_with_options(item: &Item, options: &FormatOptions) -> Result<String> {
    item.binding()
        .with_node(|node| encode::format(node, options))?
}

pub fn to_writer<W: Write>(writer: W, item: &Item) -> Result<()> {
    to_writer_with_options(writer, item, &FormatOptions::default())
}

pub fn to_writer_with_options<W: Write>(
    writer: W,
    item: &Item,
    options: &FormatOptions,
) -> Result<()> {
    item.binding()
        .with_node(|node| encode::to_writer(writer, node, options))?
}
