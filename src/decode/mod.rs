use std::io::Read;

use tracing::debug;

use crate::tree::Node;
use crate::{ParseOptions, Result};

mod parser;
mod scanner;
mod value;

/// Parse TOML text into a document tree.
pub fn parse(input: &str, options: &ParseOptions) -> Result<Node> {
    let root = parser::parse_document(input, options)?;
    debug!(
        bytes = input.len(),
        version = ?options.version,
        entries = root.as_table().map_or(0, |table| table.entries.len()),
        "parsed document"
    );
    Ok(root)
}

pub fn parse_reader<R: Read>(mut reader: R, options: &ParseOptions) -> Result<Node> {
    let mut buf = String::new();
    reader.read_to_string(&mut buf)?;
    parse(&buf, options)
}
