#![allow(dead_code)]

use toml_views::{Array, Integer, Item, Table};
use tracing_subscriber::EnvFilter;

#[ctor::ctor]
fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("toml_views=info".parse().unwrap()),
        )
        .with_test_writer()
        .try_init();
}

pub fn root_table(doc: &Item) -> Table {
    doc.as_table().expect("document root is a table").clone()
}

pub fn int_array(values: &[i64]) -> Array {
    Array::from_items(values.iter().map(|v| Integer::new(*v))).unwrap()
}

pub fn int_of(item: &Item) -> i64 {
    item.as_integer().expect("integer view").value().unwrap()
}

pub fn ints(array: &Array) -> Vec<i64> {
    array.items().unwrap().iter().map(int_of).collect()
}
