use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::tree::{Node, Value};
use crate::view::{Array, Item, Table};
use crate::{Error, Result as CrateResult};

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.value {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Date(value) => serializer.collect_str(value),
            Value::Time(value) => serializer.collect_str(value),
            Value::DateTime(value) => serializer.collect_str(value),
            Value::Array(array) => {
                let mut seq = serializer.serialize_seq(Some(array.items.len()))?;
                for item in &array.items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Table(table) => {
                let mut map = serializer.serialize_map(Some(table.entries.len()))?;
                for (key, value) in &table.entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

macro_rules! serialize_view {
    ($name:ty) => {
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                self.binding()
                    .with_node(|node| node.serialize(serializer))
                    .map_err(S::Error::custom)?
            }
        }
    };
}

serialize_view!(Item);
serialize_view!(Table);
serialize_view!(Array);

impl Item {
    /// The resolved content as JSON; tables keep document order.
    pub fn to_json(&self) -> CrateResult<serde_json::Value> {
        serde_json::to_value(self).map_err(|err| Error::invalid_value(err.to_string()))
    }
}
