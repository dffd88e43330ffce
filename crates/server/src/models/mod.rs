//! Business records persisted in the data file.
//!
//! Every record keeps the fields it does not model in an `extra` map, so a
//! client can store arbitrary attributes and get them back unchanged.

pub mod customer;
pub mod inquiry;
pub mod order;
pub mod product;
pub mod user;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use customer::Customer;
pub use inquiry::Inquiry;
pub use order::Order;
pub use product::Product;
pub use user::{User, UserView};

/// Fields a patch may never overwrite.
const PROTECTED_FIELDS: &[&str] = &["id"];

/// Build a record from client-supplied fields plus server-assigned values.
///
/// Server-assigned values win over client fields of the same name.
///
/// # Errors
///
/// Returns `serde_json::Error` if the combined fields do not form a valid record.
pub fn from_fields<T: DeserializeOwned>(
    mut fields: Map<String, Value>,
    assigned: impl IntoIterator<Item = (&'static str, Value)>,
) -> Result<T, serde_json::Error> {
    for (key, value) in assigned {
        fields.insert(key.to_string(), value);
    }
    serde_json::from_value(Value::Object(fields))
}

/// Shallow-merge `patch` over `record`.
///
/// Top-level keys in `patch` replace those in the record, except `id`.
///
/// # Errors
///
/// Returns `serde_json::Error` if the merged fields do not form a valid record.
pub fn merge_fields<T: Serialize + DeserializeOwned>(
    record: &T,
    patch: Map<String, Value>,
) -> Result<T, serde_json::Error> {
    let mut value = serde_json::to_value(record)?;
    if let Value::Object(fields) = &mut value {
        for (key, v) in patch {
            if !PROTECTED_FIELDS.contains(&key.as_str()) {
                fields.insert(key, v);
            }
        }
    }
    serde_json::from_value(value)
}
