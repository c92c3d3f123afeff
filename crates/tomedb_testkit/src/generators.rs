//! Property-based test generators using proptest.
//!
//! Provides strategies for generating records and collection names
//! that maintain the store's invariants.

use proptest::prelude::*;
use serde_json::{Map, Value};
use tomedb_core::{Record, ID_FIELD};

/// Strategy for JSON field values that survive a store/load round trip.
///
/// Floats are deliberately absent: re-serialized exponents and NaN make
/// field-for-field equality assertions flaky.
pub fn field_value_strategy() -> impl Strategy<Value = Value> {
    let scalar = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::string::string_regex("[ -~]{0,24}")
            .expect("Invalid regex")
            .prop_map(Value::from),
    ];
    prop_oneof![
        scalar.clone(),
        prop::collection::vec(scalar, 0..4).prop_map(Value::Array),
    ]
}

/// Strategy for field names other than the reserved id field.
pub fn field_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,11}")
        .expect("Invalid regex")
        .prop_filter("id is store-managed", |name| name != ID_FIELD)
}

/// Strategy for valid collection names.
pub fn collection_name_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z][a-z0-9_]{0,15}").expect("Invalid regex")
}

/// Strategy for records without an id, as handed to `store`.
pub fn record_strategy() -> impl Strategy<Value = Record> {
    prop::collection::btree_map(field_name_strategy(), field_value_strategy(), 0..8).prop_map(
        |fields| {
            let mut map = Map::new();
            for (name, value) in fields {
                map.insert(name, value);
            }
            Record::from(map)
        },
    )
}

/// Strategy for a batch of records, as handed to `store_many`.
pub fn record_batch_strategy() -> impl Strategy<Value = Vec<Record>> {
    prop::collection::vec(record_strategy(), 0..16)
}
