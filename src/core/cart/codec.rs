use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::core::error::CartCodecError;

/// Storage slot holding the persisted cart.
pub const CART_STORAGE_KEY: &str = "restaurant_cart";

/// Encode as a JSON object of decimal id string to quantity.
pub fn encode(entries: &BTreeMap<i64, u32>) -> String {
    let object: Map<String, Value> = entries
        .iter()
        .map(|(id, quantity)| (id.to_string(), Value::from(*quantity)))
        .collect();
    Value::Object(object).to_string()
}

/// Decode a persisted cart. All-or-nothing: one bad entry rejects the value.
pub fn decode(raw: &[u8]) -> Result<BTreeMap<i64, u32>, CartCodecError> {
    let Value::Object(object) = serde_json::from_slice::<Value>(raw)? else {
        return Err(CartCodecError::NotAnObject);
    };

    let mut entries = BTreeMap::new();
    for (key, value) in object {
        let id = parse_id(&key).ok_or_else(|| CartCodecError::InvalidId(key.clone()))?;
        let quantity = value
            .as_u64()
            .filter(|quantity| *quantity >= 1)
            .and_then(|quantity| u32::try_from(quantity).ok())
            .ok_or(CartCodecError::InvalidQuantity { id, value })?;
        entries.insert(id, quantity);
    }
    Ok(entries)
}

// Only the form `encode` produces: "7", never "07" or "+7".
fn parse_id(key: &str) -> Option<i64> {
    let id: i64 = key.parse().ok()?;
    (id.to_string() == key).then_some(id)
}
