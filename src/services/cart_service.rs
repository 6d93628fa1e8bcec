use serde_json::{Map, Value};

use crate::models::CartLine;

const ITEM_ID_KEYS: &[&str] = &["itemId", "item_id", "productId", "product_id", "id"];
const VARIANT_ID_KEYS: &[&str] = &["variantId", "variant_id", "selectedVariantId", "variant"];
const QUANTITY_KEYS: &[&str] = &["quantity", "qty"];
const CUSTOMIZATION_KEYS: &[&str] = &["customization", "customizations", "options"];

/// Turns a client-submitted cart into typed lines.
///
/// Entries without a usable item id are dropped, quantities below 1 or
/// unparsable become 1, and customization is passed through untouched.
/// Anything that is not a JSON array yields an empty cart.
pub fn normalize(raw_cart: &Value) -> Vec<CartLine> {
    let Some(entries) = raw_cart.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let item_id = first_field(entry, ITEM_ID_KEYS).and_then(coerce_id)?;
            let variant_id = first_field(entry, VARIANT_ID_KEYS).and_then(coerce_id);
            let quantity = first_field(entry, QUANTITY_KEYS)
                .and_then(coerce_quantity)
                .unwrap_or(1);
            let customization = first_field(entry, CUSTOMIZATION_KEYS)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();

            Some(CartLine {
                item_id,
                variant_id,
                quantity,
                customization,
            })
        })
        .collect()
}

fn first_field<'a>(entry: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| !value.is_null())
}

/// Positive integer ids, given as a JSON number or a numeric string.
fn coerce_id(value: &Value) -> Option<i64> {
    let id = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    (id > 0).then_some(id)
}

fn coerce_quantity(value: &Value) -> Option<i32> {
    let quantity = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
        }
        _ => None,
    }?;
    (quantity >= 1).then(|| quantity.min(i64::from(i32::MAX)) as i32)
}
