//! JSON layout of the persisted cart.
//!
//! Records are written with camelCase keys (`eventId`, `title`, `date`,
//! `venue`, `unitPrice`, `quantity`, `lineTotal`, optional `imageRef`).
//! Keys the crate does not know are carried through untouched. Records
//! written by older pages (`price`, `total`, `image`, string quantities,
//! no `eventId`) are still readable.

use crate::domain::model::{Cart, EventId, LineItem, MAX_QTY};
use crate::utils::error::{CartError, Result};
use serde_json::{Map, Value};

const CANONICAL_KEYS: &[&str] = &[
    "eventId",
    "title",
    "date",
    "venue",
    "unitPrice",
    "quantity",
    "lineTotal",
    "imageRef",
];


pub fn encode_cart(cart: &Cart) -> Result<String> {
    let records: Vec<Value> = cart.items().iter().map(encode_item).collect();
    Ok(serde_json::to_string(&records)?)
}

fn encode_item(item: &LineItem) -> Value {
    let mut object = Map::new();
    object.insert("eventId".into(), Value::String(item.event_id.to_string()));
    object.insert("title".into(), Value::String(item.title.clone()));
    object.insert("date".into(), Value::String(item.date.clone()));
    object.insert("venue".into(), Value::String(item.venue.clone()));
    object.insert("unitPrice".into(), Value::from(item.unit_price));
    object.insert("quantity".into(), Value::from(item.quantity()));
    object.insert("lineTotal".into(), Value::from(item.line_total()));
    if let Some(image_ref) = &item.image_ref {
        object.insert("imageRef".into(), Value::String(image_ref.clone()));
    }

    for (key, value) in item.extra() {
        object.entry(key.clone()).or_insert_with(|| value.clone());
    }

    Value::Object(object)
}

/// Parses a stored cart. Fails only when the value as a whole is unusable;
/// individual bad records are skipped.
pub fn decode_cart(raw: &str) -> Result<Cart> {
    let value: Value = serde_json::from_str(raw).map_err(|e| CartError::MalformedStoreData {
        message: format!("invalid JSON: {}", e),
    })?;

    let Value::Array(records) = value else {
        return Err(CartError::MalformedStoreData {
            message: "expected a JSON array of line items".to_string(),
        });
    };

    let mut items = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        match decode_item(record) {
            Ok(Some(item)) => items.push(item),
            Ok(None) => {
                tracing::debug!("Dropping stored record #{} with non-positive quantity", index)
            }
            Err(e) => tracing::warn!("Skipping stored record #{}: {}", index, e),
        }
    }

    Ok(Cart::from_items(items))
}

fn decode_item(record: Value) -> Result<Option<LineItem>> {
    let Value::Object(mut object) = record else {
        return Err(malformed("record is not an object"));
    };

    let title = take_string(&object, "title");
    let date = take_string(&object, "date");
    let venue = take_string(&object, "venue");

    let event_id = match object.get("eventId").and_then(value_as_id) {
        Some(id) => EventId::new(id),
        None if !title.trim().is_empty() => EventId::composite(&title, &date),
        None => match object.get("id").and_then(value_as_id) {
            Some(id) => EventId::new(id),
            None => return Err(malformed("record has no eventId, title or id")),
        },
    };

    // 舊版頁面寫的是 price / total / image，只有在當作來源時才移除
    let legacy_price = !object.contains_key("unitPrice") && object.contains_key("price");
    let unit_price = object
        .get(if legacy_price { "price" } else { "unitPrice" })
        .map(|value| parse_amount(value).ok_or_else(|| malformed("unreadable price")))
        .transpose()?
        .unwrap_or(0);

    let quantity = object
        .get("quantity")
        .and_then(parse_quantity)
        .ok_or_else(|| malformed("missing or unreadable quantity"))?;
    if quantity <= 0 {
        return Ok(None);
    }
    if quantity > i64::from(MAX_QTY) {
        tracing::warn!(
            "Stored quantity {} for '{}' exceeds {}, clamping",
            quantity,
            event_id,
            MAX_QTY
        );
    }

    let legacy_image = !object.contains_key("imageRef") && object.contains_key("image");
    let image_ref = object
        .get(if legacy_image { "image" } else { "imageRef" })
        .and_then(Value::as_str)
        .map(str::to_string);

    if legacy_price {
        object.remove("price");
        if !object.contains_key("lineTotal") {
            object.remove("total");
        }
    }
    if legacy_image {
        object.remove("image");
    }
    for key in CANONICAL_KEYS {
        object.remove(*key);
    }

    let mut item = LineItem::new(event_id, title, unit_price, quantity.min(i64::from(MAX_QTY)))?
        .with_date(date)
        .with_venue(venue);
    item.image_ref = image_ref;
    item.extra = object;

    Ok(Some(item))
}

fn malformed(message: &str) -> CartError {
    CartError::MalformedStoreData {
        message: message.to_string(),
    }
}

fn take_string(object: &Map<String, Value>, key: &str) -> String {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn value_as_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Accepts numbers and strings such as `"₹1,500"` or `"450.00"`.
fn parse_amount(value: &Value) -> Option<u64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            cleaned.parse::<f64>().ok()?
        }
        _ => return None,
    };

    if !amount.is_finite() || amount < 0.0 {
        return None;
    }
    Some(amount.round() as u64)
}

fn parse_quantity(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
