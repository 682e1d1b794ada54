use crate::utils::error::{CartError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 每個活動最多可購買的票數
pub const MAX_QTY: u32 = 10;

/// 服務費率，以萬分比表示 (5%)
pub const SERVICE_FEE_BPS: u64 = 500;

/// 單張票價上限 (最小貨幣單位)
pub const MAX_UNIT_PRICE: u64 = 1_000_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fallback key for records that carry no reliable identifier.
    pub fn composite(title: &str, date: &str) -> Self {
        Self(format!("{}|{}", title.trim(), date.trim()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// 購物車中單一活動的票券選擇
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub event_id: EventId,
    pub title: String,
    pub date: String,
    pub venue: String,
    pub unit_price: u64,
    quantity: u32,
    pub image_ref: Option<String>,
    pub(crate) extra: serde_json::Map<String, serde_json::Value>,
}

impl LineItem {
    pub fn new(
        event_id: impl Into<EventId>,
        title: impl Into<String>,
        unit_price: u64,
        quantity: i64,
    ) -> Result<Self> {
        let event_id: EventId = event_id.into();
        let event_id = EventId::new(event_id.as_str().trim());
        if event_id.as_str().is_empty() {
            return Err(CartError::ValidationError {
                message: "event id cannot be empty".to_string(),
            });
        }
        if unit_price > MAX_UNIT_PRICE {
            return Err(CartError::ValidationError {
                message: format!(
                    "unit price {} for '{}' exceeds the maximum of {}",
                    unit_price, event_id, MAX_UNIT_PRICE
                ),
            });
        }
        let quantity = checked_quantity(&event_id, quantity)?;

        Ok(Self {
            event_id,
            title: title.into(),
            date: String::new(),
            venue: String::new(),
            unit_price,
            quantity,
            image_ref: None,
            extra: serde_json::Map::new(),
        })
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    pub fn with_venue(mut self, venue: impl Into<String>) -> Self {
        self.venue = venue.into();
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }

    /// Fields this crate does not understand, kept so they survive a save.
    pub fn extra(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.extra
    }

    /// Caller guarantees `1..=MAX_QTY`.
    pub(crate) fn set_quantity_unchecked(&mut self, quantity: u32) {
        debug_assert!((1..=MAX_QTY).contains(&quantity));
        self.quantity = quantity;
    }
}

pub(crate) fn checked_quantity(event_id: &EventId, quantity: i64) -> Result<u32> {
    if quantity < 1 || quantity > i64::from(MAX_QTY) {
        return Err(CartError::QuantityBoundsViolation {
            event_id: event_id.to_string(),
            attempted: quantity,
            max: MAX_QTY,
        });
    }
    Ok(quantity as u32)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: u64,
    pub service_fee: u64,
    pub grand_total: u64,
    pub item_count: usize,
    pub ticket_count: u64,
}

/// `round(subtotal * 5%)`, halves rounded up.
pub fn service_fee(subtotal: u64) -> u64 {
    let fee = (u128::from(subtotal) * u128::from(SERVICE_FEE_BPS) + 5_000) / 10_000;
    u64::try_from(fee).unwrap_or(u64::MAX)
}

/// 依加入順序排列、以 event_id 為唯一鍵的購物車
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a cart from arbitrary records, merging duplicate ids and
    /// clamping merged quantities to `MAX_QTY`.
    pub fn from_items(items: impl IntoIterator<Item = LineItem>) -> Self {
        let mut cart = Cart::new();
        for item in items {
            match cart.position(&item.event_id) {
                Some(index) => {
                    let existing = &mut cart.items[index];
                    let merged = (existing.quantity + item.quantity).min(MAX_QTY);
                    existing.set_quantity_unchecked(merged);
                }
                None => cart.items.push(item),
            }
        }
        cart
    }

    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, event_id: &EventId) -> Option<&LineItem> {
        self.items.iter().find(|item| &item.event_id == event_id)
    }

    pub(crate) fn position(&self, event_id: &EventId) -> Option<usize> {
        self.items.iter().position(|item| &item.event_id == event_id)
    }

    pub(crate) fn item_mut(&mut self, index: usize) -> &mut LineItem {
        &mut self.items[index]
    }

    pub(crate) fn push(&mut self, item: LineItem) {
        self.items.push(item);
    }

    pub(crate) fn remove_at(&mut self, index: usize) -> LineItem {
        self.items.remove(index)
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub fn totals(&self) -> CartTotals {
        // unit_price 是公開欄位，加總一律飽和
        let subtotal = self
            .items
            .iter()
            .map(LineItem::line_total)
            .fold(0u64, u64::saturating_add);
        let service_fee = service_fee(subtotal);

        CartTotals {
            subtotal,
            service_fee,
            grand_total: subtotal.saturating_add(service_fee),
            item_count: self.items.len(),
            ticket_count: self.items.iter().map(|item| u64::from(item.quantity)).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_item_rejects_out_of_bounds_quantity() {
        assert!(LineItem::new("E1", "Jazz Night", 500, 0).is_err());
        assert!(LineItem::new("E1", "Jazz Night", 500, 11).is_err());
        assert!(LineItem::new("E1", "Jazz Night", 500, -3).is_err());

        let item = LineItem::new("E1", "Jazz Night", 500, 10).unwrap();
        assert_eq!(item.line_total(), 5_000);
    }

    #[test]
    fn test_service_fee_rounds_half_up() {
        assert_eq!(service_fee(0), 0);
        assert_eq!(service_fee(1_000), 50);
        // 0.45 -> 0, 0.5 -> 1
        assert_eq!(service_fee(9), 0);
        assert_eq!(service_fee(10), 1);
        assert_eq!(service_fee(29), 1);
        assert_eq!(service_fee(30), 2);
    }

    #[test]
    fn test_unit_price_above_bound_is_rejected() {
        assert!(matches!(
            LineItem::new("E1", "Gala", 100_000_000_000_000_000, 1),
            Err(CartError::ValidationError { .. })
        ));

        let item = LineItem::new("E1", "Gala", MAX_UNIT_PRICE, i64::from(MAX_QTY)).unwrap();
        assert_eq!(item.line_total(), MAX_UNIT_PRICE * 10);
    }

    #[test]
    fn test_totals_saturate_on_huge_prices() {
        let mut item = LineItem::new("E1", "Gala", 1, 2).unwrap();
        item.unit_price = u64::MAX / 2;
        let cart = Cart::from_items(vec![item]);

        let totals = cart.totals();
        assert_eq!(totals.subtotal, u64::MAX - 1);
        assert_eq!(totals.grand_total, u64::MAX);
        assert_eq!(service_fee(u64::MAX), 922_337_203_685_477_581);
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        assert_eq!(Cart::new().totals(), CartTotals::default());
    }

    #[test]
    fn test_from_items_merges_duplicates() {
        let cart = Cart::from_items(vec![
            LineItem::new("E1", "Jazz Night", 500, 6).unwrap(),
            LineItem::new("E2", "Comedy Hour", 300, 1).unwrap(),
            LineItem::new("E1", "Jazz Night", 500, 7).unwrap(),
        ]);

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.items()[0].event_id.as_str(), "E1");
        assert_eq!(cart.items()[0].quantity(), MAX_QTY);
    }

    #[test]
    fn test_composite_event_id() {
        let id = EventId::composite(" Rock Fest ", "2025-03-01");
        assert_eq!(id.as_str(), "Rock Fest|2025-03-01");
    }
}
