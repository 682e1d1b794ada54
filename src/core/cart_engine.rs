use crate::core::{
    Cart, CartError, CartStore, CartTotals, EventId, LineItem, PresentationBridge, Result, MAX_QTY,
};
use crate::core::catalog::EventListing;
use crate::domain::model::checked_quantity;

#[derive(Debug, Clone, PartialEq)]
pub struct AddOutcome {
    pub item: LineItem,
    pub merged: bool,
    /// Tickets that did not fit under `MAX_QTY` and were dropped.
    pub dropped: u32,
}

/// Sole owner of the in-memory cart. Every mutation runs
/// mutate → persist → notify; a failed save keeps the in-memory change.
pub struct CartEngine<S: CartStore, B: PresentationBridge> {
    cart: Cart,
    store: S,
    bridge: B,
}

impl<S: CartStore, B: PresentationBridge> CartEngine<S, B> {
    /// 從 store 載入購物車，資料損毀時從空購物車開始
    pub fn new(store: S, bridge: B) -> Self {
        let cart = store.load();
        tracing::debug!("Cart engine started with {} item(s)", cart.len());
        Self {
            cart,
            store,
            bridge,
        }
    }

    pub fn add_or_merge(&mut self, candidate: LineItem) -> Result<AddOutcome> {
        let outcome = match self.cart.position(&candidate.event_id) {
            Some(index) => {
                let existing = self.cart.item_mut(index);
                let requested = existing.quantity() + candidate.quantity();
                let quantity = requested.min(MAX_QTY);
                existing.set_quantity_unchecked(quantity);

                AddOutcome {
                    item: existing.clone(),
                    merged: true,
                    dropped: requested - quantity,
                }
            }
            None => {
                self.cart.push(candidate.clone());
                AddOutcome {
                    item: candidate,
                    merged: false,
                    dropped: 0,
                }
            }
        };

        tracing::debug!(
            "{} {} -> quantity {}",
            if outcome.merged { "Merged" } else { "Added" },
            outcome.item.event_id,
            outcome.item.quantity()
        );

        self.commit();

        if outcome.dropped > 0 {
            let attempted = i64::from(outcome.item.quantity() + outcome.dropped);
            tracing::warn!(
                "Clamped {} to {} tickets ({} requested)",
                outcome.item.event_id,
                MAX_QTY,
                attempted
            );
            self.bridge
                .on_bounds_rejected(&outcome.item.event_id, attempted);
        }

        Ok(outcome)
    }

    /// 活動詳情頁的「加入購物車」。數量超出範圍時通知 bridge，購物車不變
    pub fn add_listing(&mut self, listing: &EventListing, quantity: i64) -> Result<AddOutcome> {
        match listing.to_line_item(quantity) {
            Ok(candidate) => self.add_or_merge(candidate),
            Err(e @ CartError::QuantityBoundsViolation { .. }) => {
                tracing::warn!("Rejected quantity {} for {}", quantity, listing.id);
                self.bridge
                    .on_bounds_rejected(&EventId::new(listing.id.trim()), quantity);
                Err(e)
            }
            Err(e) => Err(e),
        }
    }

    /// Returns the updated item, or `None` when the item was removed or
    /// never existed.
    pub fn set_quantity(&mut self, event_id: &EventId, new_quantity: i64) -> Result<Option<LineItem>> {
        let Some(index) = self.cart.position(event_id) else {
            tracing::debug!("set_quantity on unknown event {}, ignoring", event_id);
            return Ok(None);
        };

        if new_quantity <= 0 {
            self.remove(event_id);
            return Ok(None);
        }

        let quantity = match checked_quantity(event_id, new_quantity) {
            Ok(quantity) => quantity,
            Err(e) => {
                tracing::warn!("Rejected quantity {} for {}", new_quantity, event_id);
                self.bridge.on_bounds_rejected(event_id, new_quantity);
                return Err(e);
            }
        };

        let item = self.cart.item_mut(index);
        item.set_quantity_unchecked(quantity);
        let updated = item.clone();
        tracing::debug!("Updated quantity of {} to {}", event_id, quantity);

        self.commit();
        Ok(Some(updated))
    }

    pub fn adjust_quantity(&mut self, event_id: &EventId, delta: i64) -> Result<Option<LineItem>> {
        let Some(current) = self.cart.get(event_id).map(LineItem::quantity) else {
            tracing::debug!("adjust_quantity on unknown event {}, ignoring", event_id);
            return Ok(None);
        };
        self.set_quantity(event_id, i64::from(current).saturating_add(delta))
    }

    /// Removing an absent id is a no-op.
    pub fn remove(&mut self, event_id: &EventId) -> Option<LineItem> {
        let index = self.cart.position(event_id)?;
        let removed = self.cart.remove_at(index);
        tracing::debug!("Removed {} from cart", removed.event_id);

        self.commit();
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.cart.clear();
        tracing::debug!("Cart cleared");

        if let Err(e) = self.store.clear() {
            self.report_persistence_failure(&e);
        }
        self.notify();
    }

    /// Re-reads the store, e.g. after another tab wrote to it. Last write wins.
    pub fn reload(&mut self) {
        self.cart = self.store.load();
        tracing::debug!("Reloaded cart with {} item(s)", self.cart.len());
        self.notify();
    }

    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    pub fn snapshot(&self) -> Vec<LineItem> {
        self.cart.items().to_vec()
    }

    pub fn get(&self, event_id: &EventId) -> Option<&LineItem> {
        self.cart.get(event_id)
    }

    pub fn len(&self) -> usize {
        self.cart.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    fn commit(&mut self) {
        if let Err(e) = self.store.save(&self.cart) {
            self.report_persistence_failure(&e);
        }
        self.notify();
    }

    fn report_persistence_failure(&mut self, error: &CartError) {
        tracing::warn!("Keeping cart in memory only: {}", error);
        self.bridge.on_persistence_warning(&error.to_string());
    }

    fn notify(&mut self) {
        let totals = self.cart.totals();
        self.bridge.on_cart_changed(self.cart.items(), &totals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bridge::{BridgeEvent, RecordingBridge};
    use crate::adapters::storage::{KeyValueCartStore, MemoryStore};

    type TestEngine = CartEngine<KeyValueCartStore<MemoryStore>, RecordingBridge>;

    fn engine() -> TestEngine {
        CartEngine::new(KeyValueCartStore::new(MemoryStore::new()), RecordingBridge::new())
    }

    fn ticket(id: &str, price: u64, quantity: i64) -> LineItem {
        LineItem::new(id, format!("Event {}", id), price, quantity).unwrap()
    }

    #[test]
    fn test_add_then_totals() {
        let mut engine = engine();
        let outcome = engine.add_or_merge(ticket("E1", 500, 2)).unwrap();

        assert!(!outcome.merged);
        let totals = engine.totals();
        assert_eq!(totals.subtotal, 1000);
        assert_eq!(totals.service_fee, 50);
        assert_eq!(totals.grand_total, 1050);
        assert_eq!(totals.item_count, 1);
        assert_eq!(totals.ticket_count, 2);
    }

    #[test]
    fn test_merge_clamps_and_reports_bounds() {
        let mut engine = engine();
        engine.add_or_merge(ticket("E1", 500, 2)).unwrap();
        let outcome = engine.add_or_merge(ticket("E1", 500, 9)).unwrap();

        assert!(outcome.merged);
        assert_eq!(outcome.item.quantity(), 10);
        assert_eq!(outcome.dropped, 1);
        assert_eq!(engine.len(), 1);
        assert_eq!(
            engine.bridge().bounds_rejections(),
            vec![(EventId::from("E1"), 11)]
        );
    }

    #[test]
    fn test_set_quantity_above_max_is_rejected_without_mutation() {
        let mut engine = engine();
        engine.add_or_merge(ticket("E1", 500, 2)).unwrap();
        let changes_before = engine.bridge().change_count();

        let err = engine.set_quantity(&"E1".into(), 11).unwrap_err();
        assert!(matches!(err, CartError::QuantityBoundsViolation { attempted: 11, .. }));
        assert_eq!(engine.get(&"E1".into()).unwrap().quantity(), 2);
        assert_eq!(engine.bridge().change_count(), changes_before);
        assert_eq!(engine.bridge().bounds_rejections().len(), 1);
    }

    #[test]
    fn test_add_listing_out_of_range_reports_bounds() {
        let listing = EventListing {
            id: "rock-fest".to_string(),
            title: "Rock Fest".to_string(),
            date: "2025-03-01".to_string(),
            venue: "City Arena".to_string(),
            category: "music".to_string(),
            price: 1500,
            image: None,
        };
        let mut engine = engine();

        let err = engine.add_listing(&listing, 11).unwrap_err();
        assert!(matches!(err, CartError::QuantityBoundsViolation { attempted: 11, max: 10, .. }));
        assert!(engine.is_empty());
        assert_eq!(engine.bridge().change_count(), 0);
        assert_eq!(
            engine.bridge().bounds_rejections(),
            vec![(EventId::from("rock-fest"), 11)]
        );

        let outcome = engine.add_listing(&listing, 3).unwrap();
        assert_eq!(outcome.item.line_total(), 4500);
        assert_eq!(engine.bridge().change_count(), 1);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let mut a = engine();
        let mut b = engine();
        for e in [&mut a, &mut b] {
            e.add_or_merge(ticket("E1", 500, 2)).unwrap();
            e.add_or_merge(ticket("E2", 300, 1)).unwrap();
        }

        a.set_quantity(&"E1".into(), 0).unwrap();
        b.remove(&"E1".into());
        assert_eq!(a.snapshot(), b.snapshot());
    }

    #[test]
    fn test_adjust_quantity() {
        let mut engine = engine();
        engine.add_or_merge(ticket("E1", 500, 2)).unwrap();

        let item = engine.adjust_quantity(&"E1".into(), 3).unwrap().unwrap();
        assert_eq!(item.quantity(), 5);

        assert!(engine.adjust_quantity(&"E1".into(), -5).unwrap().is_none());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_unknown_ids_are_no_ops() {
        let mut engine = engine();
        assert!(engine.remove(&"missing".into()).is_none());
        assert!(engine.set_quantity(&"missing".into(), 3).unwrap().is_none());
        assert!(engine.adjust_quantity(&"missing".into(), 1).unwrap().is_none());
        assert!(engine.bridge().events().is_empty());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let store = KeyValueCartStore::new(MemoryStore::with_quota(8));
        let mut engine = CartEngine::new(store, RecordingBridge::new());

        engine.add_or_merge(ticket("E1", 500, 2)).unwrap();

        assert_eq!(engine.len(), 1);
        assert_eq!(engine.bridge().warnings().len(), 1);
        assert!(matches!(
            engine.bridge().events().last(),
            Some(BridgeEvent::CartChanged { .. })
        ));
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut engine = engine();
        engine.add_or_merge(ticket("E1", 500, 2)).unwrap();
        engine.add_or_merge(ticket("E2", 300, 4)).unwrap();

        engine.clear();

        assert!(engine.snapshot().is_empty());
        assert_eq!(engine.totals(), CartTotals::default());
        assert!(engine.store().load().is_empty());
    }
}
