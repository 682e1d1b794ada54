use crate::domain::model::{Cart, CartTotals, EventId, LineItem};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Raw string key-value storage, the shape of browser local storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

pub trait CartStore {
    /// Never fails: missing or malformed data yields an empty cart.
    fn load(&self) -> Cart;

    /// Replaces the whole stored value.
    fn save(&mut self, cart: &Cart) -> Result<()>;

    fn clear(&mut self) -> Result<()>;
}

/// Rendering side of the cart. Receives read-only snapshots only.
pub trait PresentationBridge {
    fn on_cart_changed(&mut self, snapshot: &[LineItem], totals: &CartTotals);
    fn on_persistence_warning(&mut self, message: &str);
    fn on_bounds_rejected(&mut self, event_id: &EventId, attempted_quantity: i64);
}

#[async_trait]
pub trait Delay: Send + Sync {
    async fn wait(&self, duration: Duration);
}
