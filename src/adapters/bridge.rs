use crate::domain::model::{CartTotals, EventId, LineItem, MAX_QTY};
use crate::domain::ports::PresentationBridge;

/// Renders the cart to the terminal and mirrors every notification to tracing.
#[derive(Debug, Default)]
pub struct ConsoleBridge {
    quiet: bool,
}

impl ConsoleBridge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Logs notifications without printing the cart table.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

pub fn render_cart(snapshot: &[LineItem], totals: &CartTotals) -> String {
    if snapshot.is_empty() {
        return "Your cart is empty.".to_string();
    }

    let mut lines = Vec::with_capacity(snapshot.len() + 4);
    for item in snapshot {
        lines.push(format!(
            "{:<12} {:<28} {:>3} x {:>8} = {:>10}",
            item.event_id.as_str(),
            item.title,
            item.quantity(),
            item.unit_price,
            item.line_total()
        ));
    }
    lines.push(format!("{:>55} {:>10}", "Subtotal:", totals.subtotal));
    lines.push(format!("{:>55} {:>10}", "Service fee (5%):", totals.service_fee));
    lines.push(format!("{:>55} {:>10}", "Total:", totals.grand_total));
    lines.push(format!(
        "{} event(s), {} ticket(s)",
        totals.item_count, totals.ticket_count
    ));
    lines.join("\n")
}

impl PresentationBridge for ConsoleBridge {
    fn on_cart_changed(&mut self, snapshot: &[LineItem], totals: &CartTotals) {
        tracing::info!(
            "🛒 Cart updated: {} item(s), {} ticket(s), total {}",
            totals.item_count,
            totals.ticket_count,
            totals.grand_total
        );
        if !self.quiet {
            println!("{}", render_cart(snapshot, totals));
        }
    }

    fn on_persistence_warning(&mut self, message: &str) {
        tracing::warn!("⚠️ Cart not saved: {}", message);
        eprintln!("⚠️ Your cart could not be saved: {}", message);
    }

    fn on_bounds_rejected(&mut self, event_id: &EventId, attempted_quantity: i64) {
        tracing::warn!(
            "Quantity {} rejected for {} (max {})",
            attempted_quantity,
            event_id,
            MAX_QTY
        );
        eprintln!("⚠️ Maximum {} tickets per event", MAX_QTY);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BridgeEvent {
    CartChanged {
        snapshot: Vec<LineItem>,
        totals: CartTotals,
    },
    PersistenceWarning(String),
    BoundsRejected {
        event_id: EventId,
        attempted_quantity: i64,
    },
}

/// Collects notifications in order; for embedding hosts and tests.
#[derive(Debug, Default)]
pub struct RecordingBridge {
    events: Vec<BridgeEvent>,
}

impl RecordingBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[BridgeEvent] {
        &self.events
    }

    pub fn bounds_rejections(&self) -> Vec<(EventId, i64)> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::BoundsRejected {
                    event_id,
                    attempted_quantity,
                } => Some((event_id.clone(), *attempted_quantity)),
                _ => None,
            })
            .collect()
    }

    pub fn warnings(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                BridgeEvent::PersistenceWarning(message) => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn change_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, BridgeEvent::CartChanged { .. }))
            .count()
    }
}

impl PresentationBridge for RecordingBridge {
    fn on_cart_changed(&mut self, snapshot: &[LineItem], totals: &CartTotals) {
        self.events.push(BridgeEvent::CartChanged {
            snapshot: snapshot.to_vec(),
            totals: *totals,
        });
    }

    fn on_persistence_warning(&mut self, message: &str) {
        self.events
            .push(BridgeEvent::PersistenceWarning(message.to_string()));
    }

    fn on_bounds_rejected(&mut self, event_id: &EventId, attempted_quantity: i64) {
        self.events.push(BridgeEvent::BoundsRejected {
            event_id: event_id.clone(),
            attempted_quantity,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Cart;

    #[test]
    fn test_render_empty_cart() {
        assert_eq!(render_cart(&[], &CartTotals::default()), "Your cart is empty.");
    }

    #[test]
    fn test_render_cart_shows_totals() {
        let cart = Cart::from_items(vec![LineItem::new("E1", "Jazz Night", 500, 2).unwrap()]);
        let rendered = render_cart(cart.items(), &cart.totals());

        assert!(rendered.contains("Jazz Night"));
        assert!(rendered.contains("1050"));
        assert!(rendered.contains("1 event(s), 2 ticket(s)"));
    }
}
