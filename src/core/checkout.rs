use crate::core::cart_engine::CartEngine;
use crate::core::{CartError, CartStore, CartTotals, Delay, LineItem, PresentationBridge, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// 原始頁面模擬付款處理的延遲時間
pub const DEFAULT_PROCESSING_DELAY: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    Idle,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    /// A checkout is already in flight; the submit was ignored.
    AlreadySubmitting,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutReceipt {
    pub reference: String,
    pub items: Vec<LineItem>,
    pub totals: CartTotals,
    pub booked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CheckoutOutcome {
    Succeeded(CheckoutReceipt),
    Failed { reason: String },
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioDelay;

#[async_trait]
impl Delay for TokioDelay {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Resolves immediately; for tests and non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

#[async_trait]
impl Delay for NoDelay {
    async fn wait(&self, _duration: Duration) {}
}

/// Mock checkout: `Idle → Submitting → Succeeded | Failed → Idle`.
/// Nothing is charged anywhere; the delay only gives the UI a busy state.
pub struct CheckoutSequencer<D: Delay> {
    state: CheckoutState,
    last_result: Option<CheckoutState>,
    delay: D,
    processing_delay: Duration,
}

impl<D: Delay> CheckoutSequencer<D> {
    pub fn new(delay: D, processing_delay: Duration) -> Self {
        Self {
            state: CheckoutState::Idle,
            last_result: None,
            delay,
            processing_delay,
        }
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    /// Terminal state of the most recent completed checkout.
    pub fn last_result(&self) -> Option<CheckoutState> {
        self.last_result
    }

    pub fn is_busy(&self) -> bool {
        self.state == CheckoutState::Submitting
    }

    pub fn submit<S: CartStore, B: PresentationBridge>(
        &mut self,
        engine: &CartEngine<S, B>,
    ) -> Result<SubmitOutcome> {
        if self.state == CheckoutState::Submitting {
            tracing::debug!("Checkout already submitting, ignoring submit");
            return Ok(SubmitOutcome::AlreadySubmitting);
        }

        if engine.is_empty() {
            return Err(CartError::EmptyCart);
        }

        self.state = CheckoutState::Submitting;
        tracing::info!(
            "💳 Processing checkout for {} ticket(s), total {}",
            engine.totals().ticket_count,
            engine.totals().grand_total
        );
        Ok(SubmitOutcome::Started)
    }

    /// Waits out the processing delay, then books whatever the cart holds at
    /// that moment and clears it.
    pub async fn complete<S: CartStore, B: PresentationBridge>(
        &mut self,
        engine: &mut CartEngine<S, B>,
    ) -> Result<CheckoutOutcome> {
        if self.state != CheckoutState::Submitting {
            return Err(CartError::CheckoutNotStarted);
        }

        self.delay.wait(self.processing_delay).await;

        let outcome = if engine.is_empty() {
            self.state = CheckoutState::Failed;
            tracing::warn!("❌ Checkout failed: cart was emptied while processing");
            CheckoutOutcome::Failed {
                reason: "cart was emptied before payment completed".to_string(),
            }
        } else {
            let receipt = issue_receipt(engine.snapshot(), engine.totals());
            engine.clear();
            self.state = CheckoutState::Succeeded;
            tracing::info!(
                "✅ Payment successful, booking {} confirmed",
                receipt.reference
            );
            CheckoutOutcome::Succeeded(receipt)
        };

        self.last_result = Some(self.state);
        self.state = CheckoutState::Idle;
        Ok(outcome)
    }

    pub async fn checkout<S: CartStore, B: PresentationBridge>(
        &mut self,
        engine: &mut CartEngine<S, B>,
    ) -> Result<CheckoutOutcome> {
        self.submit(engine)?;
        self.complete(engine).await
    }
}

impl Default for CheckoutSequencer<TokioDelay> {
    fn default() -> Self {
        Self::new(TokioDelay, DEFAULT_PROCESSING_DELAY)
    }
}

fn issue_receipt(items: Vec<LineItem>, totals: CartTotals) -> CheckoutReceipt {
    let booked_at = Utc::now();
    CheckoutReceipt {
        reference: format!("BK-{}", booked_at.format("%Y%m%d%H%M%S%3f")),
        items,
        totals,
        booked_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::bridge::RecordingBridge;
    use crate::adapters::storage::{KeyValueCartStore, MemoryStore};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default, Clone)]
    struct CountingDelay {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Delay for CountingDelay {
        async fn wait(&self, duration: Duration) {
            assert_eq!(duration, DEFAULT_PROCESSING_DELAY);
            self.calls.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn engine_with_items() -> CartEngine<KeyValueCartStore<MemoryStore>, RecordingBridge> {
        let mut engine =
            CartEngine::new(KeyValueCartStore::new(MemoryStore::new()), RecordingBridge::new());
        engine
            .add_or_merge(LineItem::new("E1", "Jazz Night", 500, 2).unwrap())
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_and_returns_to_idle() {
        let delay = CountingDelay::default();
        let mut sequencer = CheckoutSequencer::new(delay.clone(), DEFAULT_PROCESSING_DELAY);
        let mut engine = engine_with_items();

        let outcome = sequencer.checkout(&mut engine).await.unwrap();

        let CheckoutOutcome::Succeeded(receipt) = outcome else {
            panic!("expected success");
        };
        assert_eq!(receipt.totals.grand_total, 1050);
        assert_eq!(receipt.items.len(), 1);
        assert!(receipt.reference.starts_with("BK-"));
        assert!(engine.is_empty());
        assert_eq!(sequencer.state(), CheckoutState::Idle);
        assert_eq!(sequencer.last_result(), Some(CheckoutState::Succeeded));
        assert_eq!(delay.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_submit_is_ignored() {
        let mut sequencer = CheckoutSequencer::new(NoDelay, Duration::ZERO);
        let engine = engine_with_items();

        assert_eq!(sequencer.submit(&engine).unwrap(), SubmitOutcome::Started);
        assert_eq!(
            sequencer.submit(&engine).unwrap(),
            SubmitOutcome::AlreadySubmitting
        );
        assert!(sequencer.is_busy());
    }

    #[test]
    fn test_empty_cart_cannot_be_submitted() {
        let mut sequencer = CheckoutSequencer::new(NoDelay, Duration::ZERO);
        let engine =
            CartEngine::new(KeyValueCartStore::new(MemoryStore::new()), RecordingBridge::new());

        assert!(matches!(sequencer.submit(&engine), Err(CartError::EmptyCart)));
        assert_eq!(sequencer.state(), CheckoutState::Idle);
    }

    #[tokio::test]
    async fn test_complete_without_submit_is_rejected() {
        let mut sequencer = CheckoutSequencer::new(NoDelay, Duration::ZERO);
        let mut engine = engine_with_items();

        let result = sequencer.complete(&mut engine).await;
        assert!(matches!(result, Err(CartError::CheckoutNotStarted)));
        assert_eq!(engine.len(), 1);
    }

    #[tokio::test]
    async fn test_cart_emptied_while_submitting_fails() {
        let mut sequencer = CheckoutSequencer::new(NoDelay, Duration::ZERO);
        let mut engine = engine_with_items();

        sequencer.submit(&engine).unwrap();
        engine.remove(&"E1".into());
        let outcome = sequencer.complete(&mut engine).await.unwrap();

        assert!(matches!(outcome, CheckoutOutcome::Failed { .. }));
        assert_eq!(sequencer.state(), CheckoutState::Idle);
        assert_eq!(sequencer.last_result(), Some(CheckoutState::Failed));
    }
}
