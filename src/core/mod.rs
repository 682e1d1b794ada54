pub mod cart_engine;
pub mod catalog;
pub mod checkout;
pub mod payment_form;

pub use crate::domain::model::{Cart, CartTotals, EventId, LineItem, MAX_QTY};
pub use crate::domain::ports::{CartStore, Delay, KeyValueStore, PresentationBridge};
pub use crate::utils::error::{CartError, Result};
