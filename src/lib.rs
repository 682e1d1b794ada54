pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::bridge::{ConsoleBridge, RecordingBridge};
pub use adapters::storage::{FileStore, KeyValueCartStore, MemoryStore};
pub use config::toml_config::CartConfig;
pub use crate::core::cart_engine::{AddOutcome, CartEngine};
pub use crate::core::catalog::{EventCatalog, EventListing};
pub use crate::core::checkout::{CheckoutOutcome, CheckoutSequencer, CheckoutState, NoDelay, TokioDelay};
pub use domain::model::{Cart, CartTotals, EventId, LineItem, MAX_QTY, MAX_UNIT_PRICE};
pub use utils::error::{CartError, Result};
