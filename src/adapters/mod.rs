// Adapters layer: concrete implementations of the domain ports (storage, presentation).

pub mod bridge;
pub mod codec;
pub mod storage;
