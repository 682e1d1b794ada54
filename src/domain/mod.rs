// Domain layer: cart models and ports (store, presentation, delay).

pub mod model;
pub mod ports;
