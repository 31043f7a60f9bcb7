pub mod collector;
pub mod exposition;
pub mod push;

pub use collector::{MetricsCollector, MetricsSnapshot};
