//! Per-request user context: the bounded multi-source snapshot and the
//! token estimates used when sizing prompts.

pub mod aggregator;
pub mod token;

pub use aggregator::ContextAggregator;
