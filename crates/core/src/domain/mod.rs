pub mod contract;
pub mod metrics;
pub mod passage;
pub mod recommendation;
