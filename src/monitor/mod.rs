//! Continuous monitoring -- the shared sample history and the background sampler.

pub mod sampler;
pub mod store;

pub use sampler::Sampler;
pub use store::{HistoryStore, Sample};
