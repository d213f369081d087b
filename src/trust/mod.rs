pub mod config;
pub mod scorer;
pub mod scoring;

pub use config::{SignalTimeouts, TrustPolicy};
pub use scorer::DeviceTrustScorer;
pub use scoring::{compute_score, compute_verdict};
