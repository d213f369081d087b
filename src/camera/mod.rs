//! Live camera acquisition: ordered constraint fallback followed by a
//! best-effort switch to the rear camera by explicit device id.

pub mod constraints;
pub mod error;
pub mod negotiator;

pub use constraints::fallback_chain;
pub use error::{AcquisitionError, Diagnostic};
pub use negotiator::{CameraNegotiator, Negotiation};
