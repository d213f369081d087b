//! Field-inspection photo capture: scores whether the device looks like a
//! handheld phone, negotiates a rear camera, and produces a watermarked JPEG
//! bound to the inspection session.
//!
//! Platform capabilities (camera, orientation, geolocation, device traits)
//! come in through the traits in [`providers`]; the host wires real
//! implementations into [`Providers`] and drives a [`CaptureSession`].

pub mod camera;
pub mod capture;
pub mod models;
pub mod providers;
pub mod session;
pub mod settings;
pub mod trust;
pub mod upload;
mod utils;

pub use camera::{AcquisitionError, CameraNegotiator, Diagnostic, Negotiation};
pub use models::{CaptureArtifact, EvidenceRecord, SessionContext, TrustReport, TrustVerdict};
pub use providers::{CameraStream, ProviderError, Providers};
pub use session::{CameraOutcome, CaptureSession, Submission};
pub use settings::{LaudoSettings, SettingsStore};
pub use trust::{DeviceTrustScorer, SignalTimeouts, TrustPolicy};
pub use upload::{HttpUploadSink, UploadForm, UploadSink};

/// Installs the `env_logger` backend at info level. Safe to call more than
/// once.
pub fn init_logging() {
    // Initialize logging (reads RUST_LOG env var)
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .try_init();
}
