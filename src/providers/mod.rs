//! Hardware/runtime capabilities consumed read-only by the scorer, the
//! camera negotiator and the capture pipeline.
//!
//! Each provider is a single request / single response contract. Hosts
//! implement these traits over whatever runtime they embed in; the rest of
//! the crate never touches the runtime directly.

mod error;
#[cfg(test)]
pub(crate) mod fake;
mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use image::RgbImage;

pub use error::ProviderError;
pub use types::{
    ConstraintValue, DeviceKind, FacingMode, GeoFix, MediaDeviceInfo, OrientationSample,
    PositionOptions, TrackSettings, VideoConstraints, FACING_ENVIRONMENT,
};

/// A live video track holding a hardware lock until released.
pub trait CameraStream: Send + Sync + fmt::Debug {
    fn settings(&self) -> TrackSettings;

    /// Current frame at native resolution, or `None` when no frame can be
    /// rasterized (stream not yet playing, surface unavailable).
    fn grab_frame(&self) -> Option<RgbImage>;

    fn is_live(&self) -> bool;

    /// Stops every track and frees the hardware lock. Idempotent.
    fn release(&mut self);
}

#[async_trait]
pub trait CameraProvider: Send + Sync {
    async fn enumerate(&self) -> Result<Vec<MediaDeviceInfo>, ProviderError>;

    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, ProviderError>;
}

#[async_trait]
pub trait OrientationProvider: Send + Sync {
    /// Whether the runtime gates orientation events behind an explicit grant.
    fn requires_permission(&self) -> bool {
        false
    }

    async fn request_permission(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }

    /// Resolves with the first event, or `None` if none arrives in `timeout`.
    async fn subscribe_once(&self, timeout: Duration) -> Option<OrientationSample>;
}

#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn get_fix(&self, options: PositionOptions) -> Result<GeoFix, ProviderError>;
}

/// Synchronous capability queries. `None` means the runtime does not expose
/// the capability at all.
pub trait DeviceTraits: Send + Sync {
    fn touch_capable(&self) -> Option<bool> {
        None
    }

    fn coarse_pointer(&self) -> Option<bool> {
        None
    }

    fn vibration_supported(&self) -> Option<bool> {
        None
    }

    /// Screen orientation type, e.g. `portrait-primary`.
    fn screen_orientation(&self) -> Option<String> {
        None
    }

    /// Network connection type, e.g. `4g`, `wifi`.
    fn connection_type(&self) -> Option<String> {
        None
    }
}

/// Runtime that exposes none of the synchronous capabilities.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeviceTraits;

impl DeviceTraits for NoDeviceTraits {}

/// Everything the host injects. Only `device` is mandatory; a missing
/// provider behaves as an absent capability.
#[derive(Clone)]
pub struct Providers {
    pub secure_context: bool,
    pub camera: Option<Arc<dyn CameraProvider>>,
    pub orientation: Option<Arc<dyn OrientationProvider>>,
    pub geolocation: Option<Arc<dyn GeolocationProvider>>,
    pub device: Arc<dyn DeviceTraits>,
}

impl Providers {
    pub fn new(secure_context: bool) -> Self {
        Self {
            secure_context,
            camera: None,
            orientation: None,
            geolocation: None,
            device: Arc::new(NoDeviceTraits),
        }
    }

    pub fn with_camera(mut self, camera: Arc<dyn CameraProvider>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn with_orientation(mut self, orientation: Arc<dyn OrientationProvider>) -> Self {
        self.orientation = Some(orientation);
        self
    }

    pub fn with_geolocation(mut self, geolocation: Arc<dyn GeolocationProvider>) -> Self {
        self.geolocation = Some(geolocation);
        self
    }

    pub fn with_device(mut self, device: Arc<dyn DeviceTraits>) -> Self {
        self.device = device;
        self
    }
}
