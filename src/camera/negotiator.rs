use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::camera::constraints::fallback_chain;
use crate::camera::error::{AcquisitionError, Diagnostic};
use crate::providers::{
    CameraProvider, CameraStream, MediaDeviceInfo, ProviderError, Providers, VideoConstraints,
};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

const DEFAULT_ENUMERATION_TIMEOUT: Duration = Duration::from_secs(3);
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(15);

/// Result of [`CameraNegotiator::negotiate`]: a usable stream, or a
/// diagnostic explaining why there is none. Never both.
#[derive(Debug)]
pub struct Negotiation {
    pub stream: Option<Box<dyn CameraStream>>,
    pub diagnostic: Option<Diagnostic>,
}

pub struct CameraNegotiator {
    providers: Providers,
    chain: Vec<VideoConstraints>,
    enumeration_timeout: Duration,
    acquire_timeout: Duration,
}

impl CameraNegotiator {
    pub fn new(providers: Providers) -> Self {
        Self::with_chain(providers, fallback_chain())
    }

    pub fn with_chain(providers: Providers, chain: Vec<VideoConstraints>) -> Self {
        Self {
            providers,
            chain,
            enumeration_timeout: DEFAULT_ENUMERATION_TIMEOUT,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }

    pub fn enumeration_timeout(mut self, bound: Duration) -> Self {
        self.enumeration_timeout = bound;
        self
    }

    /// Bound on each single acquire call. An attempt that runs past it
    /// counts as failed and the chain moves on.
    pub fn acquire_timeout(mut self, bound: Duration) -> Self {
        self.acquire_timeout = bound;
        self
    }

    /// Top-level entry point: failures become a diagnostic instead of an error.
    pub async fn negotiate(&self) -> Negotiation {
        match self.acquire().await {
            Ok(stream) => Negotiation {
                stream: Some(stream),
                diagnostic: None,
            },
            Err(err) => {
                log_error!("camera acquisition failed: {err}");
                Negotiation {
                    stream: None,
                    diagnostic: Some(Diagnostic::from(err)),
                }
            }
        }
    }

    pub async fn acquire(&self) -> Result<Box<dyn CameraStream>, AcquisitionError> {
        let camera = self.preflight()?;
        self.ensure_camera_present(camera.as_ref()).await?;

        let (index, stream) = self.acquire_from(camera.as_ref(), 0).await?;
        self.prefer_rear(camera.as_ref(), stream, index).await
    }

    fn preflight(&self) -> Result<&Arc<dyn CameraProvider>, AcquisitionError> {
        if !self.providers.secure_context {
            return Err(AcquisitionError::EnvironmentUnsupported {
                reason: "page is not served from a secure context".to_string(),
            });
        }
        self.providers
            .camera
            .as_ref()
            .ok_or_else(|| AcquisitionError::EnvironmentUnsupported {
                reason: "runtime exposes no camera access".to_string(),
            })
    }

    /// Zero video inputs stops acquisition. A failed enumeration does not:
    /// some runtimes refuse to enumerate before the first grant.
    async fn ensure_camera_present(
        &self,
        camera: &dyn CameraProvider,
    ) -> Result<(), AcquisitionError> {
        match self.enumerate(camera).await {
            Some(devices) => {
                let count = devices.iter().filter(|d| d.is_video_input()).count();
                log_info!("{count} video input device(s) detected");
                if count == 0 {
                    return Err(AcquisitionError::NoCameraFound {
                        detail: Some("no video input devices enumerated".to_string()),
                    });
                }
                Ok(())
            }
            None => {
                log_warn!("device enumeration unavailable; attempting acquisition anyway");
                Ok(())
            }
        }
    }

    /// Walks the chain from `start`, stopping at the first success. The
    /// error of the last attempt is the one reported.
    async fn acquire_from(
        &self,
        camera: &dyn CameraProvider,
        start: usize,
    ) -> Result<(usize, Box<dyn CameraStream>), AcquisitionError> {
        let mut last_error = None;

        for (index, constraints) in self.chain.iter().enumerate().skip(start) {
            match self.attempt(camera, constraints).await {
                Ok(stream) => {
                    log_info!("camera acquired with attempt {index} ({constraints})");
                    return Ok((index, stream));
                }
                Err(err) => {
                    log_warn!("camera attempt {index} ({constraints}) failed: {err}");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error
            .map(AcquisitionError::from)
            .unwrap_or(AcquisitionError::NoCameraFound {
                detail: Some("no constraint sets to try".to_string()),
            }))
    }

    async fn attempt(
        &self,
        camera: &dyn CameraProvider,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, ProviderError> {
        match timeout(self.acquire_timeout, camera.acquire(constraints)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Other(format!(
                "camera did not answer within {}ms",
                self.acquire_timeout.as_millis()
            ))),
        }
    }

    /// Runtimes are free to ignore an ideal `facingMode`, so a stream that
    /// does not report itself as rear-facing is swapped for the first device
    /// labelled as a rear camera. A failed swap restores the original
    /// constraint set; only when that also fails does the whole acquisition
    /// fail, with nothing left open.
    async fn prefer_rear(
        &self,
        camera: &dyn CameraProvider,
        mut stream: Box<dyn CameraStream>,
        index: usize,
    ) -> Result<Box<dyn CameraStream>, AcquisitionError> {
        let settings = stream.settings();
        if settings.is_environment_facing() {
            return Ok(stream);
        }

        let Some(devices) = self.enumerate(camera).await else {
            return Ok(stream);
        };
        let Some(candidate) = devices
            .into_iter()
            .find(|d| d.is_video_input() && d.looks_rear_facing())
        else {
            log_debug!("no rear-labelled camera; keeping {:?}", settings.facing_mode);
            return Ok(stream);
        };

        if settings.device_id.as_deref() == Some(candidate.device_id.as_str()) {
            return Ok(stream);
        }

        log_info!(
            "switching to rear camera '{}' ({})",
            candidate.label,
            candidate.device_id
        );

        // Two open locks on the same hardware is what fails on phones, so the
        // current stream goes first.
        stream.release();

        let pinned = VideoConstraints::pinned_to(candidate.device_id.clone());
        match self.attempt(camera, &pinned).await {
            Ok(rear) => Ok(rear),
            Err(err) => {
                log_warn!(
                    "rear camera {} could not be opened ({err}); restoring previous stream",
                    candidate.device_id
                );
                let (_, restored) = self.acquire_from(camera, index).await?;
                Ok(restored)
            }
        }
    }

    async fn enumerate(&self, camera: &dyn CameraProvider) -> Option<Vec<MediaDeviceInfo>> {
        match timeout(self.enumeration_timeout, camera.enumerate()).await {
            Ok(Ok(devices)) => Some(devices),
            Ok(Err(err)) => {
                log_warn!("device enumeration failed: {err}");
                None
            }
            Err(_) => {
                log_warn!(
                    "device enumeration timed out after {}ms",
                    self.enumeration_timeout.as_millis()
                );
                None
            }
        }
    }
}
