use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::camera::{AcquisitionError, CameraNegotiator, Diagnostic};
use crate::capture;
use crate::models::{CaptureArtifact, Location, SessionContext, TrustReport};
use crate::providers::{
    CameraStream, GeolocationProvider, PositionOptions, Providers, TrackSettings,
};
use crate::settings::LaudoSettings;
use crate::trust::DeviceTrustScorer;
use crate::upload::{UploadForm, UploadSink};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

/// What happened when the user asked to open the camera.
#[derive(Debug, Clone)]
pub enum CameraOutcome {
    /// Stream acquired and on display.
    Ready(TrackSettings),
    /// The device did not score as a handheld; no camera was touched.
    Rejected(TrustReport),
    Unavailable(Diagnostic),
}

#[derive(Debug)]
pub struct Submission {
    pub artifact: CaptureArtifact,
    pub uploaded: bool,
}

struct SessionState {
    context: SessionContext,
    stream: Option<Box<dyn CameraStream>>,
    report: Option<TrustReport>,
}

impl SessionState {
    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.release();
        }
    }
}

impl Drop for SessionState {
    fn drop(&mut self) {
        self.release_stream();
    }
}

/// Clears the in-progress flag when the capture finishes, however it ends.
struct CaptureGuard<'a>(&'a AtomicBool);

impl<'a> CaptureGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for CaptureGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// One capture session: trust gate, the single active camera stream, and
/// capture/upload of the watermarked photo.
#[derive(Clone)]
pub struct CaptureSession {
    state: Arc<Mutex<SessionState>>,
    /// Held from releasing the old stream until the new one is installed.
    opening: Arc<Mutex<()>>,
    capturing: Arc<AtomicBool>,
    scorer: Arc<DeviceTrustScorer>,
    negotiator: Arc<CameraNegotiator>,
    providers: Providers,
    settings: LaudoSettings,
    sink: Option<Arc<dyn UploadSink>>,
}

impl CaptureSession {
    pub fn new(providers: Providers, settings: LaudoSettings, plate_hint: Option<String>) -> Self {
        let scorer = DeviceTrustScorer::new(
            providers.clone(),
            settings.trust.clone(),
            settings.timeouts.clone(),
        );
        let negotiator = CameraNegotiator::new(providers.clone())
            .enumeration_timeout(settings.timeouts.enumeration())
            .acquire_timeout(settings.timeouts.acquire());

        let context = SessionContext::new(plate_hint);
        log_info!("capture session {} started", context.token());

        Self {
            state: Arc::new(Mutex::new(SessionState {
                context,
                stream: None,
                report: None,
            })),
            opening: Arc::new(Mutex::new(())),
            capturing: Arc::new(AtomicBool::new(false)),
            scorer: Arc::new(scorer),
            negotiator: Arc::new(negotiator),
            providers,
            settings,
            sink: None,
        }
    }

    pub fn with_upload_sink(mut self, sink: Arc<dyn UploadSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub async fn context(&self) -> SessionContext {
        self.state.lock().await.context.clone()
    }

    pub async fn last_report(&self) -> Option<TrustReport> {
        self.state.lock().await.report.clone()
    }

    pub async fn has_stream(&self) -> bool {
        self.state.lock().await.stream.is_some()
    }

    /// Runs a fresh scoring pass and replaces the previous report.
    pub async fn evaluate_trust(&self) -> TrustReport {
        let mut state = self.state.lock().await;
        let report = self
            .scorer
            .evaluate(state.stream.as_deref(), &state.context)
            .await;
        state.report = Some(report.clone());
        report
    }

    /// Gated on a passing trust report (evaluated now if none exists yet).
    /// Any stream already open is released before a new one is negotiated,
    /// and concurrent calls take turns so only one camera lock is ever held.
    /// The location refresh that follows runs in the background.
    pub async fn open_camera(&self) -> CameraOutcome {
        let report = match self.last_report().await {
            Some(report) => report,
            None => self.evaluate_trust().await,
        };
        if !report.passed() {
            log_warn!(
                "camera refused: trust score {:.1} below {:.1}",
                report.verdict.score,
                self.scorer.policy().pass_threshold
            );
            return CameraOutcome::Rejected(report);
        }

        let _opening = self.opening.lock().await;
        self.close_camera().await;

        let negotiation = self.negotiator.negotiate().await;
        let Some(stream) = negotiation.stream else {
            let diagnostic = negotiation.diagnostic.unwrap_or_else(|| {
                Diagnostic::from(AcquisitionError::NoCameraFound { detail: None })
            });
            return CameraOutcome::Unavailable(diagnostic);
        };

        let settings = stream.settings();
        {
            let mut state = self.state.lock().await;
            state.release_stream();
            state.stream = Some(stream);
            state.context.mark_displayed(Utc::now());
        }
        log_info!(
            "camera on display: facing={:?} {}x{}",
            settings.facing_mode,
            settings.width.unwrap_or(0),
            settings.height.unwrap_or(0)
        );

        self.spawn_location_refresh();
        CameraOutcome::Ready(settings)
    }

    pub async fn close_camera(&self) {
        let mut state = self.state.lock().await;
        if state.stream.is_some() {
            state.release_stream();
            log_info!("camera released for session {}", state.context.token());
        }
    }

    /// One high-accuracy fix; on success it becomes the session location.
    pub async fn refresh_location(&self) -> Option<Location> {
        let provider = self.providers.geolocation.as_ref()?;
        let bound = self.settings.timeouts.geolocation();
        let location = fetch_location(provider.as_ref(), bound).await?;
        self.state.lock().await.context.record_location(location);
        Some(location)
    }

    /// The task only holds a weak handle, so an ended session is not kept
    /// alive by a pending fix.
    fn spawn_location_refresh(&self) {
        let Some(provider) = self.providers.geolocation.clone() else {
            return;
        };
        let bound = self.settings.timeouts.geolocation();
        let state: Weak<Mutex<SessionState>> = Arc::downgrade(&self.state);

        tokio::spawn(async move {
            let Some(location) = fetch_location(provider.as_ref(), bound).await else {
                return;
            };
            if let Some(state) = state.upgrade() {
                state.lock().await.context.record_location(location);
            }
        });
    }

    /// `None` when there is no stream, a capture is already running, or no
    /// frame could be rasterized.
    pub async fn capture(&self) -> Option<CaptureArtifact> {
        let Some(_guard) = CaptureGuard::try_acquire(&self.capturing) else {
            log_info!("capture already in progress; ignoring request");
            return None;
        };

        let state = self.state.lock().await;
        let Some(stream) = state.stream.as_deref() else {
            log_warn!("capture requested without an active camera");
            return None;
        };
        let evidence = state
            .report
            .as_ref()
            .map(|report| report.evidence.clone())
            .unwrap_or_default();

        capture::capture(
            stream,
            &evidence,
            &state.context,
            self.settings.capture.max_width,
            self.settings.capture.quality,
        )
        .await
    }

    pub async fn upload(&self, artifact: &CaptureArtifact) -> Result<()> {
        let sink = self
            .sink
            .as_ref()
            .ok_or_else(|| anyhow!("no upload sink configured"))?;
        sink.submit(UploadForm::from_artifact(artifact))
            .await
            .with_context(|| format!("failed to upload {}", artifact.file_name()))
    }

    /// Upload failures are logged and reported through `uploaded`; the
    /// capture itself is kept either way.
    pub async fn capture_and_upload(&self) -> Option<Submission> {
        let artifact = self.capture().await?;
        let uploaded = match self.upload(&artifact).await {
            Ok(()) => true,
            Err(err) => {
                log_error!("{err:?}");
                false
            }
        };
        Some(Submission { artifact, uploaded })
    }

    /// Ends the session, releasing the camera.
    pub async fn end(self) {
        self.close_camera().await;
    }
}

async fn fetch_location(provider: &dyn GeolocationProvider, bound: Duration) -> Option<Location> {
    let request = provider.get_fix(PositionOptions::fresh_high_accuracy(bound));
    match timeout(bound, request).await {
        Ok(Ok(fix)) => Some(Location::from(fix)),
        Ok(Err(err)) => {
            log_warn!("location refresh failed: {err}");
            None
        }
        Err(_) => {
            log_warn!("location refresh timed out after {}ms", bound.as_millis());
            None
        }
    }
}
