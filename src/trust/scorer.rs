use chrono::Utc;
use tokio::time::{timeout, Instant};

use crate::models::{EvidenceRecord, SessionContext, TrustReport};
use crate::providers::{
    CameraStream, GeoFix, OrientationSample, PositionOptions, Providers, TrackSettings,
};
use crate::trust::config::{SignalTimeouts, TrustPolicy};
use crate::trust::scoring::compute_verdict;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Fuses provider signals into a [`TrustReport`].
///
/// Every provider failure degrades to that signal's negative default, so
/// `evaluate` has no error path. Passes share nothing but the session
/// context they read.
pub struct DeviceTrustScorer {
    providers: Providers,
    policy: TrustPolicy,
    timeouts: SignalTimeouts,
}

impl DeviceTrustScorer {
    pub fn new(providers: Providers, policy: TrustPolicy, timeouts: SignalTimeouts) -> Self {
        Self {
            providers,
            policy,
            timeouts,
        }
    }

    pub fn policy(&self) -> &TrustPolicy {
        &self.policy
    }

    pub async fn evaluate(
        &self,
        stream: Option<&dyn CameraStream>,
        session: &SessionContext,
    ) -> TrustReport {
        let started = Instant::now();

        let camera = stream
            .filter(|stream| stream.is_live())
            .map(|stream| stream.settings());

        // The three waiting signals run side by side; each settles on its own bound.
        let (orientation, fix, cameras_count) = tokio::join!(
            self.sample_orientation(),
            self.request_fix(),
            self.count_cameras(),
        );

        let evidence = self.assemble(camera, orientation, fix, cameras_count);
        let verdict = compute_verdict(&evidence, &self.policy);

        log_info!(
            "trust pass for session {}: score={:.1} pass={} ({}ms)",
            session.token(),
            verdict.score,
            verdict.pass,
            started.elapsed().as_millis()
        );
        log_debug!("trust evidence: {evidence:?}");

        TrustReport {
            verdict,
            evidence,
            token: session.token().to_string(),
            evaluated_at: Utc::now(),
        }
    }

    fn assemble(
        &self,
        camera: Option<TrackSettings>,
        orientation: Option<OrientationSample>,
        fix: Option<GeoFix>,
        cameras_count: usize,
    ) -> EvidenceRecord {
        let device = &self.providers.device;
        let camera_active = camera.is_some();
        let camera = camera.unwrap_or_default();

        EvidenceRecord {
            camera_active,
            facing_mode: camera.facing_mode,
            width: camera.width,
            height: camera.height,
            orientation_ok: orientation.is_some_and(|sample| sample.has_reading()),
            orientation_sample: orientation,
            touch: device.touch_capable().unwrap_or(false),
            coarse_pointer: device.coarse_pointer().unwrap_or(false),
            geo_ok: fix.is_some(),
            geo_accuracy_m: fix.map(|fix| fix.accuracy_m),
            cameras_count,
            vibration: device.vibration_supported().unwrap_or(false),
            screen_orientation: device.screen_orientation(),
            connection_type: device.connection_type(),
        }
    }

    async fn sample_orientation(&self) -> Option<OrientationSample> {
        let provider = self.providers.orientation.as_ref()?;

        if provider.requires_permission() {
            match timeout(self.timeouts.permission(), provider.request_permission()).await {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    log_warn!("orientation permission denied; treating sensor as unavailable");
                    return None;
                }
                Ok(Err(err)) => {
                    log_warn!("orientation permission request failed: {err}");
                    return None;
                }
                Err(_) => {
                    log_warn!(
                        "orientation permission unanswered after {}ms",
                        self.timeouts.permission_ms
                    );
                    return None;
                }
            }
        }

        let bound = self.timeouts.orientation();
        match timeout(bound, provider.subscribe_once(bound)).await {
            Ok(sample) => sample,
            Err(_) => {
                log_debug!("no orientation sample within {}ms", self.timeouts.orientation_ms);
                None
            }
        }
    }

    async fn request_fix(&self) -> Option<GeoFix> {
        let provider = self.providers.geolocation.as_ref()?;
        let bound = self.timeouts.geolocation();

        match timeout(bound, provider.get_fix(PositionOptions::fresh_high_accuracy(bound))).await {
            Ok(Ok(fix)) => Some(fix),
            Ok(Err(err)) => {
                log_warn!("geolocation fix failed: {err}");
                None
            }
            Err(_) => {
                log_warn!("geolocation fix timed out after {}ms", self.timeouts.geolocation_ms);
                None
            }
        }
    }

    async fn count_cameras(&self) -> usize {
        let Some(provider) = self.providers.camera.as_ref() else {
            return 0;
        };

        match timeout(self.timeouts.enumeration(), provider.enumerate()).await {
            Ok(Ok(devices)) => devices.iter().filter(|d| d.is_video_input()).count(),
            Ok(Err(err)) => {
                log_warn!("device enumeration failed: {err}");
                0
            }
            Err(_) => {
                log_warn!("device enumeration timed out after {}ms", self.timeouts.enumeration_ms);
                0
            }
        }
    }
}
