//! Deterministic in-memory providers for tests.
//!
//! The camera fake counts hardware locks so tests can assert that no handle
//! leaks and that two locks are never held at once.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::{Rgb, RgbImage};

use super::{
    CameraProvider, CameraStream, DeviceKind, DeviceTraits, GeoFix, GeolocationProvider,
    MediaDeviceInfo, OrientationProvider, OrientationSample, PositionOptions, ProviderError,
    TrackSettings, VideoConstraints,
};

pub(crate) fn video_device(id: &str, label: &str) -> MediaDeviceInfo {
    MediaDeviceInfo {
        device_id: id.to_string(),
        kind: DeviceKind::VideoInput,
        label: label.to_string(),
    }
}

pub(crate) fn track(
    device_id: &str,
    facing: Option<&str>,
    width: u32,
    height: u32,
) -> TrackSettings {
    TrackSettings {
        device_id: Some(device_id.to_string()),
        facing_mode: facing.map(str::to_string),
        width: Some(width),
        height: Some(height),
    }
}

#[derive(Default)]
struct LockCounter {
    live: AtomicUsize,
    peak: AtomicUsize,
}

impl LockCounter {
    fn lock(&self) {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn unlock(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl std::fmt::Debug for LockCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockCounter")
            .field("live", &self.live.load(Ordering::SeqCst))
            .finish()
    }
}

#[derive(Debug)]
pub(crate) struct FakeStream {
    settings: TrackSettings,
    frame: Option<(u32, u32)>,
    locks: Arc<LockCounter>,
    released: bool,
}

impl FakeStream {
    /// Standalone stream not tied to any fake camera.
    pub(crate) fn detached(settings: TrackSettings, frame: Option<(u32, u32)>) -> Self {
        let locks = Arc::new(LockCounter::default());
        locks.lock();
        Self {
            settings,
            frame,
            locks,
            released: false,
        }
    }
}

impl CameraStream for FakeStream {
    fn settings(&self) -> TrackSettings {
        self.settings.clone()
    }

    fn grab_frame(&self) -> Option<RgbImage> {
        if self.released {
            return None;
        }
        let (width, height) = self.frame?;
        Some(RgbImage::from_pixel(width, height, Rgb([200, 200, 200])))
    }

    fn is_live(&self) -> bool {
        !self.released
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.locks.unlock();
        }
    }
}

enum Scripted {
    Settle(Result<TrackSettings, ProviderError>),
    Hang,
}

pub(crate) struct FakeCamera {
    devices: Result<Vec<MediaDeviceInfo>, ProviderError>,
    outcomes: Mutex<VecDeque<Scripted>>,
    yield_on_acquire: bool,
    attempts: Mutex<Vec<VideoConstraints>>,
    enumerations: AtomicUsize,
    locks: Arc<LockCounter>,
}

impl FakeCamera {
    pub(crate) fn new(devices: Vec<MediaDeviceInfo>) -> Self {
        Self::with_enumeration(Ok(devices))
    }

    pub(crate) fn with_enumeration(devices: Result<Vec<MediaDeviceInfo>, ProviderError>) -> Self {
        Self {
            devices,
            outcomes: Mutex::new(VecDeque::new()),
            yield_on_acquire: false,
            attempts: Mutex::new(Vec::new()),
            enumerations: AtomicUsize::new(0),
            locks: Arc::new(LockCounter::default()),
        }
    }

    /// Scripts the result of the next `acquire` call. Unscripted calls fail
    /// with `NotFound`.
    pub(crate) fn then(self, outcome: Result<TrackSettings, ProviderError>) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Scripted::Settle(outcome));
        self
    }

    /// The next `acquire` call never settles.
    pub(crate) fn then_hang(self) -> Self {
        self.outcomes.lock().unwrap().push_back(Scripted::Hang);
        self
    }

    /// Hands control back to the scheduler after every successful `acquire`,
    /// so concurrent callers interleave.
    pub(crate) fn yielding(mut self) -> Self {
        self.yield_on_acquire = true;
        self
    }

    pub(crate) fn attempts(&self) -> Vec<VideoConstraints> {
        self.attempts.lock().unwrap().clone()
    }

    pub(crate) fn enumerations(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }

    pub(crate) fn live_locks(&self) -> usize {
        self.locks.live.load(Ordering::SeqCst)
    }

    pub(crate) fn peak_locks(&self) -> usize {
        self.locks.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CameraProvider for FakeCamera {
    async fn enumerate(&self) -> Result<Vec<MediaDeviceInfo>, ProviderError> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        self.devices.clone()
    }

    async fn acquire(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn CameraStream>, ProviderError> {
        self.attempts.lock().unwrap().push(constraints.clone());
        let scripted = self.outcomes.lock().unwrap().pop_front();
        let settings = match scripted {
            Some(Scripted::Settle(outcome)) => outcome?,
            Some(Scripted::Hang) => std::future::pending().await,
            None => return Err(ProviderError::NotFound),
        };

        self.locks.lock();
        let frame = settings.width.zip(settings.height);
        let stream = Box::new(FakeStream {
            settings,
            frame,
            locks: Arc::clone(&self.locks),
            released: false,
        });
        if self.yield_on_acquire {
            tokio::task::yield_now().await;
        }
        Ok(stream)
    }
}

pub(crate) struct FakeOrientation {
    pub(crate) requires_permission: bool,
    pub(crate) grant: Result<bool, ProviderError>,
    /// `None` never fires an event, so the caller's bound must kick in.
    pub(crate) sample: Option<OrientationSample>,
}

impl FakeOrientation {
    pub(crate) fn firing(sample: OrientationSample) -> Self {
        Self {
            requires_permission: false,
            grant: Ok(true),
            sample: Some(sample),
        }
    }

    pub(crate) fn silent() -> Self {
        Self {
            requires_permission: false,
            grant: Ok(true),
            sample: None,
        }
    }
}

#[async_trait]
impl OrientationProvider for FakeOrientation {
    fn requires_permission(&self) -> bool {
        self.requires_permission
    }

    async fn request_permission(&self) -> Result<bool, ProviderError> {
        self.grant.clone()
    }

    async fn subscribe_once(&self, _timeout: Duration) -> Option<OrientationSample> {
        match self.sample {
            Some(sample) => Some(sample),
            None => std::future::pending().await,
        }
    }
}

pub(crate) struct FakeGeolocation {
    result: Option<Result<GeoFix, ProviderError>>,
    requests: Mutex<Vec<PositionOptions>>,
}

impl FakeGeolocation {
    pub(crate) fn fix(latitude: f64, longitude: f64, accuracy_m: f64) -> Self {
        Self::resolving(Ok(GeoFix {
            latitude,
            longitude,
            accuracy_m,
        }))
    }

    pub(crate) fn resolving(result: Result<GeoFix, ProviderError>) -> Self {
        Self {
            result: Some(result),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Never answers.
    pub(crate) fn hanging() -> Self {
        Self {
            result: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn requests(&self) -> Vec<PositionOptions> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl GeolocationProvider for FakeGeolocation {
    async fn get_fix(&self, options: PositionOptions) -> Result<GeoFix, ProviderError> {
        self.requests.lock().unwrap().push(options);
        match &self.result {
            Some(result) => result.clone(),
            None => std::future::pending().await,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeDevice {
    pub(crate) touch: Option<bool>,
    pub(crate) coarse: Option<bool>,
    pub(crate) vibration: Option<bool>,
    pub(crate) screen_orientation: Option<String>,
    pub(crate) connection: Option<String>,
}

impl FakeDevice {
    pub(crate) fn handheld() -> Self {
        Self {
            touch: Some(true),
            coarse: Some(true),
            vibration: Some(true),
            screen_orientation: Some("portrait-primary".into()),
            connection: Some("4g".into()),
        }
    }
}

impl DeviceTraits for FakeDevice {
    fn touch_capable(&self) -> Option<bool> {
        self.touch
    }

    fn coarse_pointer(&self) -> Option<bool> {
        self.coarse
    }

    fn vibration_supported(&self) -> Option<bool> {
        self.vibration
    }

    fn screen_orientation(&self) -> Option<String> {
        self.screen_orientation.clone()
    }

    fn connection_type(&self) -> Option<String> {
        self.connection.clone()
    }
}
