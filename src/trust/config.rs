use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Weights and threshold for the device trust score.
///
/// The values are policy, not derived; hosts may override them through
/// settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TrustPolicy {
    /// Active rear-facing (or portrait-framed) camera
    pub weight_camera: f64,
    pub weight_orientation: f64,
    /// Touch-capable and coarse pointer together
    pub weight_touch: f64,
    /// Geolocation fix within `geo_accuracy_limit_m`
    pub weight_geolocation: f64,
    /// At least `min_cameras` video inputs
    pub weight_multi_camera: f64,
    pub weight_vibration: f64,
    pub weight_portrait: f64,

    /// Fix accuracy must be strictly below this, in meters.
    pub geo_accuracy_limit_m: f64,
    pub min_cameras: usize,
    pub pass_threshold: f64,
}

impl Default for TrustPolicy {
    fn default() -> Self {
        Self {
            weight_camera: 2.0,
            weight_orientation: 1.0,
            weight_touch: 1.0,
            weight_geolocation: 1.0,
            weight_multi_camera: 1.0,
            weight_vibration: 0.5,
            weight_portrait: 0.5,
            geo_accuracy_limit_m: 70.0,
            min_cameras: 2,
            pass_threshold: 4.0,
        }
    }
}

/// Bounds for the scorer's waiting signals, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SignalTimeouts {
    pub orientation_ms: u64,
    pub geolocation_ms: u64,
    pub enumeration_ms: u64,
    /// How long an orientation permission prompt may stay unanswered.
    pub permission_ms: u64,
    /// Per constraint attempt, camera permission prompt included.
    pub acquire_ms: u64,
}

impl SignalTimeouts {
    pub fn orientation(&self) -> Duration {
        Duration::from_millis(self.orientation_ms)
    }

    pub fn geolocation(&self) -> Duration {
        Duration::from_millis(self.geolocation_ms)
    }

    pub fn enumeration(&self) -> Duration {
        Duration::from_millis(self.enumeration_ms)
    }

    pub fn permission(&self) -> Duration {
        Duration::from_millis(self.permission_ms)
    }

    pub fn acquire(&self) -> Duration {
        Duration::from_millis(self.acquire_ms)
    }
}

impl Default for SignalTimeouts {
    fn default() -> Self {
        Self {
            orientation_ms: 1200,
            geolocation_ms: 5000,
            enumeration_ms: 3000,
            permission_ms: 10_000,
            acquire_ms: 15_000,
        }
    }
}
