use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const FACING_ENVIRONMENT: &str = "environment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    VideoInput,
    AudioInput,
    AudioOutput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaDeviceInfo {
    pub device_id: String,
    pub kind: DeviceKind,
    /// Empty until the runtime has been granted camera access.
    pub label: String,
}

impl MediaDeviceInfo {
    pub fn is_video_input(&self) -> bool {
        self.kind == DeviceKind::VideoInput
    }

    /// True when the label names a rear-facing camera ("back", "rear", "environment").
    pub fn looks_rear_facing(&self) -> bool {
        let label = self.label.to_lowercase();
        ["back", "rear", "environment"]
            .iter()
            .any(|needle| label.contains(needle))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl FacingMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::User => "user",
            FacingMode::Environment => FACING_ENVIRONMENT,
        }
    }
}

/// A soft (`Ideal`) or hard (`Exact`) constraint value. Runtimes may ignore
/// ideal hints entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintValue<T> {
    Ideal(T),
    Exact(T),
}

impl<T: fmt::Display> fmt::Display for ConstraintValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstraintValue::Ideal(value) => write!(f, "ideal {value}"),
            ConstraintValue::Exact(value) => write!(f, "exact {value}"),
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Video-only acquisition request. Audio is never requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub facing_mode: Option<ConstraintValue<FacingMode>>,
    pub width: Option<ConstraintValue<u32>>,
    pub height: Option<ConstraintValue<u32>>,
    pub device_id: Option<ConstraintValue<String>>,
}

impl VideoConstraints {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn facing(mode: ConstraintValue<FacingMode>) -> Self {
        Self {
            facing_mode: Some(mode),
            ..Self::default()
        }
    }

    pub fn with_resolution(
        mut self,
        width: ConstraintValue<u32>,
        height: ConstraintValue<u32>,
    ) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn pinned_to(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(ConstraintValue::Exact(device_id.into())),
            ..Self::default()
        }
    }
}

impl fmt::Display for VideoConstraints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(facing) = &self.facing_mode {
            parts.push(format!("facingMode {facing}"));
        }
        if let Some(width) = &self.width {
            parts.push(format!("width {width}"));
        }
        if let Some(height) = &self.height {
            parts.push(format!("height {height}"));
        }
        if let Some(device_id) = &self.device_id {
            parts.push(format!("deviceId {device_id}"));
        }
        if parts.is_empty() {
            f.write_str("video: any")
        } else {
            write!(f, "video: {}", parts.join(", "))
        }
    }
}

/// Settings a live track reports about itself. Every field is optional
/// because runtimes report inconsistently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSettings {
    pub device_id: Option<String>,
    pub facing_mode: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TrackSettings {
    pub fn is_environment_facing(&self) -> bool {
        self.facing_mode.as_deref() == Some(FACING_ENVIRONMENT)
    }
}

/// One device-orientation event. Desktop runtimes often fire events with all
/// three axes null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OrientationSample {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
}

impl OrientationSample {
    pub fn has_reading(&self) -> bool {
        self.alpha.is_some() || self.beta.is_some() || self.gamma.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Zero disables reuse of a cached fix.
    pub maximum_age: Duration,
}

impl PositionOptions {
    pub fn fresh_high_accuracy(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
}
