//! Output of one trust-scoring pass.
//!
//! A record is built whole by a single pass and never patched afterwards;
//! the next pass replaces it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::providers::{OrientationSample, FACING_ENVIRONMENT};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceRecord {
    pub camera_active: bool,
    pub facing_mode: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub orientation_ok: bool,
    pub orientation_sample: Option<OrientationSample>,
    pub touch: bool,
    pub coarse_pointer: bool,
    pub geo_ok: bool,
    pub geo_accuracy_m: Option<f64>,
    pub cameras_count: usize,
    pub vibration: bool,
    pub screen_orientation: Option<String>,
    pub connection_type: Option<String>,
}

impl EvidenceRecord {
    /// Active camera that is rear-facing, or whose frame is at least as tall
    /// as it is wide (phones held upright).
    pub fn rear_or_portrait_camera(&self) -> bool {
        if !self.camera_active {
            return false;
        }
        if self.facing_mode.as_deref() == Some(FACING_ENVIRONMENT) {
            return true;
        }
        matches!((self.width, self.height), (Some(w), Some(h)) if h >= w)
    }

    pub fn portrait_screen(&self) -> bool {
        self.screen_orientation
            .as_deref()
            .is_some_and(|descriptor| descriptor.contains("portrait"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustVerdict {
    pub score: f64,
    pub pass: bool,
}

/// Verdict plus the evidence it was derived from, annotated with the session
/// token it was produced for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustReport {
    pub verdict: TrustVerdict,
    pub evidence: EvidenceRecord,
    pub token: String,
    pub evaluated_at: DateTime<Utc>,
}

impl TrustReport {
    pub fn passed(&self) -> bool {
        self.verdict.pass
    }
}
