use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EvidenceRecord, Location};

/// Session values frozen at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub token: String,
    pub captured_at: DateTime<Utc>,
    pub location: Option<Location>,
    pub plate_hint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureArtifact {
    #[serde(skip)]
    pub jpeg: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub taken_at: DateTime<Utc>,
    /// Exactly the lines burned into the pixels, top to bottom.
    pub watermark_lines: Vec<String>,
    pub session: SessionSnapshot,
    pub evidence: EvidenceRecord,
}

impl CaptureArtifact {
    /// `laudo-<epoch-ms>.jpg`
    pub fn file_name(&self) -> String {
        format!("laudo-{}.jpg", self.taken_at.timestamp_millis())
    }
}
