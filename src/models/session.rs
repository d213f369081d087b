use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::SessionSnapshot;
use crate::providers::GeoFix;

pub const TOKEN_LEN: usize = 6;

const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Six upper-case base-36 characters, e.g. `K3Q9ZA`.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_m: f64,
}

impl From<GeoFix> for Location {
    fn from(fix: GeoFix) -> Self {
        Self {
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy_m: fix.accuracy_m,
        }
    }
}

/// Ephemeral per-session values shared by the scorer and the capture
/// pipeline. `token` and `plate_hint` never change after construction.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    token: String,
    captured_at: DateTime<Utc>,
    location: Option<Location>,
    plate_hint: Option<String>,
}

impl SessionContext {
    pub fn new(plate_hint: Option<String>) -> Self {
        Self::with_token(generate_token(), plate_hint)
    }

    pub fn with_token(token: impl Into<String>, plate_hint: Option<String>) -> Self {
        Self {
            token: token.into(),
            captured_at: Utc::now(),
            location: None,
            plate_hint: plate_hint
                .map(|hint| hint.trim().to_string())
                .filter(|hint| !hint.is_empty()),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn location(&self) -> Option<Location> {
        self.location
    }

    pub fn plate_hint(&self) -> Option<&str> {
        self.plate_hint.as_deref()
    }

    /// Called whenever a stream is put on display.
    pub fn mark_displayed(&mut self, at: DateTime<Utc>) {
        self.captured_at = at;
    }

    /// Last value wins; no history is kept.
    pub fn record_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            token: self.token.clone(),
            captured_at: self.captured_at,
            location: self.location,
            plate_hint: self.plate_hint.clone(),
        }
    }
}
