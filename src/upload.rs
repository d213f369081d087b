//! Hand-off of a finished capture to the external upload endpoint.

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::models::CaptureArtifact;
use crate::settings::UploadSettings;

/// Multipart payload: `file`, `token`, optional `lat`/`lng`, optional `plate`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadForm {
    pub file_name: String,
    pub jpeg: Vec<u8>,
    pub token: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub plate: Option<String>,
}

impl UploadForm {
    pub fn from_artifact(artifact: &CaptureArtifact) -> Self {
        let location = artifact.session.location;
        Self {
            file_name: artifact.file_name(),
            jpeg: artifact.jpeg.clone(),
            token: artifact.session.token.clone(),
            lat: location.map(|l| l.latitude),
            lng: location.map(|l| l.longitude),
            plate: artifact.session.plate_hint.clone(),
        }
    }

    /// Non-file fields in submission order; absent optionals are left out.
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("token", self.token.clone())];
        if let (Some(lat), Some(lng)) = (self.lat, self.lng) {
            fields.push(("lat", lat.to_string()));
            fields.push(("lng", lng.to_string()));
        }
        if let Some(plate) = &self.plate {
            fields.push(("plate", plate.clone()));
        }
        fields
    }
}

/// Destination for finished captures. Only success/failure is observed.
#[async_trait]
pub trait UploadSink: Send + Sync {
    async fn submit(&self, form: UploadForm) -> Result<()>;
}

/// Posts the form as `multipart/form-data`.
pub struct HttpUploadSink {
    client: reqwest::Client,
    url: String,
}

impl HttpUploadSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build upload http client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    /// Joins the configured endpoint path onto `base_url`.
    pub fn from_settings(base_url: &str, settings: &UploadSettings) -> Result<Self> {
        let url = endpoint_url(base_url, &settings.endpoint);
        Self::new(url, Duration::from_secs(settings.timeout_secs))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

fn endpoint_url(base_url: &str, endpoint: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        endpoint.trim_start_matches('/')
    )
}

#[async_trait]
impl UploadSink for HttpUploadSink {
    async fn submit(&self, form: UploadForm) -> Result<()> {
        let size = form.jpeg.len();
        let mut multipart = Form::new().part(
            "file",
            Part::bytes(form.jpeg.clone())
                .file_name(form.file_name.clone())
                .mime_str("image/jpeg")?,
        );
        for (name, value) in form.text_fields() {
            multipart = multipart.text(name, value);
        }

        let resp = self
            .client
            .post(&self.url)
            .multipart(multipart)
            .send()
            .await
            .with_context(|| format!("upload of {} to {} failed", form.file_name, self.url))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("upload rejected: {status} - {body}"));
        }

        log::info!("Uploaded {} ({} bytes)", form.file_name, size);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::models::{EvidenceRecord, Location, SessionSnapshot};

    fn artifact(location: Option<Location>, plate: Option<&str>) -> CaptureArtifact {
        CaptureArtifact {
            jpeg: vec![0xFF, 0xD8, 0xFF],
            width: 640,
            height: 480,
            taken_at: Utc.timestamp_millis_opt(1_700_000_000_123).unwrap(),
            watermark_lines: Vec::new(),
            session: SessionSnapshot {
                token: "K3Q9ZA".into(),
                captured_at: Utc::now(),
                location,
                plate_hint: plate.map(str::to_string),
            },
            evidence: EvidenceRecord::default(),
        }
    }

    #[test]
    fn file_is_named_after_capture_epoch_millis() {
        let form = UploadForm::from_artifact(&artifact(None, None));
        assert_eq!(form.file_name, "laudo-1700000000123.jpg");
        assert_eq!(form.jpeg, vec![0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn endpoint_is_joined_onto_base_url() {
        assert_eq!(
            endpoint_url("https://laudos.example.com/", "/api/laudos/upload-foto"),
            "https://laudos.example.com/api/laudos/upload-foto"
        );

        let sink =
            HttpUploadSink::from_settings("https://laudos.example.com", &UploadSettings::default())
                .unwrap();
        assert_eq!(sink.url(), "https://laudos.example.com/api/laudos/upload-foto");
    }

    #[test]
    fn bare_form_sends_only_token() {
        let form = UploadForm::from_artifact(&artifact(None, None));
        assert_eq!(form.text_fields(), vec![("token", "K3Q9ZA".to_string())]);
    }

    #[test]
    fn location_and_plate_are_included_when_known() {
        let location = Location {
            latitude: -23.5,
            longitude: -46.25,
            accuracy_m: 5.0,
        };
        let form = UploadForm::from_artifact(&artifact(Some(location), Some("ABC1D23")));

        assert_eq!(
            form.text_fields(),
            vec![
                ("token", "K3Q9ZA".to_string()),
                ("lat", "-23.5".to_string()),
                ("lng", "-46.25".to_string()),
                ("plate", "ABC1D23".to_string()),
            ]
        );
    }
}
