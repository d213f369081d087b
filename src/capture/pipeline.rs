use anyhow::{Context, Result};
use chrono::{Local, Utc};
use image::RgbImage;
use tokio::time::Instant;

use crate::capture::encoder::{downscale, encode_jpeg};
use crate::capture::watermark::{apply_watermark, watermark_lines};
use crate::models::{CaptureArtifact, EvidenceRecord, SessionContext};
use crate::providers::CameraStream;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

struct Rendered {
    jpeg: Vec<u8>,
    width: u32,
    height: u32,
}

/// Freezes the current frame into a watermarked JPEG.
///
/// `None` means nothing was captured (no frame could be rasterized, or
/// encoding failed); the caller may simply try again.
pub async fn capture(
    stream: &dyn CameraStream,
    evidence: &EvidenceRecord,
    session: &SessionContext,
    max_width: u32,
    quality: f32,
) -> Option<CaptureArtifact> {
    let capture_start = Instant::now();

    let Some(frame) = stream.grab_frame() else {
        log_warn!("no frame available from stream; skipping capture");
        return None;
    };
    if frame.width() == 0 || frame.height() == 0 {
        log_warn!("stream reported an empty frame; skipping capture");
        return None;
    }
    let native = frame.dimensions();

    let taken_at = Utc::now();
    let snapshot = session.snapshot();
    let lines = watermark_lines(&taken_at.with_timezone(&Local), &snapshot);

    let render_start = Instant::now();
    let rendered = tokio::task::spawn_blocking({
        let lines = lines.clone();
        move || render(frame, &lines, max_width, quality)
    })
    .await
    .context("capture render worker join failed")
    .and_then(|result| result);
    let render_duration_ms = render_start.elapsed().as_millis();

    let rendered = match rendered {
        Ok(rendered) => rendered,
        Err(err) => {
            log_error!("capture for session {} failed: {err:?}", snapshot.token);
            return None;
        }
    };

    log_info!(
        "Captured {}x{} -> {}x{} ({} bytes, {} watermark lines) in {}ms (render: {}ms)",
        native.0,
        native.1,
        rendered.width,
        rendered.height,
        rendered.jpeg.len(),
        lines.len(),
        capture_start.elapsed().as_millis(),
        render_duration_ms
    );

    Some(CaptureArtifact {
        jpeg: rendered.jpeg,
        width: rendered.width,
        height: rendered.height,
        taken_at,
        watermark_lines: lines,
        session: snapshot,
        evidence: evidence.clone(),
    })
}

fn render(frame: RgbImage, lines: &[String], max_width: u32, quality: f32) -> Result<Rendered> {
    let mut bitmap = downscale(frame, max_width);
    apply_watermark(&mut bitmap, lines);
    let jpeg = encode_jpeg(&bitmap, quality)?;
    Ok(Rendered {
        jpeg,
        width: bitmap.width(),
        height: bitmap.height(),
    })
}

#[cfg(test)]
mod tests {
    use image::ImageFormat;

    use super::*;
    use crate::models::Location;
    use crate::providers::fake::{track, FakeStream};

    #[tokio::test]
    async fn produces_scaled_watermarked_jpeg() {
        let stream = FakeStream::detached(
            track("cam-back", Some("environment"), 3840, 2160),
            Some((3840, 2160)),
        );
        let mut session = SessionContext::with_token("K3Q9ZA", Some("ABC1D23".into()));
        session.record_location(Location {
            latitude: -23.5,
            longitude: -46.6,
            accuracy_m: 10.0,
        });

        let artifact = capture(&stream, &EvidenceRecord::default(), &session, 1920, 0.9)
            .await
            .unwrap();

        assert_eq!((artifact.width, artifact.height), (1920, 1080));
        assert_eq!(artifact.watermark_lines.len(), 4);
        assert_eq!(artifact.watermark_lines[3], "TOKEN: K3Q9ZA");
        assert_eq!(artifact.session.plate_hint.as_deref(), Some("ABC1D23"));
        assert!(artifact.file_name().starts_with("laudo-"));
        assert!(artifact.file_name().ends_with(".jpg"));

        let decoded =
            image::load_from_memory_with_format(&artifact.jpeg, ImageFormat::Jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (1920, 1080));
    }

    #[tokio::test]
    async fn bare_session_watermark_has_two_lines() {
        let stream = FakeStream::detached(track("cam-0", None, 640, 480), Some((640, 480)));
        let session = SessionContext::with_token("K3Q9ZA", None);

        let artifact = capture(&stream, &EvidenceRecord::default(), &session, 1920, 0.9)
            .await
            .unwrap();

        assert_eq!(artifact.watermark_lines.len(), 2);
        assert_eq!((artifact.width, artifact.height), (640, 480));
    }

    #[tokio::test]
    async fn missing_frame_skips_capture() {
        let stream = FakeStream::detached(track("cam-0", None, 640, 480), None);
        let session = SessionContext::with_token("K3Q9ZA", None);

        let artifact = capture(&stream, &EvidenceRecord::default(), &session, 1920, 0.9).await;
        assert!(artifact.is_none());
    }

    #[tokio::test]
    async fn zero_sized_frame_skips_capture() {
        let stream = FakeStream::detached(track("cam-0", None, 0, 0), Some((0, 0)));
        let session = SessionContext::with_token("K3Q9ZA", None);

        let artifact = capture(&stream, &EvidenceRecord::default(), &session, 1920, 0.9).await;
        assert!(artifact.is_none());
    }
}
