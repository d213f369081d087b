//! Watermark text and the semi-opaque band it is drawn on.
//!
//! Proportions follow a 24px bold face: 28px per line, 20px of band padding,
//! text 16px from the left edge and the last baseline 12px above the bottom.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{Rgb, RgbImage};

use crate::models::SessionSnapshot;

pub const HEADER_LABEL: &str = "LAUDO";
pub const LINE_HEIGHT: u32 = 28;
pub const BAND_PADDING: u32 = 20;
pub const TEXT_LEFT: u32 = 16;
pub const BASELINE_INSET: u32 = 12;
pub const BAND_OPACITY: f32 = 0.55;

const GLYPH_CELLS: u32 = 8;
const GLYPH_SCALE: u32 = 3;
const TEXT_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// `DD/MM/YYYY HH:MM:SS` in the timestamp's own zone.
pub fn format_timestamp<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    at.format("%d/%m/%Y %H:%M:%S").to_string()
}

/// Lines top to bottom: header, plate (if any), GPS (if any), token.
pub fn watermark_lines<Tz>(taken_at: &DateTime<Tz>, session: &SessionSnapshot) -> Vec<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut lines = vec![format!("{HEADER_LABEL} • {}", format_timestamp(taken_at))];

    if let Some(plate) = session.plate_hint.as_deref().filter(|p| !p.trim().is_empty()) {
        lines.push(format!("PLACA: {plate}"));
    }
    if let Some(location) = session.location {
        lines.push(format!(
            "GPS: {:.5}, {:.5}",
            location.latitude, location.longitude
        ));
    }
    lines.push(format!("TOKEN: {}", session.token));

    lines
}

pub fn band_height(line_count: usize) -> u32 {
    LINE_HEIGHT * line_count as u32 + BAND_PADDING
}

/// Darkens a bottom band sized to `lines` and writes them bottom-up, the
/// last line sitting on the lowest baseline.
pub fn apply_watermark(image: &mut RgbImage, lines: &[String]) {
    let (width, height) = image.dimensions();
    let band_top = height.saturating_sub(band_height(lines.len()));

    for y in band_top..height {
        for x in 0..width {
            let pixel = image.get_pixel_mut(x, y);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 * (1.0 - BAND_OPACITY)).round() as u8;
            }
        }
    }

    let glyph_height = (GLYPH_CELLS * GLYPH_SCALE) as i64;
    let mut baseline = height as i64 - BASELINE_INSET as i64;
    for line in lines.iter().rev() {
        draw_text(image, line, TEXT_LEFT as i64, baseline - glyph_height);
        baseline -= LINE_HEIGHT as i64;
    }
}

fn draw_text(image: &mut RgbImage, text: &str, left: i64, top: i64) {
    let advance = (GLYPH_CELLS * GLYPH_SCALE) as i64;
    for (index, ch) in text.chars().enumerate() {
        draw_glyph(image, glyph(ch), left + index as i64 * advance, top);
    }
}

fn draw_glyph(image: &mut RgbImage, rows: [u8; 8], left: i64, top: i64) {
    let (width, height) = image.dimensions();
    let scale = GLYPH_SCALE as i64;

    for (row, bits) in rows.iter().enumerate() {
        for col in 0..GLYPH_CELLS as i64 {
            if bits & (1 << col) == 0 {
                continue;
            }
            for dy in 0..scale {
                for dx in 0..scale {
                    let x = left + col * scale + dx;
                    let y = top + row as i64 * scale + dy;
                    if x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height {
                        image.put_pixel(x as u32, y as u32, TEXT_COLOR);
                    }
                }
            }
        }
    }
}

/// Unknown characters render as blank cells. The bullet has no 8x8 glyph and
/// is drawn as a middle dot.
fn glyph(ch: char) -> [u8; 8] {
    let ch = if ch == '•' { '·' } else { ch };
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .unwrap_or([0; 8])
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};

    use super::*;
    use crate::models::Location;

    fn snapshot(plate: Option<&str>, location: Option<Location>) -> SessionSnapshot {
        SessionSnapshot {
            token: "K3Q9ZA".into(),
            captured_at: Utc::now(),
            location,
            plate_hint: plate.map(str::to_string),
        }
    }

    fn taken_at() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 7, 9, 5, 2)
            .unwrap()
    }

    #[test]
    fn timestamp_is_day_first_with_seconds() {
        assert_eq!(format_timestamp(&taken_at()), "07/03/2024 09:05:02");
    }

    #[test]
    fn bare_session_renders_header_and_token() {
        let lines = watermark_lines(&taken_at(), &snapshot(None, None));
        assert_eq!(
            lines,
            vec![
                "LAUDO • 07/03/2024 09:05:02".to_string(),
                "TOKEN: K3Q9ZA".to_string(),
            ]
        );
        assert_eq!(band_height(lines.len()), 76);
    }

    #[test]
    fn plate_and_location_add_two_lines_in_order() {
        let location = Location {
            latitude: -23.550519,
            longitude: -46.633309,
            accuracy_m: 8.0,
        };
        let lines = watermark_lines(&taken_at(), &snapshot(Some("ABC1D23"), Some(location)));

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("LAUDO • "));
        assert_eq!(lines[1], "PLACA: ABC1D23");
        assert_eq!(lines[2], "GPS: -23.55052, -46.63331");
        assert_eq!(lines[3], "TOKEN: K3Q9ZA");
        assert_eq!(band_height(lines.len()), 132);
    }

    #[test]
    fn blank_plate_is_omitted() {
        let lines = watermark_lines(&taken_at(), &snapshot(Some("  "), None));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn band_darkens_only_the_bottom() {
        let mut image = RgbImage::from_pixel(320, 200, Rgb([200, 200, 200]));
        let lines = vec!["TOKEN: K3Q9ZA".to_string()];
        apply_watermark(&mut image, &lines);

        let band_top = 200 - band_height(1);
        assert_eq!(image.get_pixel(300, band_top - 1), &Rgb([200, 200, 200]));
        assert_eq!(image.get_pixel(300, band_top), &Rgb([90, 90, 90]));
        assert_eq!(image.get_pixel(300, 199), &Rgb([90, 90, 90]));
    }

    #[test]
    fn text_is_burned_in_white_inside_the_band() {
        let mut image = RgbImage::from_pixel(320, 200, Rgb([0, 0, 0]));
        apply_watermark(&mut image, &["TOKEN: K3Q9ZA".to_string()]);

        let band_top = 200 - band_height(1);
        let white = image
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == TEXT_COLOR)
            .collect::<Vec<_>>();
        assert!(!white.is_empty());
        assert!(white.iter().all(|(x, y, _)| *y >= band_top && *x >= TEXT_LEFT));
    }

    #[test]
    fn band_taller_than_image_is_clamped() {
        let mut image = RgbImage::from_pixel(40, 30, Rgb([100, 100, 100]));
        let lines = vec!["A".to_string(), "B".to_string(), "C".to_string()];
        apply_watermark(&mut image, &lines);
        assert_eq!(image.get_pixel(0, 0), &Rgb([45, 45, 45]));
    }
}
