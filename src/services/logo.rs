//! Logo normalization: optionally puts an uploaded logo on a solid rounded
//! backing plate so it stays legible on top of the code.
//!
//! Processing is cosmetic and best-effort. Any decode or encode failure hands
//! back the original image untouched.

use crate::models::HexColor;
use image::{DynamicImage, Rgba, RgbaImage};
use std::fmt;
use std::future::Future;
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Padding around the logo, as a fraction of its larger dimension
pub const PADDING_RATIO: f32 = 0.1;

/// Plate corner radius, as a fraction of the smaller canvas dimension
pub const CORNER_RATIO: f32 = 0.15;

/// Encoded logo image bytes, cheap to clone.
#[derive(Clone, PartialEq, Eq)]
pub struct LogoImage(Arc<[u8]>);

impl LogoImage {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self(Arc::from(bytes.into()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether both handles share one buffer.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl From<Vec<u8>> for LogoImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for LogoImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogoImage({} bytes)", self.0.len())
    }
}

/// Produce the image to embed.
///
/// With no logo, or with a transparent plate, the input is returned as-is and
/// nothing is decoded. Otherwise the logo is composited onto a padded rounded
/// plate of `plate` color and re-encoded as PNG on the blocking pool.
pub async fn process(
    raw: Option<LogoImage>,
    plate: &HexColor,
    transparent: bool,
) -> Option<LogoImage> {
    let raw = raw?;
    if transparent {
        return Some(raw);
    }

    let source = raw.clone();
    let color = plate.rgb();

    match tokio::task::spawn_blocking(move || compose_plate(source.as_bytes(), color)).await {
        Ok(Ok(composed)) => Some(composed),
        Ok(Err(e)) => {
            tracing::warn!("Logo processing failed, using original image: {}", e);
            Some(raw)
        }
        Err(e) => {
            tracing::warn!("Logo processing task failed, using original image: {}", e);
            Some(raw)
        }
    }
}

/// Composite `bytes` onto a rounded plate of `color`. Synchronous core of [`process`].
pub fn compose_plate(bytes: &[u8], color: [u8; 3]) -> Result<LogoImage, image::ImageError> {
    let source = image::load_from_memory(bytes)?.to_rgba8();
    let (width, height) = source.dimensions();

    let pad = (width.max(height) as f32 * PADDING_RATIO).floor() as u32;
    let canvas_width = width + pad * 2;
    let canvas_height = height + pad * 2;
    let radius = canvas_width.min(canvas_height) as f32 * CORNER_RATIO;

    let fill = Rgba([color[0], color[1], color[2], 255]);
    let clear = Rgba([0, 0, 0, 0]);
    let mut canvas = RgbaImage::from_fn(canvas_width, canvas_height, |x, y| {
        if in_rounded_rect(x, y, canvas_width, canvas_height, radius) {
            fill
        } else {
            clear
        }
    });

    image::imageops::overlay(&mut canvas, &source, i64::from(pad), i64::from(pad));

    let mut encoded = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(canvas).write_to(&mut encoded, image::ImageFormat::Png)?;

    tracing::debug!(
        "Composed logo plate: {}x{} -> {}x{}",
        width,
        height,
        canvas_width,
        canvas_height
    );

    Ok(LogoImage::from(encoded.into_inner()))
}

// Pixel-center test against a rectangle with circular corners of `radius`.
fn in_rounded_rect(x: u32, y: u32, width: u32, height: u32, radius: f32) -> bool {
    let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
    let (w, h) = (width as f32, height as f32);

    let nearest_x = px.clamp(radius, w - radius);
    let nearest_y = py.clamp(radius, h - radius);
    let (dx, dy) = (px - nearest_x, py - nearest_y);

    dx * dx + dy * dy <= radius * radius
}

/// Result of a [`LogoTicketer::process_latest`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOutcome {
    /// No newer request was issued; apply this result
    Current(Option<LogoImage>),
    /// Superseded by a later request; discard
    Stale,
}

/// Issues staleness tickets so only the last-issued logo job is applied when
/// plate settings change faster than images decode.
#[derive(Debug, Clone, Default)]
pub struct LogoTicketer {
    latest: Arc<AtomicU64>,
}

/// Token identifying one issued logo job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogoTicket(u64);

impl LogoTicketer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self) -> LogoTicket {
        LogoTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: LogoTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Issue a ticket now and process in the returned future.
    ///
    /// The ticket is taken before the future is first polled, so call order
    /// decides which result wins.
    pub fn process_latest(
        &self,
        raw: Option<LogoImage>,
        plate: HexColor,
        transparent: bool,
    ) -> impl Future<Output = LogoOutcome> + Send + 'static {
        let ticket = self.issue();
        let ticketer = self.clone();

        async move {
            let processed = process(raw, &plate, transparent).await;
            if ticketer.is_current(ticket) {
                LogoOutcome::Current(processed)
            } else {
                tracing::debug!("Discarding stale logo result");
                LogoOutcome::Stale
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32, pixel: [u8; 4]) -> LogoImage {
        let img = RgbaImage::from_pixel(width, height, Rgba(pixel));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        LogoImage::from(out.into_inner())
    }

    fn plate() -> HexColor {
        HexColor::parse("#ff0000").unwrap()
    }

    #[test]
    fn test_transparent_plate_is_identity() {
        let logo = png(10, 10, [0, 0, 255, 255]);

        let result = tokio_test::block_on(process(Some(logo.clone()), &plate(), true)).unwrap();

        assert!(result.ptr_eq(&logo));
    }

    #[test]
    fn test_missing_logo_stays_missing() {
        assert!(tokio_test::block_on(process(None, &plate(), false)).is_none());
    }

    #[test]
    fn test_compose_pads_and_fills_plate() {
        let logo = png(10, 20, [0, 0, 255, 255]);

        let composed = compose_plate(logo.as_bytes(), [255, 0, 0]).unwrap();
        let decoded = image::load_from_memory(composed.as_bytes()).unwrap().to_rgba8();

        // pad = floor(20 * 0.1) = 2 on every side
        assert_eq!(decoded.dimensions(), (14, 24));
        // rounded corner stays clear
        assert_eq!(decoded.get_pixel(0, 0)[3], 0);
        // padding band carries the plate color
        assert_eq!(*decoded.get_pixel(1, 12), Rgba([255, 0, 0, 255]));
        // logo drawn at the padding offset
        assert_eq!(*decoded.get_pixel(2, 2), Rgba([0, 0, 255, 255]));
    }

    #[test]
    fn test_undecodable_logo_falls_back() {
        let garbage = LogoImage::from_bytes(b"not an image".to_vec());

        let result = tokio_test::block_on(process(Some(garbage.clone()), &plate(), false)).unwrap();

        assert!(result.ptr_eq(&garbage));
    }

    #[tokio::test]
    async fn test_only_latest_result_applies() {
        let ticketer = LogoTicketer::new();
        let logo = png(4, 4, [0, 0, 0, 255]);

        let first = ticketer.process_latest(Some(logo.clone()), plate(), false);
        let second = ticketer.process_latest(Some(logo), plate(), true);

        assert_eq!(first.await, LogoOutcome::Stale);
        assert!(matches!(second.await, LogoOutcome::Current(Some(_))));
    }
}
