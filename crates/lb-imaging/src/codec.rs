//! Codec adapter: decode, normalize, resize, and encode raster images.
//!
//! The [`Codec`] trait is synchronous on purpose; every call is CPU-bound and
//! is expected to run on the [`WorkerPool`](crate::WorkerPool), never on a
//! request flow.

use std::io::Cursor;

use image::imageops::FilterType;
use image::DynamicImage;
use lb_core::{Error, ImageFormat, Result};

/// A decoded raster image.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    inner: DynamicImage,
}

impl DecodedImage {
    pub fn new(inner: DynamicImage) -> Self {
        Self { inner }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }
}

/// Opaque image codec capability.
pub trait Codec: Send + Sync {
    /// Decode raw bytes; fails with [`Error::Decode`] if they are not an image.
    fn decode(&self, data: &[u8]) -> Result<DecodedImage>;

    /// Convert to the canonical color mode.
    fn normalize(&self, image: DecodedImage) -> DecodedImage;

    /// Resize to exactly `width`x`height`.
    fn resize(&self, image: &DecodedImage, width: u32, height: u32) -> DecodedImage;

    /// Encode to `format`.
    fn encode(&self, image: &DecodedImage, format: ImageFormat) -> Result<Vec<u8>>;
}

/// [`Codec`] backed by the `image` crate. The canonical color mode is 8-bit RGB.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Codec for RasterCodec {
    fn decode(&self, data: &[u8]) -> Result<DecodedImage> {
        image::load_from_memory(data)
            .map(DecodedImage::new)
            .map_err(Error::decode)
    }

    fn normalize(&self, image: DecodedImage) -> DecodedImage {
        match image.inner {
            rgb @ DynamicImage::ImageRgb8(_) => DecodedImage::new(rgb),
            other => DecodedImage::new(DynamicImage::ImageRgb8(other.to_rgb8())),
        }
    }

    fn resize(&self, image: &DecodedImage, width: u32, height: u32) -> DecodedImage {
        DecodedImage::new(image.inner.resize_exact(width, height, FilterType::Lanczos3))
    }

    fn encode(&self, image: &DecodedImage, format: ImageFormat) -> Result<Vec<u8>> {
        let target = match format {
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Webp => image::ImageFormat::WebP,
        };

        let mut buf = Cursor::new(Vec::new());
        image
            .inner
            .write_to(&mut buf, target)
            .map_err(|e| Error::Encode(format!("failed to encode {format}: {e}")))?;
        Ok(buf.into_inner())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Encode a solid RGBA PNG of the given size.
    pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 40, 40, 255]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn decode_reports_dimensions() {
        let decoded = RasterCodec.decode(&png_bytes(40, 20)).unwrap();
        assert_eq!(decoded.dimensions(), (40, 20));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = RasterCodec.decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[test]
    fn normalize_drops_alpha() {
        let decoded = RasterCodec.decode(&png_bytes(4, 4)).unwrap();
        assert!(decoded.as_dynamic().color().has_alpha());

        let normalized = RasterCodec.normalize(decoded);
        assert!(matches!(normalized.as_dynamic(), DynamicImage::ImageRgb8(_)));
        assert_eq!(normalized.dimensions(), (4, 4));
    }

    #[test]
    fn encode_jpeg_round_trips_dimensions() {
        let codec = RasterCodec;
        let normalized = codec.normalize(codec.decode(&png_bytes(30, 10)).unwrap());
        let jpeg = codec.encode(&normalized, ImageFormat::Jpeg).unwrap();

        assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));
        assert_eq!(codec.decode(&jpeg).unwrap().dimensions(), (30, 10));
    }

    #[test]
    fn resize_hits_exact_target() {
        let codec = RasterCodec;
        let decoded = codec.decode(&png_bytes(462, 300)).unwrap();
        let resized = codec.resize(&decoded, 231, 150);
        assert_eq!(resized.dimensions(), (231, 150));
    }
}
