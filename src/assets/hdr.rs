//! Equirectangular environment sources.

use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("failed to decode environment image {name}: {source}")]
    Image {
        name: String,
        #[source]
        source: image::ImageError,
    },
    #[error("environment image {name} is not 2:1 equirectangular ({width}x{height})")]
    NotEquirectangular { name: String, width: u32, height: u32 },
}

/// Linear RGB equirectangular image, row-major, top row = +Y pole.
#[derive(Debug, Clone)]
pub struct EquirectImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<[f32; 3]>,
}

impl EquirectImage {
    pub fn solid(width: u32, height: u32, color: [f32; 3]) -> Self {
        Self {
            width,
            height,
            pixels: vec![color; (width as usize) * (height as usize)],
        }
    }

    pub fn texel(&self, x: u32, y: u32) -> [f32; 3] {
        let x = x.min(self.width.saturating_sub(1));
        let y = y.min(self.height.saturating_sub(1));
        self.pixels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
            .unwrap_or([0.0; 3])
    }

    pub fn average(&self) -> [f32; 3] {
        if self.pixels.is_empty() {
            return [0.0; 3];
        }
        let mut sum = [0.0f64; 3];
        for p in &self.pixels {
            for c in 0..3 {
                sum[c] += p[c] as f64;
            }
        }
        let n = self.pixels.len() as f64;
        sum.map(|s| (s / n) as f32)
    }
}

/// Capability decoding an equirectangular HDR (or LDR) image.
pub trait EquirectLoader {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<EquirectImage, DecodeError>;
}

/// Decoder backed by the `image` crate; Radiance `.hdr` is detected by its signature.
#[derive(Debug, Default, Clone, Copy)]
pub struct RadianceLoader;

impl EquirectLoader for RadianceLoader {
    fn decode(&self, bytes: &[u8], name: &str) -> Result<EquirectImage, DecodeError> {
        let decoded = image::load_from_memory(bytes).map_err(|source| DecodeError::Image {
            name: name.to_string(),
            source,
        })?;
        let rgb = decoded.to_rgb32f();
        let (width, height) = rgb.dimensions();
        if width == 0 || height == 0 || width < height {
            return Err(DecodeError::NotEquirectangular {
                name: name.to_string(),
                width,
                height,
            });
        }
        let pixels = rgb.pixels().map(|p| p.0).collect();
        Ok(EquirectImage {
            width,
            height,
            pixels,
        })
    }
}

/// Content identity of an environment source.
pub fn content_digest(bytes: &[u8]) -> [u8; 32] {
    Sha256::digest(bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = image::RgbImage::from_pixel(width, height, image::Rgb([255, 128, 0]));
        let mut out = std::io::Cursor::new(Vec::new());
        image
            .write_to(&mut out, image::ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    #[test]
    fn decodes_ldr_equirect() {
        let image = RadianceLoader.decode(&png_bytes(8, 4), "sky.png").unwrap();
        assert_eq!((image.width, image.height), (8, 4));
        let avg = image.average();
        assert!((avg[0] - 1.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_portrait_images() {
        let result = RadianceLoader.decode(&png_bytes(4, 8), "tall.png");
        assert!(matches!(result, Err(DecodeError::NotEquirectangular { .. })));
    }

    #[test]
    fn rejects_garbage() {
        assert!(RadianceLoader.decode(b"nope", "x.hdr").is_err());
    }

    #[test]
    fn digest_tracks_content() {
        assert_eq!(content_digest(b"a"), content_digest(b"a"));
        assert_ne!(content_digest(b"a"), content_digest(b"b"));
    }
}
