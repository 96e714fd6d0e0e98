//! Adapts the `image` crate's `RgbaImage` to [`ImageSampler`], behind the
//! `image_compat` feature, so a caller can hand this crate a decoded PNG/JPEG
//! directly instead of writing its own sampler.

use crate::geometry::Vec4;

use super::ImageSampler;

/// An `image::RgbaImage` wrapped as an [`ImageSampler`]. Colors are decoded
/// straight-alpha `u8` channels, mapped to `[0, 1]`.
pub struct RgbaImageSampler {
    image: image::RgbaImage,
    /// Set when the caller knows every pixel's alpha channel is `255`
    /// (e.g. a JPEG source, which has no alpha at all) — lets callers skip
    /// the non-opaque normalization path in the filter integrator.
    opaque: bool,
}

impl RgbaImageSampler {
    pub fn new(image: image::RgbaImage) -> Self {
        RgbaImageSampler { image, opaque: false }
    }

    /// Marks every texel as carrying full alpha, regardless of what's
    /// actually stored in the image's alpha channel.
    pub fn assume_opaque(mut self) -> Self {
        self.opaque = true;
        self
    }
}

impl ImageSampler for RgbaImageSampler {
    fn width(&self) -> u32 {
        self.image.width()
    }

    fn height(&self) -> u32 {
        self.image.height()
    }

    fn texel(&self, x: i64, y: i64) -> Vec4 {
        if x < 0 || y < 0 || x as u32 >= self.image.width() || y as u32 >= self.image.height() {
            return Vec4::zeros();
        }
        let px = self.image.get_pixel(x as u32, y as u32);
        Vec4::new(px[0] as f64 / 255.0, px[1] as f64 / 255.0, px[2] as f64 / 255.0, px[3] as f64 / 255.0)
    }

    fn is_opaque(&self) -> bool {
        self.opaque
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{extend_integer, ExtendMode};

    #[test]
    fn solid_color_image_samples_back_its_own_color() {
        let mut img = image::RgbaImage::new(4, 4);
        for px in img.pixels_mut() {
            *px = image::Rgba([51, 102, 153, 255]);
        }
        let sampler = RgbaImageSampler::new(img).assume_opaque();
        assert!(sampler.is_opaque());
        let c = sampler.texel(1, 1);
        assert!((c - Vec4::new(0.2, 0.4, 0.6, 1.0)).norm() < 1e-2);
        assert_eq!(extend_integer(5, sampler.width(), ExtendMode::Pad), 3);
    }
}
