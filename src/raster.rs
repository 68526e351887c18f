use crate::error::{ContentError, Result};

/// Decoded 8-bit RGB raster with an optional alpha channel.
///
/// Identity is the allocation: callers share images through `Arc` and the
/// document cache keys on that pointer, not on pixel contents.
#[derive(Debug)]
pub struct RasterImage {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl RasterImage {
    pub fn from_rgb8(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self> {
        let expected = pixel_count(width, height)? * 3;
        if rgb.len() != expected {
            return Err(ContentError::InvalidImage(format!(
                "{}x{} RGB image needs {} bytes, got {}",
                width,
                height,
                expected,
                rgb.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgb,
            alpha: None,
        })
    }

    /// Decodes PNG or JPEG bytes. Fully opaque images carry no alpha plane.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let decoded = image::load_from_memory(data)?;
        let rgba = decoded.to_rgba8();
        let (width, height) = rgba.dimensions();
        let count = pixel_count(width, height)?;
        let mut rgb = Vec::with_capacity(count * 3);
        let mut alpha = Vec::with_capacity(count);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            let [r, g, b, a] = pixel.0;
            if a != 255 {
                has_alpha = true;
            }
            rgb.extend_from_slice(&[r, g, b]);
            alpha.push(a);
        }
        Ok(Self {
            width,
            height,
            rgb,
            alpha: has_alpha.then_some(alpha),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgb(&self) -> &[u8] {
        &self.rgb
    }

    pub fn alpha(&self) -> Option<&[u8]> {
        self.alpha.as_deref()
    }
}

fn pixel_count(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|count| count.checked_mul(3).is_some())
        .ok_or_else(|| ContentError::InvalidImage(format!("{}x{} is too large", width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;

    fn encode_png(img: RgbaImage) -> Vec<u8> {
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).expect("png encode");
        out.into_inner()
    }

    #[test]
    fn rejects_short_pixel_buffer() {
        let err = RasterImage::from_rgb8(2, 2, vec![0; 11]).unwrap_err();
        assert!(matches!(err, ContentError::InvalidImage(_)));
        assert!(RasterImage::from_rgb8(2, 2, vec![0; 12]).is_ok());
    }

    #[test]
    fn decodes_opaque_png_without_alpha() {
        let png = encode_png(RgbaImage::from_pixel(3, 2, Rgba([10, 20, 30, 255])));
        let img = RasterImage::decode(&png).expect("decode");
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(&img.rgb()[..3], &[10, 20, 30]);
        assert!(img.alpha().is_none());
    }

    #[test]
    fn keeps_alpha_plane_when_translucent() {
        let mut src = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 255]));
        src.put_pixel(1, 0, Rgba([255, 0, 0, 128]));
        let img = RasterImage::decode(&encode_png(src)).expect("decode");
        assert_eq!(img.alpha(), Some(&[255u8, 128][..]));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = RasterImage::decode(b"definitely not an image").unwrap_err();
        assert!(matches!(err, ContentError::Image(_)));
    }
}
