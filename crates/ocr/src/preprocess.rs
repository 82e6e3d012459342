use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to decode page image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Failed to encode processed page: {0}")]
    Encode(String),
}

/// Pages narrower than this are upscaled; statement text rendered below
/// roughly 150 DPI loses the decimal point in amounts.
const MIN_PAGE_WIDTH: u32 = 1200;
/// Pages larger than this on either side are downscaled (~300 DPI A4).
const MAX_PAGE_SIDE: u32 = 3600;

/// Decode a rasterized statement page (PNG / JPEG / …), normalize it, and
/// return PNG bytes ready for the recognizer.
pub fn prepare_page(data: &[u8]) -> Result<Vec<u8>, PreprocessError> {
    let img = image::load_from_memory(data)?;
    encode_as_png(normalize(img))
}

/// Rescale into the recognizer's sweet spot, then grayscale + contrast stretch.
fn normalize(img: DynamicImage) -> DynamicImage {
    let img = rescale(img);
    let gray: GrayImage = img.to_luma8();

    let (min_px, max_px) = gray
        .pixels()
        .fold((255u8, 0u8), |(mn, mx), p| (mn.min(p[0]), mx.max(p[0])));

    if max_px == min_px {
        return DynamicImage::ImageLuma8(gray);
    }

    let range = u32::from(max_px - min_px);
    let stretched: GrayImage = ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let p = gray.get_pixel(x, y)[0];
        let v = (u32::from(p - min_px) * 255 / range) as u8;
        Luma([v])
    });

    DynamicImage::ImageLuma8(stretched)
}

fn rescale(img: DynamicImage) -> DynamicImage {
    let (w, h) = (img.width(), img.height());
    if w == 0 || h == 0 {
        return img;
    }
    if w > MAX_PAGE_SIDE || h > MAX_PAGE_SIDE {
        return img.resize(MAX_PAGE_SIDE, MAX_PAGE_SIDE, image::imageops::FilterType::Lanczos3);
    }
    if w < MIN_PAGE_WIDTH {
        // Integer factor keeps glyph strokes crisp.
        let factor = MIN_PAGE_WIDTH.div_ceil(w).min(4);
        if factor > 1 {
            return img.resize_exact(
                w * factor,
                h * factor,
                image::imageops::FilterType::CatmullRom,
            );
        }
    }
    img
}

fn encode_as_png(img: DynamicImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| PreprocessError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gray(width: u32, height: u32, f: impl Fn(u32, u32) -> u8) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(width, height, |x, y| Luma([f(x, y)]));
        DynamicImage::ImageLuma8(img)
    }

    fn png(img: &DynamicImage) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn uniform_page_does_not_panic() {
        let result = normalize(gray(1500, 10, |_, _| 128));
        assert_eq!(result.width(), 1500);
    }

    #[test]
    fn contrast_is_stretched_to_full_range() {
        let result = normalize(gray(1500, 1, |x, _| 60 + (x % 100) as u8));
        let g = result.to_luma8();
        assert_eq!(g.pixels().map(|p| p[0]).min().unwrap(), 0);
        assert_eq!(g.pixels().map(|p| p[0]).max().unwrap(), 255);
    }

    #[test]
    fn narrow_page_is_upscaled_by_integer_factor() {
        let result = normalize(gray(400, 100, |_, _| 200));
        assert_eq!(result.width(), 1200);
        assert_eq!(result.height(), 300);
    }

    #[test]
    fn huge_page_is_downscaled() {
        let result = normalize(gray(4000, 100, |_, _| 200));
        assert!(result.width() <= MAX_PAGE_SIDE);
    }

    #[test]
    fn prepare_page_emits_png() {
        let out = prepare_page(&png(&gray(4, 4, |_, _| 100))).unwrap();
        assert_eq!(&out[..4], b"\x89PNG");
    }

    #[test]
    fn prepare_page_rejects_non_image_bytes() {
        assert!(matches!(
            prepare_page(b"definitely not an image"),
            Err(PreprocessError::Decode(_))
        ));
    }
}
