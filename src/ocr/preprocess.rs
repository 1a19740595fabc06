//! Binarization applied before text recognition

use image::{DynamicImage, GrayImage, Luma};

/// Contrast gain applied around the mean luminance
pub const CONTRAST_FACTOR: f32 = 2.0;

/// Pixels brighter than this become white, everything else black
pub const THRESHOLD: u8 = 128;

/// Grayscale, boost contrast, then binarize
///
/// Dimensions are preserved.
pub fn preprocess_for_ocr(image: &DynamicImage) -> GrayImage {
    let gray = image.to_luma8();
    let enhanced = enhance_contrast(&gray, CONTRAST_FACTOR);
    binarize(&enhanced, THRESHOLD)
}

/// Blend every pixel away from the image's mean luminance by `factor`
///
/// `out = mean + factor * (p - mean)`, clamped to 0..=255. A factor of 1.0 is
/// the identity, 0.0 yields a flat gray image.
pub fn enhance_contrast(gray: &GrayImage, factor: f32) -> GrayImage {
    let pixels = gray.as_raw();
    if pixels.is_empty() {
        return gray.clone();
    }

    let sum: u64 = pixels.iter().map(|&p| p as u64).sum();
    let mean = (sum as f64 / pixels.len() as f64 + 0.5).floor() as f32;

    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        let value = mean + factor * (pixel[0] as f32 - mean);
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }
    out
}

/// Two-level image: `p > threshold` → 255, otherwise 0
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        pixel[0] = if pixel[0] > threshold { 255 } else { 0 };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_contrast_spreads_around_mean() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, Luma([100]));
        gray.put_pixel(1, 0, Luma([140]));

        let out = enhance_contrast(&gray, 2.0);
        assert_eq!(out.get_pixel(0, 0)[0], 80);
        assert_eq!(out.get_pixel(1, 0)[0], 160);
    }

    #[test]
    fn test_contrast_clamps() {
        let mut gray = GrayImage::new(2, 1);
        gray.put_pixel(0, 0, Luma([0]));
        gray.put_pixel(1, 0, Luma([255]));

        let out = enhance_contrast(&gray, 2.0);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn test_binarize_threshold_is_exclusive() {
        let mut gray = GrayImage::new(3, 1);
        gray.put_pixel(0, 0, Luma([128]));
        gray.put_pixel(1, 0, Luma([129]));
        gray.put_pixel(2, 0, Luma([3]));

        let out = binarize(&gray, THRESHOLD);
        assert_eq!(out.as_raw(), &vec![0, 255, 0]);
    }

    #[test]
    fn test_preprocess_keeps_dimensions_and_two_levels() {
        let mut rgb = RgbImage::from_pixel(30, 40, Rgb([240, 240, 240]));
        for x in 0..30 {
            rgb.put_pixel(x, 12, Rgb([20, 30, 40]));
        }

        let out = preprocess_for_ocr(&DynamicImage::ImageRgb8(rgb));
        assert_eq!(out.dimensions(), (30, 40));
        assert!(out.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(out.get_pixel(5, 12)[0], 0);
        assert_eq!(out.get_pixel(5, 13)[0], 255);
    }
}
