//! Decode-side preprocessing: a high-pass sharpening pass (used only for symbol
//! classification) followed by grayscale conversion.

use image::{GenericImageView, GrayImage, Luma, RgbImage};

/// The 3x3 high-pass sharpening kernel applied before grayscale conversion.
const KERNEL: [[f32; 3]; 3] = [[-1.0, -1.0, -1.0], [-1.0, 8.5, -1.0], [-1.0, -1.0, -1.0]];

/// Applies [`KERNEL`] to `img` (edge pixels are replicated, i.e. clamped-to-edge border
/// handling) and converts the result to grayscale, for use by the symbol classifier.
///
/// Color classification must use the unsharpened image; this function's output is never fed
/// back into [`super::super::cell::CimbDecoder::decode_color`].
pub fn sharpen_and_grayscale(img: &RgbImage) -> GrayImage {
	let (w, h) = img.dimensions();
	GrayImage::from_fn(w, h, |x, y| {
		let mut sum = [0.0f32; 3];
		for (ky, row) in KERNEL.iter().enumerate() {
			for (kx, &weight) in row.iter().enumerate() {
				let sx = (x as i64 + kx as i64 - 1).clamp(0, w as i64 - 1) as u32;
				let sy = (y as i64 + ky as i64 - 1).clamp(0, h as i64 - 1) as u32;
				let p = img.get_pixel(sx, sy);
				for c in 0..3 {
					sum[c] += p.0[c] as f32 * weight;
				}
			}
		}
		let r = sum[0].clamp(0.0, 255.0);
		let g = sum[1].clamp(0.0, 255.0);
		let b = sum[2].clamp(0.0, 255.0);
		let value = (0.299 * r + 0.587 * g + 0.114 * b).round().clamp(0.0, 255.0);
		Luma([value as u8])
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use image::Rgb;

	#[test]
	fn flat_image_stays_flat() {
		let img = RgbImage::from_pixel(16, 16, Rgb([100, 100, 100]));
		let out = sharpen_and_grayscale(&img);
		for pixel in out.pixels() {
			assert_eq!(pixel.0[0], 100);
		}
	}

	#[test]
	fn output_matches_input_dimensions() {
		let img = RgbImage::from_pixel(33, 17, Rgb([10, 20, 30]));
		let out = sharpen_and_grayscale(&img);
		assert_eq!(out.dimensions(), img.dimensions());
	}
}
