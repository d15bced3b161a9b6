//! Residual nonlinear dewarp: after homography, the guide bars between anchors are searched
//! for and used to fit a small piecewise-linear correction per axis, catching the lens/paper
//! curvature a single perspective transform can't.

use image::{GenericImageView, GrayImage, Luma, RgbImage};

use super::fiducial::{self, anchor_span_px};
use crate::constants::TOTAL_SIZE;

/// One axis's piecewise-linear correction: control points sorted by nominal coordinate,
/// each mapping a nominal page coordinate to its measured (actual) counterpart.
struct Axis {
	nominal: Vec<f32>,
	measured: Vec<f32>,
}

impl Axis {
	fn new(mut points: Vec<(f32, f32)>) -> Self {
		points.sort_by(|a, b| a.0.total_cmp(&b.0));
		Self {
			nominal: points.iter().map(|p| p.0).collect(),
			measured: points.iter().map(|p| p.1).collect(),
		}
	}

	/// Inverts the correction: given an *output* (nominal) coordinate, returns the *input*
	/// (measured/actual) coordinate to sample from, by linear interpolation between the two
	/// bracketing control points (or the nearest one, past the ends).
	fn correct(&self, nominal: f32) -> f32 {
		let n = self.nominal.len();
		if nominal <= self.nominal[0] {
			return self.measured[0];
		}
		if nominal >= self.nominal[n - 1] {
			return self.measured[n - 1];
		}
		for i in 0..n - 1 {
			let (n0, n1) = (self.nominal[i], self.nominal[i + 1]);
			if nominal >= n0 && nominal <= n1 {
				let t = if n1 > n0 { (nominal - n0) / (n1 - n0) } else { 0.0 };
				return self.measured[i] + t * (self.measured[i + 1] - self.measured[i]);
			}
		}
		self.measured[n - 1]
	}
}

/// Searches the already-homography-warped `img` for its six guide-bar segments, and applies a
/// per-axis piecewise-linear remap correcting for the residual nonlinear offset between where
/// they landed and their nominal canonical positions.
///
/// A segment that can't be found near its nominal position is dropped from that axis's control
/// points rather than failing the whole pass: dewarp is a refinement, not a hard requirement,
/// so a partially visible guide bar degrades precision instead of aborting decode.
pub fn correct(img: &RgbImage) -> RgbImage {
	let gray = to_grayscale(img);
	let nominal = fiducial::guide_centers(TOTAL_SIZE);
	let search_radius = anchor_span_px() as i64 / 2;

	let measured: Vec<Option<(f32, f32)>> = nominal
		.iter()
		.enumerate()
		.map(|(i, &(nx, ny))| find_guide_center(&gray, nx, ny, search_radius, i < 4))
		.collect();

	let x_points: Vec<(f32, f32)> =
		nominal.iter().zip(&measured).filter_map(|(&(nx, _), m)| m.map(|(mx, _)| (nx, mx))).collect();
	let y_points: Vec<(f32, f32)> =
		nominal.iter().zip(&measured).filter_map(|(&(_, ny), m)| m.map(|(_, my)| (ny, my))).collect();

	if x_points.len() < 2 || y_points.len() < 2 {
		return img.clone();
	}
	let x_axis = Axis::new(x_points);
	let y_axis = Axis::new(y_points);

	let (w, h) = img.dimensions();
	RgbImage::from_fn(w, h, |ox, oy| {
		let sx = x_axis.correct(ox as f32).round().clamp(0.0, w as f32 - 1.0) as u32;
		let sy = y_axis.correct(oy as f32).round().clamp(0.0, h as f32 - 1.0) as u32;
		*img.get_pixel(sx, sy)
	})
}

/// `horizontal` segments (the first four of [`fiducial::guide_centers`]) are searched with a
/// horizontal bar reference; the remaining two with a vertical bar reference.
fn find_guide_center(gray: &GrayImage, nx: f32, ny: f32, radius: i64, horizontal: bool) -> Option<(f32, f32)> {
	let reference = if horizontal { fiducial::horizontal_guide_bitmap() } else { fiducial::vertical_guide_bitmap() };
	let (rw, rh) = reference.dimensions();
	let (gw, gh) = gray.dimensions();

	let cx = nx as i64 - rw as i64 / 2;
	let cy = ny as i64 - rh as i64 / 2;
	let mut best = None;
	let mut best_distance = u64::MAX;
	for dy in -radius..=radius {
		for dx in -radius..=radius {
			let x = cx + dx;
			let y = cy + dy;
			if x < 0 || y < 0 || x as u32 + rw > gw || y as u32 + rh > gh {
				continue;
			}
			let distance = sad(gray, &reference, x as u32, y as u32);
			if distance < best_distance {
				best_distance = distance;
				best = Some((x as f32 + rw as f32 / 2.0, y as f32 + rh as f32 / 2.0));
			}
		}
	}
	best
}

fn sad(gray: &GrayImage, reference: &GrayImage, x: u32, y: u32) -> u64 {
	let (rw, rh) = reference.dimensions();
	let mut sum = 0u64;
	for dy in 0..rh {
		for dx in 0..rw {
			let g = gray.get_pixel(x + dx, y + dy).0[0];
			let r = reference.get_pixel(dx, dy).0[0];
			sum += g.abs_diff(r) as u64;
		}
	}
	sum
}

fn to_grayscale(image: &RgbImage) -> GrayImage {
	GrayImage::from_fn(image.width(), image.height(), |x, y| {
		let p = image.get_pixel(x, y);
		let value = (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32).round();
		Luma([value.clamp(0.0, 255.0) as u8])
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::palette::PaletteVariant;

	#[test]
	fn already_canonical_image_is_left_effectively_unchanged() {
		let img = fiducial::render_template(1024, PaletteVariant::Dark);
		let corrected = correct(&img);
		assert_eq!(corrected.dimensions(), img.dimensions());
	}
}
