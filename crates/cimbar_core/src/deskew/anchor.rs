//! Anchor detection: locating the four fiducials in a (possibly skewed, rotated, or
//! mis-scaled) photographed page via sliding-window template matching, restricted to each
//! page quadrant.

use image::{GenericImageView, GrayImage, Luma, RgbImage};

use super::fiducial::{self, Corner};
use crate::error::CoreError;

/// The four detected anchor centers, in source-image pixel coordinates, indexed the same way
/// as [`Corner::ALL`].
pub type AnchorPoints = [(f32, f32); 4];

/// Coarse search stride, in pixels, for the first correlation pass.
const COARSE_STRIDE: u32 = 8;
/// Half-width, in pixels, of the fine refinement window around the coarse match.
const REFINE_RADIUS: i64 = COARSE_STRIDE as i64;

/// Locates all four anchors in `image` and returns their centers in [`Corner::ALL`] (i.e.
/// logical, not physical) order, so that `points[i]` always corresponds to `Corner::ALL[i]`'s
/// canonical identity regardless of how the photographed page is rotated or reflected.
///
/// The bullseye pattern painted at every corner is radially symmetric about its own right angle
/// (§4.6), so the same reference bitmap matches a corner's block no matter which physical
/// quadrant of the image it ends up in under a 90/180/270 degree rotation. Only the *distinct*
/// bottom-right pattern is unique; wherever it is found, that quadrant is where the canonical
/// bottom-right corner's content physically landed, which is enough to recover the rotation and
/// permute the other three points back into canonical order before homography is computed.
pub fn detect(image: &RgbImage) -> Result<AnchorPoints, CoreError> {
	let gray = to_grayscale(image);
	let (w, h) = gray.dimensions();
	let half_w = w / 2;
	let half_h = h / 2;

	let regular = fiducial::reference_bitmap(false);
	let distinct = fiducial::reference_bitmap(true);
	let span = regular.width() as f32;

	// For each physical quadrant of the image, find the stronger of the two reference matches;
	// the template that wins tells us whether that quadrant holds the distinct corner.
	let mut found: [Option<(f32, f32, bool)>; 4] = [None; 4];
	for (i, physical) in Corner::ALL.into_iter().enumerate() {
		let (qx, qy, qw, qh) = quadrant(physical, w, h, half_w, half_h);
		let (rx, ry) = best_match(&gray, &regular, qx, qy, qw, qh).ok_or(CoreError::AnchorNotFound(corner_name(physical)))?;
		let (dx, dy) = best_match(&gray, &distinct, qx, qy, qw, qh).ok_or(CoreError::AnchorNotFound(corner_name(physical)))?;
		let is_distinct = sad(&gray, &distinct, dx, dy) < sad(&gray, &regular, rx, ry);
		let (bx, by) = if is_distinct { (dx, dy) } else { (rx, ry) };
		found[i] = Some((bx as f32 + span / 2.0, by as f32 + span / 2.0, is_distinct));
	}

	let distinct_quadrant = Corner::ALL
		.into_iter()
		.enumerate()
		.find(|&(i, _)| found[i].is_some_and(|(.., distinct)| distinct))
		.map(|(_, physical)| physical)
		.ok_or(CoreError::AnchorNotFound("bottom-right"))?;
	let rotation = rotation_from_distinct_quadrant(distinct_quadrant);

	let mut points = [(0.0f32, 0.0f32); 4];
	for (i, canonical) in Corner::ALL.into_iter().enumerate() {
		let physical = rotate_corner(canonical, rotation);
		let physical_index = Corner::ALL.iter().position(|&c| c == physical).expect("Corner::ALL covers every corner");
		let (x, y, _) = found[physical_index].expect("every physical quadrant was searched above");
		points[i] = (x, y);
	}
	Ok(points)
}

/// How many quarter-turns (clockwise) the photographed page appears to have undergone, inferred
/// from which physical quadrant the distinct bottom-right anchor was found in.
fn rotation_from_distinct_quadrant(quadrant: Corner) -> u8 {
	match quadrant {
		Corner::BottomRight => 0,
		Corner::BottomLeft => 1,
		Corner::TopLeft => 2,
		Corner::TopRight => 3,
	}
}

/// Where a canonical corner's content physically ends up after `rotation` clockwise quarter
/// turns of the whole page.
fn rotate_corner(corner: Corner, rotation: u8) -> Corner {
	use Corner::{BottomLeft, BottomRight, TopLeft, TopRight};
	match (corner, rotation % 4) {
		(c, 0) => c,
		(TopLeft, 1) => TopRight,
		(TopRight, 1) => BottomRight,
		(BottomRight, 1) => BottomLeft,
		(BottomLeft, 1) => TopLeft,
		(TopLeft, 2) => BottomRight,
		(TopRight, 2) => BottomLeft,
		(BottomRight, 2) => TopLeft,
		(BottomLeft, 2) => TopRight,
		(TopLeft, _) => BottomLeft,
		(TopRight, _) => TopLeft,
		(BottomRight, _) => TopRight,
		(BottomLeft, _) => BottomRight,
	}
}

fn corner_name(corner: Corner) -> &'static str {
	match corner {
		Corner::TopLeft => "top-left",
		Corner::TopRight => "top-right",
		Corner::BottomLeft => "bottom-left",
		Corner::BottomRight => "bottom-right",
	}
}

fn quadrant(corner: Corner, w: u32, h: u32, half_w: u32, half_h: u32) -> (u32, u32, u32, u32) {
	match corner {
		Corner::TopLeft => (0, 0, half_w, half_h),
		Corner::TopRight => (half_w, 0, w - half_w, half_h),
		Corner::BottomLeft => (0, half_h, half_w, h - half_h),
		Corner::BottomRight => (half_w, half_h, w - half_w, h - half_h),
	}
}

fn to_grayscale(image: &RgbImage) -> GrayImage {
	GrayImage::from_fn(image.width(), image.height(), |x, y| {
		let p = image.get_pixel(x, y);
		let value = (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32).round();
		Luma([value.clamp(0.0, 255.0) as u8])
	})
}

/// Two-pass template match: a coarse scan at [`COARSE_STRIDE`], then a pixel-exact refinement
/// around the coarse winner. Returns the top-left pixel (in full-image coordinates) of the
/// best match, or `None` if the reference doesn't fit inside the search region at all.
fn best_match(gray: &GrayImage, reference: &GrayImage, region_x: u32, region_y: u32, region_w: u32, region_h: u32) -> Option<(u32, u32)> {
	let (rw, rh) = reference.dimensions();
	if region_w < rw || region_h < rh {
		return None;
	}
	let max_x = region_x + region_w - rw;
	let max_y = region_y + region_h - rh;

	let mut coarse_best = None;
	let mut coarse_distance = u64::MAX;
	let mut y = region_y;
	while y <= max_y {
		let mut x = region_x;
		while x <= max_x {
			let d = sad(gray, reference, x, y);
			if d < coarse_distance {
				coarse_distance = d;
				coarse_best = Some((x, y));
			}
			x += COARSE_STRIDE;
		}
		y += COARSE_STRIDE;
	}
	let (cx, cy) = coarse_best?;

	let mut best = (cx, cy);
	let mut best_distance = coarse_distance;
	let lo_x = cx as i64 - REFINE_RADIUS;
	let hi_x = (cx as i64 + REFINE_RADIUS).min(max_x as i64);
	let lo_y = cy as i64 - REFINE_RADIUS;
	let hi_y = (cy as i64 + REFINE_RADIUS).min(max_y as i64);
	for ry in lo_y.max(region_y as i64)..=hi_y {
		for rx in lo_x.max(region_x as i64)..=hi_x {
			let d = sad(gray, reference, rx as u32, ry as u32);
			if d < best_distance {
				best_distance = d;
				best = (rx as u32, ry as u32);
			}
		}
	}
	Some(best)
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

#[cfg(test)]
mod tests {
	use super::*;
	use crate::palette::PaletteVariant;

	#[test]
	fn detects_anchors_in_an_unskewed_template() {
		let img = fiducial::render_template(1024, PaletteVariant::Dark);
		let points = detect(&img).unwrap();
		let expected = Corner::ALL.map(|c| c.center(1024));
		for (p, e) in points.iter().zip(expected.iter()) {
			assert!((p.0 - e.0).abs() < 8.0, "x mismatch: {p:?} vs {e:?}");
			assert!((p.1 - e.1).abs() < 8.0, "y mismatch: {p:?} vs {e:?}");
		}
	}

	#[test]
	fn detects_anchors_in_order_under_every_quarter_turn() {
		// Each rotated page still gives a point per *canonical* corner, but that point now
		// lives wherever that corner's content physically landed after the turn, not at its
		// un-rotated nominal position; compare against that rotated expectation.
		let img = fiducial::render_template(1024, PaletteVariant::Dark);
		let rotations: [(u8, fn(&RgbImage) -> RgbImage); 4] = [
			(0, |i: &RgbImage| i.clone()),
			(1, image::imageops::rotate90),
			(2, image::imageops::rotate180),
			(3, image::imageops::rotate270),
		];
		for (k, rotate) in rotations {
			let rotated = rotate(&img);
			let points = detect(&rotated).unwrap();
			for (i, canonical) in Corner::ALL.into_iter().enumerate() {
				let expected = rotate_corner(canonical, k).center(1024);
				let p = points[i];
				assert!((p.0 - expected.0).abs() < 8.0, "rotation {k}, corner {canonical:?}: x mismatch {p:?} vs {expected:?}");
				assert!((p.1 - expected.1).abs() < 8.0, "rotation {k}, corner {canonical:?}: y mismatch {p:?} vs {expected:?}");
			}
		}
	}

	#[test]
	fn rotation_from_distinct_quadrant_round_trips_through_rotate_corner() {
		for rotation in 0..4u8 {
			let quadrant = rotate_corner(Corner::BottomRight, rotation);
			assert_eq!(rotation_from_distinct_quadrant(quadrant), rotation);
		}
	}
}
