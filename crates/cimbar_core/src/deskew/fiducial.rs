//! Anchor and guide-bar bitmaps: the fiducials painted into the four excluded corners and
//! along the midlines of a page, and the reference templates the anchor search correlates
//! against.
//!
//! Both are generated, not loaded from image assets, so the tool stays self-contained. The
//! anchor pattern is a bullseye of concentric square rings at cell granularity: three corners
//! share it, the fourth (bottom-right) carries the same rings inverted so a rotated or
//! mirrored page can always be told apart.

use image::{GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;

use crate::constants::{ANCHOR_CELL_SPAN, CELLS_OFFSET, CELL_DIMENSIONS, CELL_SIZE, CELL_SPACING, GUIDE_CELL_LEN};
use crate::palette::{Color, PaletteVariant};

/// Which page corner an anchor occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
	/// Shares the common bullseye pattern.
	TopLeft,
	/// Shares the common bullseye pattern.
	TopRight,
	/// Shares the common bullseye pattern.
	BottomLeft,
	/// Carries the inverted pattern, breaking rotational symmetry.
	BottomRight,
}

impl Corner {
	/// The four corners, in a fixed order used for homography point correspondences.
	pub const ALL: [Corner; 4] = [Corner::TopLeft, Corner::TopRight, Corner::BottomLeft, Corner::BottomRight];

	/// Whether this corner renders the inverted (distinct) ring pattern.
	pub const fn is_distinct(self) -> bool {
		matches!(self, Corner::BottomRight)
	}

	/// Pixel origin of this corner's anchor block within a `dim x dim` page.
	pub fn origin(self, dim: u32) -> (u32, u32) {
		let far = dim - anchor_span_px();
		match self {
			Corner::TopLeft => (0, 0),
			Corner::TopRight => (far, 0),
			Corner::BottomLeft => (0, far),
			Corner::BottomRight => (far, far),
		}
	}

	/// Pixel center of this corner's anchor block, used as a homography control point.
	pub fn center(self, dim: u32) -> (f32, f32) {
		let (x, y) = self.origin(dim);
		let half = anchor_span_px() as f32 / 2.0;
		(x as f32 + half, y as f32 + half)
	}
}

/// Side length, in pixels, of one anchor's square footprint (the offset border plus the
/// `ANCHOR_CELL_SPAN` cells it spans).
pub fn anchor_span_px() -> u32 {
	CELLS_OFFSET + ANCHOR_CELL_SPAN * CELL_SPACING
}

/// Ring value at a cell `(local_col, local_row)` measured from an anchor's own corner,
/// `(0, 0)` being the outermost corner cell. Rings alternate every cell.
fn ring_on(local_col: u32, local_row: u32) -> bool {
	local_col.max(local_row) % 2 == 0
}

/// Renders the `ANCHOR_CELL_SPAN * CELL_SPACING`-square reference bitmap used to correlate
/// against a photographed page during anchor search.
///
/// `distinct` selects the inverted (bottom-right) pattern.
pub fn reference_bitmap(distinct: bool) -> GrayImage {
	let span = ANCHOR_CELL_SPAN * CELL_SPACING;
	GrayImage::from_fn(span, span, |x, y| {
		let col = x / CELL_SPACING;
		let row = y / CELL_SPACING;
		let on = ring_on(col, row) != distinct;
		Luma([if on { 255 } else { 0 }])
	})
}

/// Returns `true` if the grid cell `(col, row)` falls on the bullseye ring for whichever
/// anchor corner it belongs to. Caller must already know `(col, row)` is an anchor cell (see
/// [`crate::geometry::is_excluded`]'s anchor half).
pub(crate) fn anchor_cell_on(col: u32, row: u32, dim: u32) -> bool {
	let span = ANCHOR_CELL_SPAN;
	let right = col >= dim - span;
	let bottom = row >= dim - span;
	let local_col = if right { dim - 1 - col } else { col };
	let local_row = if bottom { dim - 1 - row } else { row };
	let distinct = right && bottom;
	ring_on(local_col, local_row) != distinct
}

/// Renders the solid horizontal guide bar, `GUIDE_CELL_LEN * CELL_SPACING` pixels wide and
/// `CELLS_OFFSET` pixels tall.
pub fn horizontal_guide_bitmap() -> GrayImage {
	GrayImage::from_pixel(GUIDE_CELL_LEN * CELL_SPACING, CELLS_OFFSET, Luma([255]))
}

/// Renders the solid vertical guide bar (the horizontal bar, transposed).
pub fn vertical_guide_bitmap() -> GrayImage {
	GrayImage::from_pixel(CELLS_OFFSET, GUIDE_CELL_LEN * CELL_SPACING, Luma([255]))
}

/// Nominal (undistorted) pixel centers of the six guide-bar segments, in page coordinates:
/// top, bottom-center, bottom-left-flank, bottom-right-flank, left, right.
pub fn guide_centers(dim: u32) -> [(f32, f32); 6] {
	let len = (GUIDE_CELL_LEN * CELL_SPACING) as f32;
	let mid = dim as f32 / 2.0;
	let top_y = CELLS_OFFSET as f32 / 2.0;
	let bottom_y = dim as f32 - CELLS_OFFSET as f32 / 2.0;
	let left_x = CELLS_OFFSET as f32 / 2.0;
	let right_x = dim as f32 - CELLS_OFFSET as f32 / 2.0;
	[
		(mid, top_y),
		(mid, bottom_y),
		(mid - 2.0 * len, bottom_y),
		(mid + 2.0 * len, bottom_y),
		(left_x, mid),
		(right_x, mid),
	]
}

/// Paints the full page template: background fill, four anchors, and six guide segments,
/// tinted to `variant`'s ink/background colors.
pub fn render_template(dim: u32, variant: PaletteVariant) -> RgbImage {
	let background = variant.background();
	let ink = variant.ink();
	let mut img = RgbImage::from_pixel(dim, dim, background.into());

	for corner in Corner::ALL {
		paint_anchor(&mut img, corner, dim, ink);
	}
	paint_guides(&mut img, dim, ink);
	img
}

fn paint_anchor(img: &mut RgbImage, corner: Corner, dim: u32, ink: Color) {
	let (ox, oy) = corner.origin(dim);
	let span = ANCHOR_CELL_SPAN;
	for row in 0..span {
		for col in 0..span {
			let on = ring_on(col, row) != corner.is_distinct();
			if on {
				let x = ox + CELLS_OFFSET + col * CELL_SPACING;
				let y = oy + CELLS_OFFSET + row * CELL_SPACING;
				draw_filled_rect_mut(img, Rect::at(x as i32, y as i32).of_size(CELL_SIZE, CELL_SIZE), ink.into());
			}
		}
	}
}

fn paint_guides(img: &mut RgbImage, dim: u32, ink: Color) {
	let len = GUIDE_CELL_LEN * CELL_SPACING;
	let half = len / 2;
	let mid = dim / 2;
	let bar = |img: &mut RgbImage, x: i32, y: i32, w: u32, h: u32| {
		draw_filled_rect_mut(img, Rect::at(x, y).of_size(w, h), Rgb::from(ink));
	};

	// Top horizontal guide.
	bar(img, (mid - half) as i32, 0, len, CELLS_OFFSET);
	// Bottom horizontal guides: center plus two flanks.
	let bottom_y = (dim - CELLS_OFFSET) as i32;
	bar(img, (mid - half) as i32, bottom_y, len, CELLS_OFFSET);
	bar(img, (mid as i32 - 2 * len as i32 - half as i32), bottom_y, len, CELLS_OFFSET);
	bar(img, (mid + 2 * len - half) as i32, bottom_y, len, CELLS_OFFSET);
	// Left/right vertical guides.
	bar(img, 0, (mid - half) as i32, CELLS_OFFSET, len);
	bar(img, (dim - CELLS_OFFSET) as i32, (mid - half) as i32, CELLS_OFFSET, len);
}

/// The data-area grid dimension this module's fiducials are laid out for.
pub const DIM: u32 = CELL_DIMENSIONS;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reference_bitmaps_for_distinct_corners_differ() {
		let primary = reference_bitmap(false);
		let distinct = reference_bitmap(true);
		assert_ne!(primary.as_raw(), distinct.as_raw());
	}

	#[test]
	fn corners_tile_within_page_bounds() {
		for corner in Corner::ALL {
			let (x, y) = corner.origin(1024);
			assert!(x + anchor_span_px() <= 1024);
			assert!(y + anchor_span_px() <= 1024);
		}
	}

	#[test]
	fn template_is_requested_size() {
		let img = render_template(1024, PaletteVariant::Dark);
		assert_eq!(img.dimensions(), (1024, 1024));
	}
}
