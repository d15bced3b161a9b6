//! The sixteen icon glyphs addressed by a cell's 4-bit symbol index.
//!
//! Each icon is an 8x8 monochrome bitmap, one byte per row (MSB-first, matching
//! [`crate::constants::CELL_SIZE`]). The sixteen bitmaps are generated at compile time rather
//! than loaded from image assets: each is a 4x4-cell grid (doubled to 8x8 pixels) whose twelve
//! border cells are always on and whose four interior cells carry the symbol's bits, one bit
//! per cell. The always-on border guarantees every symbol keeps at least three-quarters ink
//! coverage, which [`CimbDecoder::decode_color`](crate::cell::CimbDecoder::decode_color) relies
//! on to recover the color bits even from the emptiest symbol.

use image::{GrayImage, Luma};

use crate::constants::{BITS_PER_SYMBOL, CELL_SIZE};

/// Number of distinct icon symbols (`2^BITS_PER_SYMBOL`).
pub const SYMBOL_COUNT: usize = 1 << BITS_PER_SYMBOL;

/// Renders the 4x4-cell-grid-doubled bitmap for `symbol` (`0..SYMBOL_COUNT`), one `u8` per row.
const fn render_bitmap(symbol: u8) -> [u8; CELL_SIZE as usize] {
	let mut rows = [0u8; CELL_SIZE as usize];
	let mut quad_row = 0;
	while quad_row < 4 {
		let mut byte = 0u8;
		let mut quad_col = 0;
		while quad_col < 4 {
			let on = if is_interior(quad_row, quad_col) {
				(symbol >> interior_bit(quad_row, quad_col)) & 1 != 0
			} else {
				true
			};
			if on {
				byte |= 0b11 << (6 - quad_col * 2);
			}
			quad_col += 1;
		}
		rows[quad_row * 2] = byte;
		rows[quad_row * 2 + 1] = byte;
		quad_row += 1;
	}
	rows
}

const fn is_interior(row: usize, col: usize) -> bool {
	(row == 1 || row == 2) && (col == 1 || col == 2)
}

/// Maps an interior `(row, col)` to its symbol bit index: `(1,1)` is bit 0, `(1,2)` is bit 1,
/// `(2,1)` is bit 2, `(2,2)` is bit 3.
const fn interior_bit(row: usize, col: usize) -> u8 {
	match (row, col) {
		(1, 1) => 0,
		(1, 2) => 1,
		(2, 1) => 2,
		_ => 3,
	}
}

const fn render_all() -> [[u8; CELL_SIZE as usize]; SYMBOL_COUNT] {
	let mut icons = [[0u8; CELL_SIZE as usize]; SYMBOL_COUNT];
	let mut symbol = 0;
	while symbol < SYMBOL_COUNT {
		icons[symbol] = render_bitmap(symbol as u8);
		symbol += 1;
	}
	icons
}

/// The packed bitmaps for every symbol, indexed by symbol id.
const BITMAPS: [[u8; CELL_SIZE as usize]; SYMBOL_COUNT] = render_all();

/// Reads a single bit out of a packed row byte, MSB first.
const fn bit(row: u8, col: u32) -> bool {
	(row >> (7 - col)) & 1 != 0
}

/// The full set of icon glyphs, materialized as grayscale tiles on first use.
///
/// Cheap to construct: [`IconSet::default`] renders sixteen 8x8 images once and holds them for
/// reuse across an entire encode or decode pass.
#[derive(Debug, Clone)]
pub struct IconSet {
	tiles: Vec<GrayImage>,
}

impl IconSet {
	/// Looks up the rendered tile for `symbol`.
	pub fn tile(&self, symbol: u8) -> &GrayImage {
		&self.tiles[symbol as usize % SYMBOL_COUNT]
	}

	/// The raw packed bitmap for `symbol`, one byte per row.
	pub fn bitmap(symbol: u8) -> &'static [u8; CELL_SIZE as usize] {
		&BITMAPS[symbol as usize % SYMBOL_COUNT]
	}

	/// Classifies an 8x8 grayscale tile against every known symbol, returning the best-matching
	/// symbol id and its sum-of-absolute-differences distance.
	///
	/// Distance is returned (not thresholded) so callers such as
	/// [`crate::geometry::Drift`]'s search loop can compare it against an early-exit bound.
	pub fn classify(&self, sample: &GrayImage) -> (u8, u32) {
		(0..SYMBOL_COUNT as u8)
			.map(|symbol| (symbol, sad_distance(self.tile(symbol), sample)))
			.min_by_key(|&(_, distance)| distance)
			.expect("icon set is never empty")
	}
}

impl Default for IconSet {
	fn default() -> Self {
		let tiles = (0..SYMBOL_COUNT as u8)
			.map(|symbol| {
				let bitmap = IconSet::bitmap(symbol);
				GrayImage::from_fn(CELL_SIZE, CELL_SIZE, |x, y| {
					let on = bit(bitmap[y as usize], x);
					Luma([if on { 255 } else { 0 }])
				})
			})
			.collect();
		Self {
			tiles,
		}
	}
}

/// Sum-of-absolute-differences between two equally-sized grayscale tiles.
fn sad_distance(a: &GrayImage, b: &GrayImage) -> u32 {
	debug_assert_eq!(a.dimensions(), b.dimensions());
	a.pixels().zip(b.pixels()).map(|(p, q)| p.0[0].abs_diff(q.0[0]) as u32).sum()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn every_symbol_classifies_as_itself() {
		let icons = IconSet::default();
		for symbol in 0..SYMBOL_COUNT as u8 {
			let (classified, distance) = icons.classify(icons.tile(symbol));
			assert_eq!(classified, symbol);
			assert_eq!(distance, 0);
		}
	}

	#[test]
	fn distinct_symbols_render_distinct_bitmaps() {
		for a in 0..SYMBOL_COUNT as u8 {
			for b in (a + 1)..SYMBOL_COUNT as u8 {
				assert_ne!(IconSet::bitmap(a), IconSet::bitmap(b));
			}
		}
	}

	#[test]
	fn tile_dimensions_match_cell_size() {
		let icons = IconSet::default();
		assert_eq!(icons.tile(0).dimensions(), (CELL_SIZE, CELL_SIZE));
	}
}
