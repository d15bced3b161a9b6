//! Canonical cell positions: the geometry-derived, data-independent ordering both the
//! encoder and decoder iterate in lock-step.

use std::collections::HashSet;

use crate::constants::{ANCHOR_CELL_SPAN, GUIDE_CELL_LEN};

/// One cell's identity within the page: its canonical index and its pixel origin.
///
/// Identity is immutable for a given page geometry — `index` never changes once
/// [`cell_positions`] has been computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPosition {
	/// Canonical index: this cell's position in the row-major, anchor/guide-excluded scan.
	pub index: usize,
	/// Pixel x-coordinate of the cell's top-left corner.
	pub x: u32,
	/// Pixel y-coordinate of the cell's top-left corner.
	pub y: u32,
	/// Column of this cell within the `dim x dim` grid (before exclusion).
	pub col: u32,
	/// Row of this cell within the `dim x dim` grid (before exclusion).
	pub row: u32,
}

/// Returns `true` if the grid cell at `(col, row)` is covered by an anchor fiducial or a
/// guide bar and therefore carries no payload bits.
///
/// This mask is a pure function of the geometry constants: both `cell_positions` (used by
/// the encoder and decoder alike) and the deskewer's anchor-search agree on it bit-for-bit.
pub fn is_excluded(col: u32, row: u32, dim: u32) -> bool {
	is_anchor_cell(col, row, dim) || is_guide_cell(col, row, dim)
}

fn is_anchor_cell(col: u32, row: u32, dim: u32) -> bool {
	let span = ANCHOR_CELL_SPAN;
	let left = col < span;
	let right = col >= dim - span;
	let top = row < span;
	let bottom = row >= dim - span;
	(left || right) && (top || bottom)
}

fn is_guide_cell(col: u32, row: u32, dim: u32) -> bool {
	let len = GUIDE_CELL_LEN;
	let mid = dim / 2;
	let half = len / 2;
	let in_mid_band = |v: u32, center: u32| v >= center.saturating_sub(half) && v < center + half;

	// Two short verticals at the left/right edges of the data area, at the vertical midline.
	let vertical = (col == 0 || col == dim - 1) && in_mid_band(row, mid);

	// One horizontal guide along the top midline...
	let horizontal_top = row == 0 && in_mid_band(col, mid);

	// ...and three along the bottom: center, plus a flank on either side.
	let horizontal_bottom = row == dim - 1
		&& (in_mid_band(col, mid) || in_mid_band(col, mid.saturating_sub(2 * len)) || in_mid_band(col, mid + 2 * len));

	vertical || horizontal_top || horizontal_bottom
}

/// Produces the canonical ordered sequence of cell positions for a `dim x dim` grid of
/// `spacing`-pixel-strided cells starting at pixel `offset`, excluding anchor/guide cells.
///
/// Both encode and decode call this with the same arguments; the returned `Vec`'s index is
/// each cell's *cell index*, used throughout [`crate::pipeline::interleave`].
pub fn cell_positions(spacing: u32, dim: u32, offset: u32) -> Vec<CellPosition> {
	let mut cells = Vec::with_capacity((dim * dim) as usize);
	let mut index = 0usize;
	for row in 0..dim {
		for col in 0..dim {
			if is_excluded(col, row, dim) {
				continue;
			}
			cells.push(CellPosition {
				index,
				x: offset + col * spacing,
				y: offset + row * spacing,
				col,
				row,
			});
			index += 1;
		}
	}
	cells
}

/// Returns the full set of excluded `(col, row)` grid coordinates for a `dim x dim` grid.
///
/// Convenience wrapper over [`is_excluded`] for callers (such as the page template renderer)
/// that want the whole mask up front rather than testing cell-by-cell.
pub fn excluded_set(dim: u32) -> HashSet<(u32, u32)> {
	let mut set = HashSet::new();
	for row in 0..dim {
		for col in 0..dim {
			if is_excluded(col, row, dim) {
				set.insert((col, row));
			}
		}
	}
	set
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{CELLS_OFFSET, CELL_DIMENSIONS, CELL_SPACING};

	#[test]
	fn cell_positions_is_deterministic() {
		let a = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		let b = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		assert_eq!(a, b);
	}

	#[test]
	fn indices_are_contiguous() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		for (i, cell) in cells.iter().enumerate() {
			assert_eq!(cell.index, i);
		}
	}

	#[test]
	fn corner_cells_are_excluded() {
		assert!(is_excluded(0, 0, CELL_DIMENSIONS));
		assert!(is_excluded(CELL_DIMENSIONS - 1, 0, CELL_DIMENSIONS));
		assert!(is_excluded(0, CELL_DIMENSIONS - 1, CELL_DIMENSIONS));
		assert!(is_excluded(CELL_DIMENSIONS - 1, CELL_DIMENSIONS - 1, CELL_DIMENSIONS));
	}

	#[test]
	fn center_cell_is_not_excluded() {
		let mid = CELL_DIMENSIONS / 2 + 5;
		assert!(!is_excluded(mid, mid, CELL_DIMENSIONS));
	}

	#[test]
	fn cell_count_is_less_than_full_grid() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		assert!(cells.len() < (CELL_DIMENSIONS * CELL_DIMENSIONS) as usize);
	}
}
