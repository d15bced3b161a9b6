//! Per-cell geometric drift: the measured offset between a cell's nominal and actual icon
//! origin, plus the neighborhood search order used to find it.

use crate::constants::DRIFT_RADIUS;

/// A per-cell drift hint: an accumulated `(dx, dy)` offset plus the ordered neighborhood to
/// search for the next classification.
///
/// `pairs` always starts with `(0, 0)` and expands outward in rings of increasing Chebyshev
/// distance, so a classifier that early-exits on a good match tries the most likely offsets
/// first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Drift {
	/// Accumulated horizontal offset, in pixels.
	pub x: i32,
	/// Accumulated vertical offset, in pixels.
	pub y: i32,
	/// Ordered `(dx, dy)` offsets to try relative to `(x, y)`.
	pub pairs: Vec<(i32, i32)>,
}

impl Drift {
	/// Builds a drift hint centered at `(x, y)` with the default search radius.
	pub fn new(x: i32, y: i32) -> Self {
		Self {
			x,
			y,
			pairs: search_offsets(DRIFT_RADIUS),
		}
	}

	/// The zero drift hint: no accumulated offset, full search radius.
	pub fn zero() -> Self {
		Self::new(0, 0)
	}
}

impl Default for Drift {
	fn default() -> Self {
		Self::zero()
	}
}

/// Generates the ordered neighborhood search offsets within `radius`, `(0, 0)` first,
/// followed by each successive Chebyshev ring.
fn search_offsets(radius: i32) -> Vec<(i32, i32)> {
	let mut offsets = Vec::with_capacity(((2 * radius + 1) * (2 * radius + 1)) as usize);
	offsets.push((0, 0));
	for ring in 1..=radius {
		for dy in -ring..=ring {
			for dx in -ring..=ring {
				if dx.abs().max(dy.abs()) == ring {
					offsets.push((dx, dy));
				}
			}
		}
	}
	offsets
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_offset_is_origin() {
		let d = Drift::zero();
		assert_eq!(d.pairs[0], (0, 0));
	}

	#[test]
	fn offsets_cover_full_radius_square_exactly_once() {
		let d = Drift::new(3, -1);
		let expected = (2 * DRIFT_RADIUS + 1) * (2 * DRIFT_RADIUS + 1);
		assert_eq!(d.pairs.len() as i32, expected);
		let mut seen = std::collections::HashSet::new();
		for pair in &d.pairs {
			assert!(seen.insert(*pair), "duplicate offset {pair:?}");
		}
	}

	#[test]
	fn offsets_are_ordered_by_ring() {
		let d = Drift::zero();
		let mut last_ring = 0;
		for (dx, dy) in &d.pairs {
			let ring = dx.abs().max(dy.abs());
			assert!(ring >= last_ring);
			last_ring = ring;
		}
	}
}
