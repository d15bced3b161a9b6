//! Flood-fill decode order: the traversal the decoder uses to visit cells, seeded from the
//! four data-area corners and fed by per-cell drift feedback.

use std::collections::VecDeque;

use super::drift::Drift;
use super::neighbors::AdjacentCellFinder;
use super::positions::CellPosition;

/// Emits cells in breadth-first order starting from the four corners of the data area,
/// carrying a drift hint derived from each cell's already-decoded neighbors.
///
/// The four seeds mirror the four anchor fiducials: decoding starts next to each anchor and
/// floods inward, so a cell's drift hint is almost always seeded by a neighbor that has
/// already been classified rather than the page-global zero offset.
pub struct FloodDecodeOrder<'a> {
	cells: &'a [CellPosition],
	finder: &'a AdjacentCellFinder,
	queue: VecDeque<usize>,
	queued: Vec<bool>,
	/// Accumulated `(dx_sum, dy_sum, samples)` per cell, used to average neighbor drift.
	accum: Vec<(i32, i32, u32)>,
	current: Option<usize>,
}

impl<'a> FloodDecodeOrder<'a> {
	/// Builds a decode order over `cells`, seeded from the four corners of a `dim x dim` grid.
	pub fn new(cells: &'a [CellPosition], finder: &'a AdjacentCellFinder, dim: u32) -> Self {
		let mut order = Self {
			cells,
			finder,
			queue: VecDeque::with_capacity(cells.len()),
			queued: vec![false; cells.len()],
			accum: vec![(0, 0, 0); cells.len()],
			current: None,
		};

		for index in corner_seeds(cells, dim) {
			order.enqueue(index);
		}
		order
	}

	fn enqueue(&mut self, index: usize) {
		if !self.queued[index] {
			self.queued[index] = true;
			self.queue.push_back(index);
		}
	}

	/// Writes the measured drift for the most recently yielded cell back into the traversal,
	/// so its not-yet-visited neighbors inherit it as part of their averaged hint.
	///
	/// `confidence` is expected to be a classification distance: lower is better. Cells with a
	/// better (lower) distance contribute more samples to their neighbors' average, matching
	/// the source behavior of trusting confident reads more than marginal ones.
	pub fn update(&mut self, best_dx: i32, best_dy: i32, confidence: u32) {
		let Some(index) = self.current else { return };
		let weight = 1 + EARLY_EXIT_BONUS.saturating_sub(confidence.min(EARLY_EXIT_BONUS));
		for neighbor in self.finder.neighbors_of(index).iter() {
			if !self.queued[neighbor] {
				let entry = &mut self.accum[neighbor];
				entry.0 += best_dx * weight as i32;
				entry.1 += best_dy * weight as i32;
				entry.2 += weight;
			}
		}
	}

	fn drift_hint(&self, index: usize) -> Drift {
		let (dx_sum, dy_sum, samples) = self.accum[index];
		if samples == 0 {
			Drift::zero()
		} else {
			Drift::new(dx_sum / samples as i32, dy_sum / samples as i32)
		}
	}
}

/// Extra weight granted to a highly confident (small-distance) classification when averaging
/// drift into neighboring cells.
const EARLY_EXIT_BONUS: u32 = 8;

impl<'a> Iterator for FloodDecodeOrder<'a> {
	type Item = (usize, (u32, u32), Drift);

	fn next(&mut self) -> Option<Self::Item> {
		let index = self.queue.pop_front()?;
		self.current = Some(index);
		let hint = self.drift_hint(index);
		for neighbor in self.finder.neighbors_of(index).iter() {
			self.enqueue(neighbor);
		}
		let cell = &self.cells[index];
		Some((index, (cell.x, cell.y), hint))
	}
}

/// Finds the cell nearest each of the four data-area corners to seed the flood fill.
fn corner_seeds(cells: &[CellPosition], dim: u32) -> [usize; 4] {
	let targets = [(0u32, 0u32), (dim - 1, 0), (0, dim - 1), (dim - 1, dim - 1)];
	targets.map(|(col, row)| nearest_cell(cells, col, row))
}

fn nearest_cell(cells: &[CellPosition], col: u32, row: u32) -> usize {
	cells
		.iter()
		.min_by_key(|cell| cell.col.abs_diff(col) + cell.row.abs_diff(row))
		.expect("cell list is never empty")
		.index
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{CELLS_OFFSET, CELL_DIMENSIONS, CELL_SPACING};
	use crate::geometry::cell_positions;

	#[test]
	fn visits_every_cell_exactly_once() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		let finder = AdjacentCellFinder::new(&cells, CELL_DIMENSIONS);
		let order = FloodDecodeOrder::new(&cells, &finder, CELL_DIMENSIONS);

		let mut seen = vec![false; cells.len()];
		let mut count = 0;
		for (index, _, _) in order {
			assert!(!seen[index], "cell {index} visited twice");
			seen[index] = true;
			count += 1;
		}
		assert_eq!(count, cells.len());
		assert!(seen.iter().all(|&v| v));
	}

	#[test]
	fn drift_hint_propagates_from_updated_neighbor() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		let finder = AdjacentCellFinder::new(&cells, CELL_DIMENSIONS);
		let mut order = FloodDecodeOrder::new(&cells, &finder, CELL_DIMENSIONS);

		let (first_index, _, hint) = order.next().unwrap();
		assert_eq!(hint, Drift::zero());
		order.update(2, -1, 0);

		let neighbor_indices: Vec<usize> = finder.neighbors_of(first_index).iter().collect();
		let mut found_nonzero = false;
		for (index, _, hint) in order {
			if neighbor_indices.contains(&index) {
				found_nonzero = hint.x != 0 || hint.y != 0;
				if found_nonzero {
					break;
				}
			}
		}
		assert!(found_nonzero, "no unvisited neighbor inherited the updated drift");
	}
}
