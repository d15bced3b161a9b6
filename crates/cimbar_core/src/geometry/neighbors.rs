//! Cell adjacency: the up-to-four neighbors of a given cell, computed once from the
//! canonical position list and reused by the flood-fill decode order.

use std::collections::HashMap;

use super::positions::CellPosition;

/// The up-to-four adjacent cells (north, south, east, west) of a given cell.
///
/// A direction is `None` where the adjacent grid coordinate falls outside the data area
/// (off the grid, or onto an excluded anchor/guide cell).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CellNeighbors {
	/// Neighbor one row up, if any.
	pub north: Option<usize>,
	/// Neighbor one row down, if any.
	pub south: Option<usize>,
	/// Neighbor one column right, if any.
	pub east: Option<usize>,
	/// Neighbor one column left, if any.
	pub west: Option<usize>,
}

impl CellNeighbors {
	/// Iterates over the present neighbor indices.
	pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
		[self.north, self.south, self.east, self.west].into_iter().flatten()
	}
}

/// Precomputed adjacency for every cell in a [`super::cell_positions`] list.
///
/// Built once per page geometry; immutable and reusable across pages, as it depends only on
/// the geometry constants.
#[derive(Debug, Clone)]
pub struct AdjacentCellFinder {
	neighbors: Vec<CellNeighbors>,
}

impl AdjacentCellFinder {
	/// Builds the adjacency table for the given cell list and grid dimension.
	pub fn new(cells: &[CellPosition], dim: u32) -> Self {
		let mut by_coord: HashMap<(u32, u32), usize> = HashMap::with_capacity(cells.len());
		for cell in cells {
			by_coord.insert((cell.col, cell.row), cell.index);
		}

		let neighbors = cells
			.iter()
			.map(|cell| CellNeighbors {
				north: cell.row.checked_sub(1).and_then(|row| by_coord.get(&(cell.col, row)).copied()),
				south: (cell.row + 1 < dim).then(|| by_coord.get(&(cell.col, cell.row + 1)).copied()).flatten(),
				east: (cell.col + 1 < dim).then(|| by_coord.get(&(cell.col + 1, cell.row)).copied()).flatten(),
				west: cell.col.checked_sub(1).and_then(|col| by_coord.get(&(col, cell.row)).copied()),
			})
			.collect();

		Self {
			neighbors,
		}
	}

	/// Returns the neighbors of the cell at `index`.
	pub fn neighbors_of(&self, index: usize) -> CellNeighbors {
		self.neighbors[index]
	}

	/// Number of cells this finder was built for.
	pub fn len(&self) -> usize {
		self.neighbors.len()
	}

	/// Returns `true` if this finder covers no cells.
	pub fn is_empty(&self) -> bool {
		self.neighbors.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{CELLS_OFFSET, CELL_DIMENSIONS, CELL_SPACING};
	use crate::geometry::cell_positions;

	#[test]
	fn neighbors_are_symmetric() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		let finder = AdjacentCellFinder::new(&cells, CELL_DIMENSIONS);

		for cell in &cells {
			let n = finder.neighbors_of(cell.index);
			if let Some(east) = n.east {
				let east_neighbors = finder.neighbors_of(east);
				assert_eq!(east_neighbors.west, Some(cell.index));
			}
			if let Some(south) = n.south {
				let south_neighbors = finder.neighbors_of(south);
				assert_eq!(south_neighbors.north, Some(cell.index));
			}
		}
	}

	#[test]
	fn every_cell_has_at_least_one_neighbor() {
		let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
		let finder = AdjacentCellFinder::new(&cells, CELL_DIMENSIONS);
		for cell in &cells {
			assert!(finder.neighbors_of(cell.index).iter().count() > 0);
		}
	}
}
