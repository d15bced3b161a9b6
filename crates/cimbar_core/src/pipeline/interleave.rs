//! Cell-stream interleaving: the permutation that spreads physically adjacent cells across
//! distant bytes of the underlying stream, so a localized photograph defect (a smudge, a
//! fold) corrupts many different Reed-Solomon blocks lightly rather than one block heavily.

use crate::geometry::CellPosition;

/// Reorders `cells` into interleaved stream order: `partitions` contiguous partitions, each
/// round-robined across `blocks` stripes.
///
/// Within partition `p` of size `S = N / partitions`, the output order is the concatenation,
/// for stripe `s` in `0..blocks`, of positions `p*S + s`, `p*S + s + blocks`, `p*S + s +
/// 2*blocks`, … while still inside the partition.
pub fn interleave(cells: &[CellPosition], blocks: usize, partitions: usize) -> Vec<CellPosition> {
	let n = cells.len();
	let partition_size = n / partitions;
	let mut out = Vec::with_capacity(n);

	for p in 0..partitions {
		let base = p * partition_size;
		let end = base + partition_size;
		for s in 0..blocks {
			let mut i = base + s;
			while i < end {
				out.push(cells[i]);
				i += blocks;
			}
		}
	}
	// Any remainder cells not evenly divided by (blocks * partitions) keep canonical order,
	// appended after the interleaved run, so every cell is still emitted exactly once.
	let covered = partitions * partition_size;
	out.extend_from_slice(&cells[covered..]);
	out
}

/// The reverse of [`interleave`]: a `cell_index -> stream_index` lookup, plus the stream
/// block size (`N / (blocks * partitions)`) used to map a stream position to its RS block.
pub fn interleave_reverse(cells: &[CellPosition], blocks: usize, partitions: usize) -> (Vec<usize>, usize) {
	let interleaved = interleave(cells, blocks, partitions);
	let mut lookup = vec![0usize; cells.len()];
	for (stream_index, cell) in interleaved.iter().enumerate() {
		lookup[cell.index] = stream_index;
	}
	let block_size = (cells.len() / (blocks * partitions)).max(1);
	(lookup, block_size)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::{CELLS_OFFSET, CELL_DIMENSIONS, CELL_SPACING, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS};
	use crate::geometry::cell_positions;

	fn cells() -> Vec<CellPosition> {
		cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET)
	}

	#[test]
	fn every_cell_index_appears_exactly_once() {
		let cells = cells();
		let interleaved = interleave(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);
		assert_eq!(interleaved.len(), cells.len());

		let mut seen = vec![false; cells.len()];
		for cell in &interleaved {
			assert!(!seen[cell.index], "cell {} emitted twice", cell.index);
			seen[cell.index] = true;
		}
		assert!(seen.iter().all(|&v| v));
	}

	#[test]
	fn reverse_is_the_identity_permutation() {
		let cells = cells();
		let interleaved = interleave(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);
		let (lookup, _) = interleave_reverse(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);

		for (stream_index, cell) in interleaved.iter().enumerate() {
			assert_eq!(lookup[cell.index], stream_index);
		}
	}

	#[test]
	fn adjacent_stream_entries_are_not_physically_adjacent() {
		let cells = cells();
		let interleaved = interleave(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);
		for pair in interleaved.windows(2) {
			let (a, b) = (pair[0], pair[1]);
			let manhattan = a.col.abs_diff(b.col) + a.row.abs_diff(b.row);
			assert!(manhattan > 1, "stream-adjacent cells {a:?} and {b:?} are grid-adjacent");
		}
	}

	#[test]
	fn small_synthetic_grid_matches_hand_computed_order() {
		let cells: Vec<CellPosition> = (0..12)
			.map(|i| CellPosition {
				index: i,
				x: i as u32,
				y: 0,
				col: i as u32,
				row: 0,
			})
			.collect();
		// blocks=3, partitions=2 -> partition size 6, stripes of 3: [0,3] [1,4] [2,5] per partition.
		let interleaved = interleave(&cells, 3, 2);
		let indices: Vec<usize> = interleaved.iter().map(|c| c.index).collect();
		assert_eq!(indices, vec![0, 3, 1, 4, 2, 5, 6, 9, 7, 10, 8, 11]);
	}
}
