//! Page geometry and pipeline constants shared by the encoder and decoder.
//!
//! Both sides of the codec MUST agree on these values bit-for-bit; they are not
//! configurable per page beyond the `ecc` and `fountain` toggles threaded through
//! [`crate::encode`]/[`crate::decode`].

/// Canonical image side, in pixels.
pub const TOTAL_SIZE: u32 = 1024;

/// Icon-index bits carried by one cell.
pub const BITS_PER_SYMBOL: u32 = 4;

/// Palette-index bits carried by one cell.
pub const BITS_PER_COLOR: u32 = 2;

/// Total bits carried by one cell (symbol + color).
pub const BITS_PER_OP: u32 = BITS_PER_SYMBOL + BITS_PER_COLOR;

/// Icon tile side, in pixels.
pub const CELL_SIZE: u32 = 8;

/// Stride between cell origins, in pixels.
pub const CELL_SPACING: u32 = CELL_SIZE + 1;

/// Cells per row/column of the data area.
pub const CELL_DIMENSIONS: u32 = 112;

/// Top-left offset of the data area inside the page, in pixels.
pub const CELLS_OFFSET: u32 = 8;

/// Default Reed-Solomon parity bytes per 155-byte block.
pub const DEFAULT_ECC: usize = 30;

/// Reed-Solomon / interleave block size, in bytes.
pub const RS_BLOCK_SIZE: usize = 155;

/// Interleave stripes per partition.
pub const INTERLEAVE_BLOCKS: usize = 155;

/// Interleave partitions of the cell set.
pub const INTERLEAVE_PARTITIONS: usize = 2;

/// Fountain source blocks per page.
pub const FOUNTAIN_BLOCKS: usize = 10;

/// Maximum `|dx|`, `|dy|` tracked per cell by the drift search, in pixels.
pub const DRIFT_RADIUS: i32 = 2;

/// Minimum symbol-classification distance that triggers an early exit from the drift search.
pub const EARLY_EXIT_DISTANCE: u32 = 8;

/// Side length, in cells, of the square anchor fiducial carved out of each corner of the
/// data-cell grid.
pub const ANCHOR_CELL_SPAN: u32 = 8;

/// Length, in cells, of a single guide-bar segment.
pub const GUIDE_CELL_LEN: u32 = 10;

/// Computes the fountain chunk size, in bytes, for a given ecc level:
/// `floor((155 - ecc) * BITS_PER_OP * 10 / FOUNTAIN_BLOCKS)`.
pub const fn fountain_chunk_size(ecc: usize) -> usize {
	(RS_BLOCK_SIZE - ecc) * BITS_PER_OP as usize * 10 / FOUNTAIN_BLOCKS
}
