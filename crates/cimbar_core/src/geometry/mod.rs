//! Cell geometry: canonical cell positions, adjacency, drift tracking, and decode order.

mod decode_order;
mod drift;
mod neighbors;
mod positions;

pub use decode_order::FloodDecodeOrder;
pub use drift::Drift;
pub use neighbors::{AdjacentCellFinder, CellNeighbors};
pub use positions::{CellPosition, cell_positions, is_excluded};
