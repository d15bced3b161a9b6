//! Core codec for the color-icon matrix barcode.
//!
//! # Layers
//!
//! - [`geometry`]: cell positions, adjacency, drift tracking, and the flood-fill decode order.
//! - [`palette`]: the four-color palettes (dark/light) and their offline k-means calibration.
//! - [`icon`]: the sixteen 8x8 icon bitmaps addressed by symbol id.
//! - [`cell`]: per-cell symbol+color encode/decode.
//! - [`pipeline`]: the streaming byte transforms (bit-file, interleave, Reed-Solomon, fountain).
//! - [`deskew`]: anchor detection, homography, and dewarp for recovering a canonical page.
//!
//! # Examples
//!
//! ```rust
//! use cimbar_core::prelude::*;
//!
//! let img = encode(b"hello, cimbar", PaletteVariant::Dark, 0, false).unwrap();
//! let payload = decode(&img, PaletteVariant::Dark, 0, false, DeskewLevel::Skip).unwrap();
//! assert_eq!(payload, b"hello, cimbar");
//! ```

pub mod cancel;
pub mod cell;
pub mod constants;
pub mod deskew;
pub mod error;
pub mod geometry;
pub mod icon;
pub mod palette;
pub mod pipeline;

mod codec;

/// `use cimbar_core::prelude::*;` to import commonly used items.
pub mod prelude;

pub use cancel::CancelToken;
pub use codec::{decode, decode_cancellable, decode_pages, decode_with_options, encode, encode_pages};
pub use error::CoreError;
