//! Prelude module for `cimbar_internal`.
//!
//! This module provides a convenient way to import commonly used types and the whole-page
//! `encode`/`decode` entry points.
//!
//! # Examples
//!
//! ```rust
//! use cimbar_internal::prelude::*;
//!
//! let img = encode(b"hello, cimbar", PaletteVariant::Dark, 0, false).unwrap();
//! let payload = decode(&img, PaletteVariant::Dark, 0, false, DeskewLevel::Skip).unwrap();
//! assert_eq!(payload, b"hello, cimbar");
//! ```

#[doc(inline)]
pub use cimbar_core::cancel::CancelToken;
#[doc(inline)]
pub use cimbar_core::cell::{CimbDecoder, CimbEncoder};
#[doc(inline)]
pub use cimbar_core::deskew::DeskewLevel;
#[doc(inline)]
pub use cimbar_core::error::CoreError;
#[doc(inline)]
pub use cimbar_core::icon::IconSet;
#[doc(inline)]
pub use cimbar_core::palette::{Color, Palette, PaletteVariant};
#[doc(inline)]
pub use cimbar_core::{decode, decode_cancellable, decode_pages, decode_with_options, encode, encode_pages};

// Re-export the full crate for advanced usage.
#[doc(inline)]
pub use cimbar_core;
