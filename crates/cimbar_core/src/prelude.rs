//! Prelude module for `cimbar_core`.
//!
//! This module provides a convenient way to import the whole-page `encode`/`decode` entry
//! points plus the types most callers need to configure them.
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

#[doc(inline)]
pub use crate::cell::{CimbDecoder, CimbEncoder};
#[doc(inline)]
pub use crate::deskew::DeskewLevel;
#[doc(inline)]
pub use crate::error::CoreError;
#[doc(inline)]
pub use crate::icon::IconSet;
#[doc(inline)]
pub use crate::palette::{Color, Palette, PaletteVariant};
#[doc(inline)]
pub use crate::cancel::CancelToken;
#[doc(inline)]
pub use crate::{decode, decode_cancellable, decode_pages, decode_with_options, encode, encode_pages};
