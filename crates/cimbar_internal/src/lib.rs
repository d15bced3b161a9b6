//! Internal crate for `cimbar-rs`.
//!
//! This module is separated into its own crate to enable simple dynamic linking for `cimbar`,
//! and should not be used directly.
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

/// `use cimbar_internal::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export cimbar_core for advanced usage.
pub use cimbar_core;
