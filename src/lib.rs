#![allow(clippy::single_component_path_imports)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `cimbar-rs` encodes and decodes the color-icon matrix barcode: a 2D grid of colored icon
//! tiles that packs a binary payload into a single printable/displayable page.
//!
//! This crate is a thin re-export of [`cimbar_internal`]; the codec itself lives in
//! `cimbar_core` and is reachable through [`prelude`](cimbar_internal::prelude).
pub use cimbar_internal::*;

#[cfg(all(feature = "dynamic_linking", not(target_family = "wasm")))]
#[allow(unused_imports)]
use cimbar_dylib;
