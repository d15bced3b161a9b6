//! Dynamic-linking shim for `cimbar-rs`.
//!
//! This crate exists only so the root binary can opt into building `cimbar_internal` as a
//! `dylib` via the `dynamic_linking` feature; it carries no code of its own.

pub use cimbar_internal;
