//! Byte pipeline: the streaming transforms connecting raw payload bytes to bit-packed,
//! interleaved cells, and back.
//!
//! ```text
//! payload -> [fountain] -> [reed-solomon] -> bit-packed cells -> interleaved cell writer
//! ```

mod bitfile;
mod fountain;
mod interleave;
mod rs;

pub use bitfile::{BitFile, BitFileWriter};
pub use fountain::{FountainDecoderStream, FountainEncoderStream};
pub use interleave::{interleave, interleave_reverse};
pub use rs::{RsDecodeWriter, RsEncodeReader, decode_block as rs_decode_block, encode_block as rs_encode_block};

use std::io::{self, Write};

use crate::constants::RS_BLOCK_SIZE;

/// Accepts `(block_index, byte)` writes in any order and forwards each block's bytes to
/// `inner` as a contiguous run once that block is complete, strictly in ascending
/// `block_index` order.
///
/// This is the byte-level de-interleaving contract named by spec §4.3: a caller that already
/// has whole bytes in hand (one per block, arriving in any order) can feed them straight through
/// and get a properly ordered, block-contiguous Reed-Solomon stream back out. `cimbar_core`'s
/// own orchestrator (`codec::decode_page_to_rs_output`) doesn't go through it: a cell carries
/// [`crate::constants::BITS_PER_OP`] (6) bits, not a whole byte, so flood-fill arrival order has
/// to be resolved into canonical bit-stream order *before* a byte exists to hand this writer —
/// the orchestrator does that with `values[lookup[index]]` plus a single final [`BitFileWriter`]
/// pass instead. This type is kept as the standalone byte-oriented de-interleaver for a caller
/// that decodes cells in canonical (not flood-fill) order and already has bytes, not bits, to
/// place per block; see `DESIGN.md` for the full rationale.
pub struct InterleavedWriter<W> {
	inner: W,
	block_size: usize,
	buffers: Vec<Vec<u8>>,
	complete: Vec<bool>,
	next_to_flush: usize,
}

impl<W: Write> InterleavedWriter<W> {
	/// Wraps `inner`. `num_blocks` blocks of `block_size` bytes each are expected before the
	/// stream is fully flushed.
	pub fn new(inner: W, num_blocks: usize, block_size: usize) -> Self {
		Self {
			inner,
			block_size,
			buffers: vec![Vec::with_capacity(block_size); num_blocks],
			complete: vec![false; num_blocks],
			next_to_flush: 0,
		}
	}

	/// Appends one byte to `block_index`'s buffer. Once the block reaches `block_size` bytes
	/// it's marked complete; [`Self::flush_ready`] (called automatically here) then flushes
	/// every contiguously-complete block starting from the lowest unflushed index.
	pub fn write_byte(&mut self, block_index: usize, byte: u8) -> io::Result<()> {
		let buf = &mut self.buffers[block_index];
		buf.push(byte);
		if buf.len() == self.block_size {
			self.complete[block_index] = true;
		}
		self.flush_ready()
	}

	fn flush_ready(&mut self) -> io::Result<()> {
		while self.next_to_flush < self.complete.len() && self.complete[self.next_to_flush] {
			self.inner.write_all(&self.buffers[self.next_to_flush])?;
			self.next_to_flush += 1;
		}
		Ok(())
	}

	/// Returns the underlying writer. Any block still incomplete at this point is simply
	/// dropped, matching the de-interleaver's tolerance of missing cells.
	pub fn into_inner(self) -> W {
		self.inner
	}
}

/// Number of data bytes carried by one RS block under the given `ecc` level (0 is pass-through,
/// no parity).
pub fn rs_data_len(ecc: usize) -> usize {
	RS_BLOCK_SIZE - ecc
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn interleaved_writer_flushes_in_ascending_block_order() {
		let mut writer = InterleavedWriter::new(Vec::new(), 3, 2);
		// Fill block 1 first, then block 0, then block 2 — output must still read 0,1,2.
		writer.write_byte(1, b'c').unwrap();
		writer.write_byte(1, b'd').unwrap();
		writer.write_byte(0, b'a').unwrap();
		writer.write_byte(0, b'b').unwrap();
		writer.write_byte(2, b'e').unwrap();
		writer.write_byte(2, b'f').unwrap();
		let out = writer.into_inner();
		assert_eq!(out, b"abcdef");
	}

	#[test]
	fn incomplete_trailing_block_is_not_flushed() {
		let mut writer = InterleavedWriter::new(Vec::new(), 2, 2);
		writer.write_byte(0, b'a').unwrap();
		writer.write_byte(0, b'b').unwrap();
		writer.write_byte(1, b'c').unwrap();
		let out = writer.into_inner();
		assert_eq!(out, b"ab");
	}
}
