//! Bit-granularity view over a byte stream: reads/writes fixed-width groups of bits,
//! MSB-first, regardless of where a group's boundary falls inside a byte.

use std::io::{self, Read, Write};

/// Reads fixed-width bit groups out of an underlying byte reader, MSB first.
///
/// Buffers bytes from the reader in chunks of `read_size` and serves `bits_per_op`-wide groups
/// out of an internal bit accumulator, the same big-endian bit-buffer technique the rest of
/// this codebase's hand-rolled codecs use for their own bitstreams.
pub struct BitFile<R> {
	reader: R,
	read_size: usize,
	bits_per_op: u32,
	bit_buffer: u64,
	bits_in_buffer: u32,
	chunk: Vec<u8>,
	chunk_pos: usize,
	chunk_len: usize,
	eof: bool,
}

impl<R: Read> BitFile<R> {
	/// Wraps `reader`, serving groups of `bits_per_op` bits at a time, pulling `read_size`
	/// bytes from the underlying reader at a time.
	pub fn new(reader: R, bits_per_op: u32, read_size: usize) -> Self {
		assert!(bits_per_op > 0 && bits_per_op <= 32, "bits_per_op must be in 1..=32");
		Self {
			reader,
			read_size: read_size.max(1),
			bits_per_op,
			bit_buffer: 0,
			bits_in_buffer: 0,
			chunk: vec![0u8; read_size.max(1)],
			chunk_pos: 0,
			chunk_len: 0,
			eof: false,
		}
	}

	fn refill_chunk(&mut self) -> io::Result<()> {
		if self.chunk_pos >= self.chunk_len && !self.eof {
			self.chunk_len = self.reader.read(&mut self.chunk[..self.read_size])?;
			self.chunk_pos = 0;
			if self.chunk_len == 0 {
				self.eof = true;
			}
		}
		Ok(())
	}

	/// Reads the next `bits_per_op`-wide group. Returns `Ok(None)` once the underlying reader
	/// and the bit accumulator are both exhausted; the final group is zero-padded on the low
	/// end if the stream's bit length isn't a multiple of `bits_per_op`.
	pub fn read(&mut self) -> io::Result<Option<u32>> {
		while self.bits_in_buffer < self.bits_per_op {
			self.refill_chunk()?;
			if self.chunk_pos >= self.chunk_len {
				if self.bits_in_buffer == 0 {
					return Ok(None);
				}
				let shift = self.bits_per_op - self.bits_in_buffer;
				let value = (self.bit_buffer << shift) as u32 & mask(self.bits_per_op);
				self.bits_in_buffer = 0;
				self.bit_buffer = 0;
				return Ok(Some(value));
			}
			let byte = self.chunk[self.chunk_pos];
			self.chunk_pos += 1;
			self.bit_buffer = (self.bit_buffer << 8) | u64::from(byte);
			self.bits_in_buffer += 8;
		}

		let shift = self.bits_in_buffer - self.bits_per_op;
		let value = (self.bit_buffer >> shift) as u32 & mask(self.bits_per_op);
		self.bits_in_buffer -= self.bits_per_op;
		self.bit_buffer &= (1u64 << self.bits_in_buffer) - 1;
		Ok(Some(value))
	}
}

fn mask(bits: u32) -> u32 {
	if bits >= 32 {
		u32::MAX
	} else {
		(1u32 << bits) - 1
	}
}

/// Packs fixed-width bit groups into bytes and writes them to an underlying byte writer,
/// MSB first.
pub struct BitFileWriter<W> {
	writer: W,
	bits_per_op: u32,
	bit_buffer: u64,
	bits_in_buffer: u32,
}

impl<W: Write> BitFileWriter<W> {
	/// Wraps `writer`, accepting groups of `bits_per_op` bits at a time.
	pub fn new(writer: W, bits_per_op: u32) -> Self {
		assert!(bits_per_op > 0 && bits_per_op <= 32, "bits_per_op must be in 1..=32");
		Self {
			writer,
			bits_per_op,
			bit_buffer: 0,
			bits_in_buffer: 0,
		}
	}

	/// Appends one `bits_per_op`-wide group, flushing whole bytes out as they fill.
	pub fn write(&mut self, value: u32) -> io::Result<()> {
		self.bit_buffer = (self.bit_buffer << self.bits_per_op) | u64::from(value & mask(self.bits_per_op));
		self.bits_in_buffer += self.bits_per_op;

		while self.bits_in_buffer >= 8 {
			let shift = self.bits_in_buffer - 8;
			let byte = (self.bit_buffer >> shift) as u8;
			self.writer.write_all(&[byte])?;
			self.bits_in_buffer -= 8;
			self.bit_buffer &= (1u64 << self.bits_in_buffer) - 1;
		}
		Ok(())
	}

	/// Flushes any partial trailing byte, zero-padded on the low end, and returns the
	/// underlying writer.
	pub fn finish(mut self) -> io::Result<W> {
		if self.bits_in_buffer > 0 {
			let byte = (self.bit_buffer << (8 - self.bits_in_buffer)) as u8;
			self.writer.write_all(&[byte])?;
			self.bits_in_buffer = 0;
		}
		self.writer.flush()?;
		Ok(self.writer)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Cursor;

	#[test]
	fn round_trips_arbitrary_bit_widths() {
		for bits_per_op in [1u32, 3, 6, 8, 12] {
			let groups: Vec<u32> = (0..50).map(|i| (i * 7) % (1 << bits_per_op)).collect();

			let mut writer = BitFileWriter::new(Vec::new(), bits_per_op);
			for &g in &groups {
				writer.write(g).unwrap();
			}
			let bytes = writer.finish().unwrap();

			let mut reader = BitFile::new(Cursor::new(bytes), bits_per_op, 4096);
			for &expected in &groups {
				assert_eq!(reader.read().unwrap(), Some(expected));
			}
		}
	}

	#[test]
	fn read_returns_none_past_eof() {
		let mut reader = BitFile::new(Cursor::new(Vec::<u8>::new()), 6, 16);
		assert_eq!(reader.read().unwrap(), None);
	}

	#[test]
	fn small_read_chunks_still_reconstruct_bytes() {
		let mut writer = BitFileWriter::new(Vec::new(), 6);
		for v in [1u32, 2, 3, 4, 5] {
			writer.write(v).unwrap();
		}
		let bytes = writer.finish().unwrap();

		let mut reader = BitFile::new(Cursor::new(bytes), 6, 1);
		let mut out = Vec::new();
		while let Some(v) = reader.read().unwrap() {
			out.push(v);
		}
		assert_eq!(out, vec![1, 2, 3, 4, 5, 0]);
	}
}
