//! Reed-Solomon over GF(2^8): a from-scratch systematic encoder/decoder (generator polynomial
//! `0x11D`), plus the streaming `Read`/`Write` adapters the byte pipeline wraps around the
//! fountain layer and the raw payload.
//!
//! Decoding uses the standard syndrome -> Berlekamp-Massey -> Chien search -> Forney chain. A
//! block with more symbol errors than `ecc / 2` can correct is reported via
//! [`CoreError::BlockUnrecoverable`] but its best-effort bytes are still returned, matching the
//! pass-through failure policy described in the pipeline's module docs.

use std::io::{self, Read, Write};

use crate::constants::RS_BLOCK_SIZE;
use crate::error::CoreError;

/// The field's generating primitive polynomial: `x^8 + x^4 + x^3 + x^2 + 1`.
const PRIMITIVE_POLY: u16 = 0x11D;

/// GF(2^8) exponential/logarithm tables, built once per [`Gf256`].
struct Gf256 {
	exp: [u8; 512],
	log: [u8; 256],
}

impl Gf256 {
	fn new() -> Self {
		let mut exp = [0u8; 512];
		let mut log = [0u8; 256];
		let mut x: u16 = 1;
		for i in 0..255usize {
			exp[i] = x as u8;
			log[x as usize] = i as u8;
			x <<= 1;
			if x & 0x100 != 0 {
				x ^= PRIMITIVE_POLY;
			}
		}
		for i in 255..512 {
			exp[i] = exp[i - 255];
		}
		Self {
			exp,
			log,
		}
	}

	fn mul(&self, a: u8, b: u8) -> u8 {
		if a == 0 || b == 0 {
			return 0;
		}
		self.exp[self.log[a as usize] as usize + self.log[b as usize] as usize]
	}

	fn div(&self, a: u8, b: u8) -> u8 {
		assert_ne!(b, 0, "division by zero in GF(2^8)");
		if a == 0 {
			return 0;
		}
		let diff = self.log[a as usize] as i32 - self.log[b as usize] as i32 + 255;
		self.exp[diff as usize % 255]
	}

	fn pow(&self, a: u8, power: i32) -> u8 {
		if a == 0 {
			return 0;
		}
		let e = (self.log[a as usize] as i32 * power).rem_euclid(255);
		self.exp[e as usize]
	}

	/// Multiplies two polynomials (coefficients highest-degree first).
	fn poly_mul(&self, a: &[u8], b: &[u8]) -> Vec<u8> {
		let mut out = vec![0u8; a.len() + b.len() - 1];
		for (i, &ai) in a.iter().enumerate() {
			if ai == 0 {
				continue;
			}
			for (j, &bj) in b.iter().enumerate() {
				out[i + j] ^= self.mul(ai, bj);
			}
		}
		out
	}

	/// Evaluates a polynomial (highest-degree first) at `x` via Horner's method.
	fn poly_eval(&self, poly: &[u8], x: u8) -> u8 {
		let mut result = poly[0];
		for &coeff in &poly[1..] {
			result = self.mul(result, x) ^ coeff;
		}
		result
	}

	/// Builds the RS generator polynomial `prod_{i=0}^{ecc-1} (x - alpha^i)`.
	fn generator(&self, ecc: usize) -> Vec<u8> {
		let mut g = vec![1u8];
		for i in 0..ecc {
			g = self.poly_mul(&g, &[1, self.pow(2, i as i32)]);
		}
		g
	}
}

/// Encodes a systematic RS codeword: `data` (length `155 - ecc`) followed by `ecc` parity
/// bytes, computed as the remainder of `data * x^ecc` divided by the generator polynomial.
pub fn encode_block(data: &[u8], ecc: usize) -> Vec<u8> {
	let gf = Gf256::new();
	let generator = gf.generator(ecc);
	let mut remainder = vec![0u8; data.len() + ecc];
	remainder[..data.len()].copy_from_slice(data);

	for i in 0..data.len() {
		let coeff = remainder[i];
		if coeff == 0 {
			continue;
		}
		for (j, &g) in generator.iter().enumerate() {
			remainder[i + j] ^= gf.mul(coeff, g);
		}
	}

	let mut out = Vec::with_capacity(data.len() + ecc);
	out.extend_from_slice(data);
	out.extend_from_slice(&remainder[data.len()..]);
	out
}

/// Decodes a systematic RS codeword of length `data_len + ecc`, correcting up to `ecc / 2`
/// byte errors. Returns the corrected data bytes and whether decoding succeeded; on failure
/// the best-effort (uncorrected) data bytes are still returned.
pub fn decode_block(codeword: &[u8], ecc: usize) -> (Vec<u8>, bool) {
	let gf = Gf256::new();
	let data_len = codeword.len() - ecc;

	if ecc == 0 {
		return (codeword.to_vec(), true);
	}

	// Codeword coefficients, highest-degree first, matching poly_eval's convention.
	let poly: Vec<u8> = codeword.to_vec();
	let syndromes: Vec<u8> = (0..ecc).map(|i| gf.poly_eval(&poly, gf.pow(2, i as i32))).collect();

	if syndromes.iter().all(|&s| s == 0) {
		return (codeword[..data_len].to_vec(), true);
	}

	let Some((locator, error_count)) = berlekamp_massey(&gf, &syndromes, ecc) else {
		return (codeword[..data_len].to_vec(), false);
	};
	if error_count > ecc / 2 {
		return (codeword[..data_len].to_vec(), false);
	}

	let Some(positions) = chien_search(&gf, &locator, codeword.len()) else {
		return (codeword[..data_len].to_vec(), false);
	};
	if positions.len() != error_count {
		return (codeword[..data_len].to_vec(), false);
	}

	let Some(magnitudes) = forney(&gf, &locator, &syndromes, &positions, codeword.len()) else {
		return (codeword[..data_len].to_vec(), false);
	};

	let mut corrected = codeword.to_vec();
	for (&pos, &mag) in positions.iter().zip(&magnitudes) {
		corrected[pos] ^= mag;
	}

	// Re-check: a locator of the "right" degree can still be a false solve if the syndromes
	// don't actually vanish against it (e.g. errors exceeded true correction capacity).
	let recheck: Vec<u8> = (0..ecc).map(|i| gf.poly_eval(&corrected, gf.pow(2, i as i32))).collect();
	if recheck.iter().any(|&s| s != 0) {
		return (codeword[..data_len].to_vec(), false);
	}

	(corrected[..data_len].to_vec(), true)
}

/// Berlekamp-Massey error-locator synthesis. Returns the locator polynomial (constant term
/// first, i.e. `sigma(x) = 1 + s1*x + s2*x^2 + ...`) and its degree (the error count), or
/// `None` if synthesis fails outright.
fn berlekamp_massey(gf: &Gf256, syndromes: &[u8], ecc: usize) -> Option<(Vec<u8>, usize)> {
	let mut c = vec![0u8; ecc + 1];
	let mut b = vec![0u8; ecc + 1];
	c[0] = 1;
	b[0] = 1;
	let mut l = 0usize;
	let mut m = 1i32;
	let mut bb = 1u8;

	for n in 0..ecc {
		let mut delta = syndromes[n];
		for i in 1..=l {
			delta ^= gf.mul(c[i], syndromes[n - i]);
		}
		if delta == 0 {
			m += 1;
		} else if 2 * l <= n {
			let t = c.clone();
			let coeff = gf.div(delta, bb);
			for i in 0..c.len() {
				let shifted = if i as i32 - m >= 0 { b[(i as i32 - m) as usize] } else { 0 };
				c[i] ^= gf.mul(coeff, shifted);
			}
			l = n + 1 - l;
			b = t;
			bb = delta;
			m = 1;
		} else {
			let coeff = gf.div(delta, bb);
			for i in 0..c.len() {
				let shifted = if i as i32 - m >= 0 { b[(i as i32 - m) as usize] } else { 0 };
				c[i] ^= gf.mul(coeff, shifted);
			}
			m += 1;
		}
	}

	c.truncate(l + 1);
	Some((c, l))
}

/// Finds the roots of the locator polynomial by brute-force evaluation at every nonzero field
/// element (Chien search), returning the corresponding error byte positions (index from the
/// start of the codeword).
fn chien_search(gf: &Gf256, locator: &[u8], codeword_len: usize) -> Option<Vec<usize>> {
	// `locator` is constant-term-first; `poly_eval` expects highest-degree-first.
	let reversed: Vec<u8> = locator.iter().rev().copied().collect();
	let mut positions = Vec::new();
	for i in 0..codeword_len {
		// Root at alpha^-i corresponds to an error at codeword position i (MSB-first indexing).
		let x = gf.pow(2, -(i as i32));
		if gf.poly_eval(&reversed, x) == 0 {
			positions.push(i);
		}
	}
	if positions.is_empty() { None } else { Some(positions) }
}

/// Forney's algorithm: computes the error magnitude at each located position.
fn forney(gf: &Gf256, locator: &[u8], syndromes: &[u8], positions: &[usize], codeword_len: usize) -> Option<Vec<u8>> {
	// Error evaluator: omega(x) = [S(x) * sigma(x)] mod x^ecc, both constant-term-first.
	let syndrome_poly: Vec<u8> = syndromes.to_vec();
	let mut product = vec![0u8; syndrome_poly.len() + locator.len() - 1];
	for (i, &si) in syndrome_poly.iter().enumerate() {
		if si == 0 {
			continue;
		}
		for (j, &lj) in locator.iter().enumerate() {
			product[i + j] ^= gf.mul(si, lj);
		}
	}
	let omega = &product[..syndrome_poly.len().min(product.len())];

	// sigma'(x): formal derivative, dropping even-power terms.
	let sigma_prime: Vec<u8> = locator.iter().enumerate().filter(|(i, _)| i % 2 == 1).map(|(_, &c)| c).collect();
	if sigma_prime.is_empty() {
		return None;
	}
	let sigma_prime_rev: Vec<u8> = sigma_prime.iter().rev().copied().collect();
	let omega_rev: Vec<u8> = omega.iter().rev().copied().collect();

	let mut magnitudes = Vec::with_capacity(positions.len());
	for &pos in positions {
		let x_inv = gf.pow(2, -(pos as i32));
		let num = gf.poly_eval(&omega_rev, x_inv);
		let den = gf.poly_eval(&sigma_prime_rev, x_inv);
		if den == 0 {
			return None;
		}
		// Error value at position `pos`, in terms of x^pos's coefficient: magnitude = x *
		// omega(x^-1) / sigma'(x^-1), with x = alpha^pos (binary fields: no sign needed).
		let x = gf.pow(2, pos as i32);
		magnitudes.push(gf.mul(x, gf.div(num, den)));
	}
	let _ = codeword_len;
	Some(magnitudes)
}

/// Adapts an underlying byte [`Read`] of raw payload data into a [`Read`] of RS-encoded
/// blocks: every `155 - ecc` bytes pulled from `inner` become a 155-byte codeword.
pub struct RsEncodeReader<R> {
	inner: R,
	ecc: usize,
	pending: Vec<u8>,
	pending_pos: usize,
	eof: bool,
}

impl<R: Read> RsEncodeReader<R> {
	/// Wraps `inner`, encoding every `RS_BLOCK_SIZE - ecc` bytes into an `RS_BLOCK_SIZE`-byte
	/// codeword.
	pub fn new(inner: R, ecc: usize) -> Self {
		Self {
			inner,
			ecc,
			pending: Vec::new(),
			pending_pos: 0,
			eof: false,
		}
	}

	fn refill(&mut self) -> io::Result<bool> {
		if self.eof {
			return Ok(false);
		}
		let data_len = RS_BLOCK_SIZE - self.ecc;
		let mut buf = vec![0u8; data_len];
		let mut filled = 0;
		while filled < data_len {
			let n = self.inner.read(&mut buf[filled..])?;
			if n == 0 {
				break;
			}
			filled += n;
		}
		if filled == 0 {
			self.eof = true;
			return Ok(false);
		}
		if filled < data_len {
			self.eof = true;
		}
		self.pending = encode_block(&buf, self.ecc);
		self.pending_pos = 0;
		Ok(true)
	}
}

impl<R: Read> Read for RsEncodeReader<R> {
	fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
		if self.pending_pos >= self.pending.len() && !self.refill()? {
			return Ok(0);
		}
		let available = &self.pending[self.pending_pos..];
		let n = available.len().min(buf.len());
		buf[..n].copy_from_slice(&available[..n]);
		self.pending_pos += n;
		Ok(n)
	}
}

/// Adapts an underlying byte [`Write`] into a [`Write`] that accepts RS-encoded 155-byte
/// blocks and writes their corrected, parity-stripped data bytes to `inner`.
pub struct RsDecodeWriter<W> {
	inner: W,
	ecc: usize,
	incoming: Vec<u8>,
	pass_through_failed: bool,
	block_index: usize,
}

impl<W: Write> RsDecodeWriter<W> {
	/// Wraps `inner`. When `pass_through_failed` is `true` (the default policy), a block that
	/// fails RS decoding still has its best-effort data bytes written downstream rather than
	/// the stream erroring out — the fountain layer may still recover the payload from other,
	/// successful blocks.
	pub fn new(inner: W, ecc: usize, pass_through_failed: bool) -> Self {
		Self {
			inner,
			ecc,
			incoming: Vec::new(),
			pass_through_failed,
			block_index: 0,
		}
	}

	fn drain_blocks(&mut self) -> io::Result<()> {
		while self.incoming.len() >= RS_BLOCK_SIZE {
			let block: Vec<u8> = self.incoming.drain(..RS_BLOCK_SIZE).collect();
			let (data, ok) = decode_block(&block, self.ecc);
			if !ok && !self.pass_through_failed {
				return Err(io::Error::other(CoreError::BlockUnrecoverable {
					block: self.block_index,
					errors: self.ecc / 2 + 1,
					capacity: self.ecc / 2,
				}));
			}
			self.inner.write_all(&data)?;
			self.block_index += 1;
		}
		Ok(())
	}
}

impl<W: Write> Write for RsDecodeWriter<W> {
	fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
		self.incoming.extend_from_slice(buf);
		self.drain_blocks()?;
		Ok(buf.len())
	}

	fn flush(&mut self) -> io::Result<()> {
		self.inner.flush()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_without_errors() {
		let data: Vec<u8> = (0..125u16).map(|i| (i % 256) as u8).collect();
		let encoded = encode_block(&data, 30);
		assert_eq!(encoded.len(), 155);
		let (decoded, ok) = decode_block(&encoded, 30);
		assert!(ok);
		assert_eq!(decoded, data);
	}

	#[test]
	fn corrects_errors_within_capacity() {
		let data: Vec<u8> = (0..125u16).map(|i| (i * 3 % 256) as u8).collect();
		let mut encoded = encode_block(&data, 30);
		for pos in [0usize, 10, 50, 100, 140] {
			encoded[pos] ^= 0xFF;
		}
		let (decoded, ok) = decode_block(&encoded, 30);
		assert!(ok, "should correct 5 errors within ecc/2=15 capacity");
		assert_eq!(decoded, data);
	}

	#[test]
	fn ecc_zero_is_pass_through() {
		let data = vec![1u8, 2, 3, 4, 5];
		let encoded = encode_block(&data, 0);
		assert_eq!(encoded, data);
		let (decoded, ok) = decode_block(&encoded, 0);
		assert!(ok);
		assert_eq!(decoded, data);
	}

	#[test]
	fn excessive_errors_are_flagged_unrecoverable() {
		let data: Vec<u8> = (0..125u16).map(|i| (i % 256) as u8).collect();
		let mut encoded = encode_block(&data, 30);
		for pos in 0..40 {
			encoded[pos] ^= 0xFF;
		}
		let (_, ok) = decode_block(&encoded, 30);
		assert!(!ok);
	}
}
