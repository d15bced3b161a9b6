//! Whole-page orchestration: wiring geometry, the byte pipeline, cell rendering/classification,
//! and deskew into the two entry points a caller actually needs.

use std::io::{Cursor, Read};

use image::{GrayImage, Luma, RgbImage};

use crate::cancel::CancelToken;
use crate::cell::{CimbDecoder, CimbEncoder};
use crate::constants::{
	BITS_PER_OP, CELLS_OFFSET, CELL_DIMENSIONS, CELL_SIZE, CELL_SPACING, EARLY_EXIT_DISTANCE, FOUNTAIN_BLOCKS, INTERLEAVE_BLOCKS,
	INTERLEAVE_PARTITIONS, RS_BLOCK_SIZE, TOTAL_SIZE, fountain_chunk_size,
};
use crate::deskew::{self, DeskewLevel, fiducial, preprocess};
use crate::error::CoreError;
use crate::geometry::{AdjacentCellFinder, FloodDecodeOrder, cell_positions};
use crate::palette::PaletteVariant;
use crate::pipeline::{
	BitFile, BitFileWriter, FountainDecoderStream, FountainEncoderStream, RsEncodeReader, interleave, interleave_reverse,
	rs_decode_block,
};

/// Renders `payload` (prefixed with its own 4-byte little-endian length, so decode can tell
/// real bytes from trailing zero padding) onto a canonical [`TOTAL_SIZE`] page.
///
/// `ecc` is the Reed-Solomon parity byte count per 155-byte block (`0` disables RS); `fountain`
/// wraps the framed payload in an unbounded fountain stream before RS so it can be spread
/// across, and recombined from, more than one page.
pub fn encode(payload: &[u8], variant: PaletteVariant, ecc: usize, fountain: bool) -> Result<RgbImage, CoreError> {
	let (_, post_rs_len, pre_rs_capacity) = page_capacity(ecc);
	let mut framed = frame_payload(payload);

	let stream_bytes = if fountain {
		let chunk_size = fountain_chunk_size(ecc);
		let fountain_capacity = FOUNTAIN_BLOCKS * chunk_size;
		if framed.len() > fountain_capacity {
			return Err(CoreError::StreamTruncated {
				expected: fountain_capacity as u32,
				actual: framed.len() as u32,
			});
		}
		let fountain_reader = FountainEncoderStream::new(Cursor::new(framed), FOUNTAIN_BLOCKS, chunk_size)?;
		let mut rs_reader = RsEncodeReader::new(fountain_reader, ecc);
		let mut buf = vec![0u8; post_rs_len];
		rs_reader.read_exact(&mut buf)?;
		buf
	} else {
		if framed.len() > pre_rs_capacity {
			return Err(CoreError::StreamTruncated {
				expected: pre_rs_capacity as u32,
				actual: framed.len() as u32,
			});
		}
		framed.resize(pre_rs_capacity, 0);
		let mut rs_reader = RsEncodeReader::new(Cursor::new(framed), ecc);
		let mut buf = vec![0u8; post_rs_len];
		rs_reader.read_exact(&mut buf)?;
		buf
	};

	Ok(render_page(&stream_bytes, variant))
}

/// Splits `payload` across `num_pages` distinct rendered pages, each carrying an independent
/// slice of the same endless fountain chunk stream. Recombining any sufficient subset of the
/// returned pages (via [`decode_pages`]) recovers the payload even if some pages are never
/// captured at all. `ecc` must be non-zero; fountain coding is meaningless without a Reed-Solomon
/// frame to carry its headers reliably.
pub fn encode_pages(payload: &[u8], variant: PaletteVariant, ecc: usize, num_pages: usize) -> Result<Vec<RgbImage>, CoreError> {
	let (_, post_rs_len, _) = page_capacity(ecc);
	let framed = frame_payload(payload);
	let chunk_size = fountain_chunk_size(ecc);
	let fountain_capacity = FOUNTAIN_BLOCKS * chunk_size;
	if framed.len() > fountain_capacity {
		return Err(CoreError::StreamTruncated {
			expected: fountain_capacity as u32,
			actual: framed.len() as u32,
		});
	}

	let mut fountain_reader = FountainEncoderStream::new(Cursor::new(framed), FOUNTAIN_BLOCKS, chunk_size)?;
	let mut pages = Vec::with_capacity(num_pages);
	for _ in 0..num_pages {
		let mut rs_reader = RsEncodeReader::new(&mut fountain_reader, ecc);
		let mut buf = vec![0u8; post_rs_len];
		rs_reader.read_exact(&mut buf)?;
		pages.push(render_page(&buf, variant));
	}
	Ok(pages)
}

/// `(num_rs_blocks, post_rs_len, pre_rs_capacity)` for one page's worth of cells at the given
/// `ecc`: how many RS blocks fit, the RS-encoded byte length, and the raw payload byte capacity
/// before RS parity is added.
fn page_capacity(ecc: usize) -> (usize, usize, usize) {
	let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
	let total_bits = cells.len() as u64 * BITS_PER_OP as u64;
	let page_byte_capacity = (total_bits / 8) as usize;
	let rs_data_len = RS_BLOCK_SIZE - ecc;
	let num_rs_blocks = page_byte_capacity / RS_BLOCK_SIZE;
	(num_rs_blocks, num_rs_blocks * RS_BLOCK_SIZE, num_rs_blocks * rs_data_len)
}

/// Prefixes `payload` with its own 4-byte little-endian length.
fn frame_payload(payload: &[u8]) -> Vec<u8> {
	let mut framed = Vec::with_capacity(4 + payload.len());
	framed.extend_from_slice(&(payload.len() as u32).to_le_bytes());
	framed.extend_from_slice(payload);
	framed
}

/// Bit-packs `stream_bytes` into the interleaved cell order and renders them onto a fresh
/// canonical page.
fn render_page(stream_bytes: &[u8], variant: PaletteVariant) -> RgbImage {
	let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
	let interleaved = interleave(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);

	let mut bits = BitFile::new(Cursor::new(stream_bytes.to_vec()), BITS_PER_OP, 4096);
	let mut canvas = fiducial::render_template(TOTAL_SIZE, variant);
	let cell_encoder = CimbEncoder::new(variant);

	for cell in &interleaved {
		let value = bits.read().ok().flatten().unwrap_or(0) as u8;
		let tile = cell_encoder.encode(value);
		image::imageops::overlay(&mut canvas, &tile, cell.x as i64, cell.y as i64);
	}

	canvas
}

/// Decodes `image` back into a payload, assuming it is already a canonical [`TOTAL_SIZE`] page
/// (`deskew_level` selects how much localization work to do first if it isn't).
pub fn decode(image: &RgbImage, variant: PaletteVariant, ecc: usize, fountain: bool, deskew_level: DeskewLevel) -> Result<Vec<u8>, CoreError> {
	decode_with_options(image, variant, ecc, fountain, deskew_level, false)
}

/// As [`decode`], but `force_preprocess` always runs the sharpening pass regardless of the
/// deskewed image's dimensions (the CLI's `--force-preprocess` flag).
pub fn decode_with_options(
	image: &RgbImage,
	variant: PaletteVariant,
	ecc: usize,
	fountain: bool,
	deskew_level: DeskewLevel,
	force_preprocess: bool,
) -> Result<Vec<u8>, CoreError> {
	decode_cancellable(image, variant, ecc, fountain, deskew_level, force_preprocess, &CancelToken::new())
}

/// As [`decode_with_options`], but polls `cancel` between flood-fill cells and between
/// Reed-Solomon blocks, returning [`CoreError::Cancelled`] as soon as it observes the signal.
#[allow(clippy::too_many_arguments)]
pub fn decode_cancellable(
	image: &RgbImage,
	variant: PaletteVariant,
	ecc: usize,
	fountain: bool,
	deskew_level: DeskewLevel,
	force_preprocess: bool,
	cancel: &CancelToken,
) -> Result<Vec<u8>, CoreError> {
	let rs_output = decode_page_to_rs_output(image, variant, deskew_level, force_preprocess, ecc, cancel)?;

	let framed = if fountain {
		let chunk_size = fountain_chunk_size(ecc);
		let mut fountain_writer = FountainDecoderStream::new(Vec::new(), FOUNTAIN_BLOCKS, chunk_size);
		std::io::Write::write_all(&mut fountain_writer, &rs_output)?;
		fountain_writer.finish()?
	} else {
		rs_output
	};

	frame_to_payload(&framed)
}

/// Decodes a payload that was split across several physical pages by [`encode_pages`].
///
/// Each page is run through the same per-page pipeline as [`decode`] (deskew, flood-fill,
/// Reed-Solomon), but instead of being unwrapped on its own, every page's RS output feeds a
/// single shared fountain decoder. A page that never arrives simply means fewer chunks are
/// available to the peeling decoder; as long as enough of the others did, the payload still
/// resolves. Returns [`CoreError::FountainIncomplete`] if the pages on hand do not carry enough
/// independent chunks yet.
pub fn decode_pages(images: &[RgbImage], variant: PaletteVariant, ecc: usize, deskew_level: DeskewLevel) -> Result<Vec<u8>, CoreError> {
	let cancel = CancelToken::new();
	let chunk_size = fountain_chunk_size(ecc);
	let mut fountain_writer = FountainDecoderStream::new(Vec::new(), FOUNTAIN_BLOCKS, chunk_size);
	for image in images {
		let rs_output = decode_page_to_rs_output(image, variant, deskew_level, false, ecc, &cancel)?;
		std::io::Write::write_all(&mut fountain_writer, &rs_output)?;
	}
	let framed = fountain_writer.finish()?;
	frame_to_payload(&framed)
}

/// Runs one page through deskew, flood-fill cell classification, and Reed-Solomon block
/// decoding, returning the raw (still fountain-wrapped, if applicable) RS output.
#[allow(clippy::too_many_arguments)]
fn decode_page_to_rs_output(
	image: &RgbImage,
	variant: PaletteVariant,
	deskew_level: DeskewLevel,
	force_preprocess: bool,
	ecc: usize,
	cancel: &CancelToken,
) -> Result<Vec<u8>, CoreError> {
	let deskewed = deskew::deskew(image, variant, deskew_level)?;

	// Scoped for the rest of this call: if trace logging is on, the warped page is dumped here
	// for forensics. The directory (and the dump, if any) is released on every exit path,
	// including the early returns below, once `_scratch` drops.
	let _scratch = tempfile::TempDir::new()?;
	if log::log_enabled!(log::Level::Trace) {
		let dump_path = _scratch.path().join("warped.png");
		match deskewed.image.save(&dump_path) {
			Ok(()) => log::trace!("dumped warped page to {}", dump_path.display()),
			Err(err) => log::trace!("failed to dump warped page to {}: {err}", dump_path.display()),
		}
	}

	let needs_sharpen = force_preprocess || deskewed.width < TOTAL_SIZE || deskewed.height < TOTAL_SIZE;
	let symbol_source = if needs_sharpen {
		gray_to_rgb(&preprocess::sharpen_and_grayscale(&deskewed.image))
	} else {
		deskewed.image.clone()
	};

	let cells = cell_positions(CELL_SPACING, CELL_DIMENSIONS, CELLS_OFFSET);
	let finder = AdjacentCellFinder::new(&cells, CELL_DIMENSIONS);
	let (lookup, _block_size) = interleave_reverse(&cells, INTERLEAVE_BLOCKS, INTERLEAVE_PARTITIONS);

	let cell_decoder = CimbDecoder::new(variant);
	let mut values = vec![0u8; cells.len()];

	let mut order = FloodDecodeOrder::new(&cells, &finder, CELL_DIMENSIONS);
	while let Some((index, (x, y), drift)) = order.next() {
		if cancel.is_cancelled() {
			return Err(CoreError::Cancelled);
		}
		let Some((distance, dx, dy, symbol)) =
			best_symbol(&cell_decoder, &symbol_source, x, y, drift.x, drift.y, &drift.pairs)
		else {
			continue;
		};
		order.update(drift.x + dx, drift.y + dy, distance);

		let color_bits = best_color(&cell_decoder, &deskewed.image, x, y, drift.x + dx, drift.y + dy);
		values[lookup[index]] = symbol | color_bits;
	}

	let mut writer = BitFileWriter::new(Vec::new(), BITS_PER_OP);
	for &value in &values {
		writer.write(value as u32)?;
	}
	let stream_bytes = writer.finish()?;

	let num_blocks = stream_bytes.len() / RS_BLOCK_SIZE;
	let mut rs_output = Vec::with_capacity(num_blocks * (RS_BLOCK_SIZE - ecc));
	for block in stream_bytes.chunks_exact(RS_BLOCK_SIZE).take(num_blocks) {
		if cancel.is_cancelled() {
			return Err(CoreError::Cancelled);
		}
		let (data, _ok) = rs_decode_block(block, ecc);
		rs_output.extend_from_slice(&data);
	}

	Ok(rs_output)
}

/// Strips the 4-byte little-endian length prefix a fully reassembled byte stream carries.
fn frame_to_payload(framed: &[u8]) -> Result<Vec<u8>, CoreError> {
	if framed.len() < 4 {
		return Err(CoreError::StreamTruncated {
			expected: 4,
			actual: framed.len() as u32,
		});
	}
	let len = u32::from_le_bytes(framed[0..4].try_into().unwrap()) as usize;
	let len = len.min(framed.len() - 4);
	Ok(framed[4..4 + len].to_vec())
}

#[allow(clippy::too_many_arguments)]
fn best_symbol(
	decoder: &CimbDecoder,
	source: &RgbImage,
	x: u32,
	y: u32,
	drift_x: i32,
	drift_y: i32,
	pairs: &[(i32, i32)],
) -> Option<(u32, i32, i32, u8)> {
	let (w, h) = source.dimensions();
	let mut best: Option<(u32, i32, i32, u8)> = None;

	for &(dx, dy) in pairs {
		let px = x as i64 + drift_x as i64 + dx as i64;
		let py = y as i64 + drift_y as i64 + dy as i64;
		if px < 0 || py < 0 || px as u32 + CELL_SIZE > w || py as u32 + CELL_SIZE > h {
			continue;
		}
		let patch = image::imageops::crop_imm(source, px as u32, py as u32, CELL_SIZE, CELL_SIZE);
		let (symbol, distance) = decoder.decode_symbol(&patch);
		let better = best.map(|(best_distance, ..)| distance < best_distance).unwrap_or(true);
		if better {
			best = Some((distance, dx, dy, symbol));
		}
		if distance < EARLY_EXIT_DISTANCE {
			break;
		}
	}
	best
}

fn best_color(decoder: &CimbDecoder, source: &RgbImage, x: u32, y: u32, dx: i32, dy: i32) -> u8 {
	let (w, h) = source.dimensions();
	let px = x as i64 + dx as i64 + 1;
	let py = y as i64 + dy as i64 + 1;
	let inset = CELL_SIZE - 2;
	if px < 0 || py < 0 || px as u32 + inset > w || py as u32 + inset > h {
		return 0;
	}
	let patch = image::imageops::crop_imm(source, px as u32, py as u32, inset, inset);
	decoder.decode_color(&patch)
}

fn gray_to_rgb(img: &GrayImage) -> RgbImage {
	RgbImage::from_fn(img.width(), img.height(), |x, y| {
		let Luma([v]) = *img.get_pixel(x, y);
		image::Rgb([v, v, v])
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trips_a_short_payload_with_no_ecc_no_fountain() {
		let payload = b"hello, cimbar";
		let img = encode(payload, PaletteVariant::Dark, 0, false).unwrap();
		let decoded = decode(&img, PaletteVariant::Dark, 0, false, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test]
	fn round_trips_with_ecc_enabled() {
		let payload = b"a payload long enough to span more than one reed-solomon block of data.";
		let img = encode(payload, PaletteVariant::Dark, 30, false).unwrap();
		let decoded = decode(&img, PaletteVariant::Dark, 30, false, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test]
	fn round_trips_with_light_palette() {
		let payload = b"light variant round trip";
		let img = encode(payload, PaletteVariant::Light, 0, false).unwrap();
		let decoded = decode(&img, PaletteVariant::Light, 0, false, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test]
	fn empty_payload_round_trips() {
		let img = encode(b"", PaletteVariant::Dark, 0, false).unwrap();
		let decoded = decode(&img, PaletteVariant::Dark, 0, false, DeskewLevel::Skip).unwrap();
		assert!(decoded.is_empty());
	}

	#[test]
	fn oversized_payload_without_fountain_is_rejected() {
		let huge = vec![0xABu8; 50_000];
		let result = encode(&huge, PaletteVariant::Dark, 30, false);
		assert!(matches!(result, Err(CoreError::StreamTruncated { .. })));
	}

	#[test_log::test]
	fn rs_corrects_scattered_byte_flips() {
		let payload = b"reed-solomon should repair a handful of flipped bytes across the page.";
		let mut img = encode(payload, PaletteVariant::Dark, 30, false).unwrap();
		// Flip a small cluster of pixels well inside the data area; RS parity should absorb it.
		for dy in 0..CELL_SIZE {
			for dx in 0..CELL_SIZE {
				let p = img.get_pixel_mut(200 + dx, 200 + dy);
				p.0 = [255 - p.0[0], 255 - p.0[1], 255 - p.0[2]];
			}
		}
		let decoded = decode(&img, PaletteVariant::Dark, 30, false, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test]
	fn oversized_payload_with_fountain_is_rejected_rather_than_silently_truncated() {
		let huge = vec![0xCDu8; 50_000];
		let result = encode(&huge, PaletteVariant::Dark, 30, true);
		assert!(matches!(result, Err(CoreError::StreamTruncated { .. })));
	}

	#[test]
	fn pages_round_trip_when_all_pages_are_present() {
		let payload = b"a payload spread across a handful of distinct fountain-coded pages.";
		let pages = encode_pages(payload, PaletteVariant::Dark, 30, 3).unwrap();
		assert_eq!(pages.len(), 3);
		let decoded = decode_pages(&pages, PaletteVariant::Dark, 30, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test_log::test]
	fn pages_round_trip_after_dropping_one_page() {
		// Enough surplus pages that even after dropping one, the remaining chunks carry far
		// more than the minimum needed to resolve every source block via peeling.
		let payload = b"dropping a page should still leave enough chunks to recover from.";
		let pages = encode_pages(payload, PaletteVariant::Dark, 30, 6).unwrap();
		let remaining: Vec<_> = pages[1..].to_vec();
		let decoded = decode_pages(&remaining, PaletteVariant::Dark, 30, DeskewLevel::Skip).unwrap();
		assert_eq!(decoded, payload);
	}

	#[test]
	fn decode_cancellable_stops_immediately_on_a_pre_cancelled_token() {
		let payload = b"cancellation should be observed before any cell is decoded";
		let img = encode(payload, PaletteVariant::Dark, 0, false).unwrap();
		let cancel = CancelToken::new();
		cancel.cancel();
		let result = decode_cancellable(&img, PaletteVariant::Dark, 0, false, DeskewLevel::Skip, false, &cancel);
		assert!(matches!(result, Err(CoreError::Cancelled)));
	}
}
