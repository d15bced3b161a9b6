//! Per-cell encode/decode: packing a cell's symbol and color bits into a rendered tile, and
//! classifying a rendered tile back into bits.
//!
//! A cell's ink/no-ink pattern (how far each pixel sits from the page background, regardless of
//! which palette color was chosen) carries the symbol bits; the color itself carries the color
//! bits. This keeps [`CimbDecoder::decode_symbol`] insensitive to hue, so a drifting white
//! balance during a photograph round-trip degrades color classification long before it touches
//! the symbol.

use image::{GenericImage, GenericImageView, GrayImage, Luma, RgbImage};

use crate::constants::{BITS_PER_SYMBOL, CELL_SIZE};
use crate::icon::IconSet;
use crate::palette::{Color, Palette, PaletteVariant};

const SYMBOL_MASK: u8 = (1 << BITS_PER_SYMBOL) - 1;

/// Minimum squared RGB distance from the page background for a pixel to count as "ink" rather
/// than background, when binarizing a cell for symbol classification.
///
/// Chosen well below the smallest actual ink/background separation either built-in palette
/// produces (tens of thousands, since at least one RGB channel swings the full 0..255 range
/// between background and palette ink) and well above ordinary photograph noise.
const INK_DISTANCE_THRESHOLD_SQ: u32 = 128 * 128;

/// Renders a cell's bits (symbol in the low [`BITS_PER_SYMBOL`](crate::constants::BITS_PER_SYMBOL)
/// bits, color in the bits above it) into an icon tile, and owns the icon set and palette used
/// to do it.
pub struct CimbEncoder {
	icons: IconSet,
	palette: Palette,
	background: Color,
}

impl CimbEncoder {
	/// Builds an encoder for the given palette variant.
	pub fn new(variant: PaletteVariant) -> Self {
		Self {
			icons: IconSet::default(),
			palette: Palette::for_variant(variant),
			background: variant.background(),
		}
	}

	/// Renders `bits` as a `CELL_SIZE x CELL_SIZE` RGB tile: the icon for the symbol bits, in
	/// the palette color for the color bits, against the variant's background.
	pub fn encode(&self, bits: u8) -> RgbImage {
		let symbol = bits & SYMBOL_MASK;
		let color_index = bits >> BITS_PER_SYMBOL;
		let color = self.palette.get(color_index);
		let tile = self.icons.tile(symbol);

		let mut out = RgbImage::new(CELL_SIZE, CELL_SIZE);
		for (x, y, pixel) in tile.enumerate_pixels() {
			let rgb = if pixel.0[0] > 127 { color } else { self.background };
			out.put_pixel(x, y, rgb.into());
		}
		out
	}
}

/// Classifies a rendered cell tile back into its symbol and color bits.
pub struct CimbDecoder {
	icons: IconSet,
	palette: Palette,
	background: Color,
}

impl CimbDecoder {
	/// Builds a decoder for the given palette variant.
	pub fn new(variant: PaletteVariant) -> Self {
		Self {
			icons: IconSet::default(),
			palette: Palette::for_variant(variant),
			background: variant.background(),
		}
	}

	/// Classifies `cell` (an RGB view of a `CELL_SIZE x CELL_SIZE` tile) against the icon set
	/// by its brightness pattern, returning the symbol bits and the sum-of-absolute-differences
	/// distance of the best match.
	///
	/// The reference icon bitmaps are binary (ink/no-ink); `cell` is binarized the same way
	/// before matching, by distance from the page background rather than raw brightness, so
	/// this works the same whether ink is brighter than the background (`Dark`) or darker
	/// (`Light`).
	pub fn decode_symbol<I>(&self, cell: &I) -> (u8, u32)
	where
		I: GenericImageView<Pixel = image::Rgb<u8>>,
	{
		self.icons.classify(&value_image(cell, self.background))
	}

	/// Classifies the dominant color of `cell` (ideally cropped a pixel or two in from the
	/// tile edge to avoid anti-aliasing) against the palette, returning the color bits shifted
	/// into position above the symbol bits.
	pub fn decode_color<I>(&self, cell: &I) -> u8
	where
		I: GenericImageView<Pixel = image::Rgb<u8>>,
	{
		let (mut r, mut g, mut b, mut n) = (0u64, 0u64, 0u64, 0u64);
		for (_, _, pixel) in cell.pixels() {
			r += pixel.0[0] as u64;
			g += pixel.0[1] as u64;
			b += pixel.0[2] as u64;
			n += 1;
		}
		let mean = Color::new((r / n.max(1)) as u8, (g / n.max(1)) as u8, (b / n.max(1)) as u8);
		let (index, _) = self.palette.nearest(mean);
		index << BITS_PER_SYMBOL
	}
}

/// Binarizes `cell` against `background`: a pixel reads as ink (255) if it's far enough from
/// the background color, or as background (0) otherwise.
fn value_image<I>(cell: &I, background: Color) -> GrayImage
where
	I: GenericImageView<Pixel = image::Rgb<u8>>,
{
	GrayImage::from_fn(cell.width(), cell.height(), |x, y| {
		let p = cell.get_pixel(x, y);
		let color = Color::new(p.0[0], p.0[1], p.0[2]);
		let ink = color.distance_sq(&background) > INK_DISTANCE_THRESHOLD_SQ;
		Luma([if ink { 255 } else { 0 }])
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::constants::BITS_PER_OP;

	#[test]
	fn encode_then_classify_symbol_recovers_bits() {
		let encoder = CimbEncoder::new(PaletteVariant::Dark);
		let decoder = CimbDecoder::new(PaletteVariant::Dark);

		for bits in 0..(1u8 << BITS_PER_OP) {
			let tile = encoder.encode(bits);
			let (symbol, distance) = decoder.decode_symbol(&tile);
			assert_eq!(symbol, bits & SYMBOL_MASK);
			assert_eq!(distance, 0, "bits {bits} should classify exactly");
		}
	}

	#[test]
	fn encode_then_classify_symbol_recovers_bits_on_light_background() {
		let encoder = CimbEncoder::new(PaletteVariant::Light);
		let decoder = CimbDecoder::new(PaletteVariant::Light);

		for bits in 0..(1u8 << BITS_PER_OP) {
			let tile = encoder.encode(bits);
			let (symbol, distance) = decoder.decode_symbol(&tile);
			assert_eq!(symbol, bits & SYMBOL_MASK);
			assert_eq!(distance, 0, "bits {bits} should classify exactly");
		}
	}

	#[test]
	fn encode_then_decode_color_recovers_bits() {
		let encoder = CimbEncoder::new(PaletteVariant::Dark);
		let decoder = CimbDecoder::new(PaletteVariant::Dark);

		for bits in 0..(1u8 << BITS_PER_OP) {
			let tile = encoder.encode(bits);
			let cropped = image::imageops::crop_imm(&tile, 1, 1, CELL_SIZE - 2, CELL_SIZE - 2).to_image();
			let color_bits = decoder.decode_color(&cropped);
			assert_eq!(color_bits, bits & !SYMBOL_MASK);
		}
	}

	#[test]
	fn light_variant_uses_white_background() {
		let encoder = CimbEncoder::new(PaletteVariant::Light);
		// Symbol 0 has every interior cell off; (2, 2) falls in the top-left interior cell.
		let tile = encoder.encode(0);
		assert_eq!(*tile.get_pixel(2, 2), image::Rgb([255, 255, 255]));
	}
}
