//! Color palettes for the four-color cell encoding.
//!
//! Each cell carries [`crate::constants::BITS_PER_COLOR`] bits as one of four palette colors,
//! on top of the icon symbol. Two fixed variants are supported — `Dark` (data area rendered
//! on a black background) and `Light` (on white) — plus an offline [`kmeans`] calibration
//! routine for deriving a palette from a photographed sample instead of the fixed defaults.

pub mod kmeans;

use std::fmt;

use crate::error::CoreError;

/// An RGB color classified against / rendered from a [`Palette`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
	/// Red component.
	pub r: u8,
	/// Green component.
	pub g: u8,
	/// Blue component.
	pub b: u8,
}

impl Color {
	/// Builds a color from its components.
	pub const fn new(r: u8, g: u8, b: u8) -> Self {
		Self {
			r,
			g,
			b,
		}
	}

	/// Squared Euclidean distance to another color in RGB space.
	///
	/// Squared (not rooted) because every caller only compares distances against each other,
	/// never against an absolute threshold.
	pub fn distance_sq(&self, other: &Color) -> u32 {
		let dr = self.r as i32 - other.r as i32;
		let dg = self.g as i32 - other.g as i32;
		let db = self.b as i32 - other.b as i32;
		(dr * dr + dg * dg + db * db) as u32
	}
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
	}
}

impl From<image::Rgb<u8>> for Color {
	fn from(rgb: image::Rgb<u8>) -> Self {
		Self::new(rgb.0[0], rgb.0[1], rgb.0[2])
	}
}

impl From<Color> for image::Rgb<u8> {
	fn from(c: Color) -> Self {
		image::Rgb([c.r, c.g, c.b])
	}
}

/// Which background the data area is rendered against.
///
/// `Dark` packs slightly more contrast into print/photograph round-trips, since ambient light
/// tends to wash out a light background before it washes out a dark one; `Light` is easier to
/// proofread on-screen. Both carry the same four-color data palette otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteVariant {
	/// Data area rendered on a black background.
	Dark,
	/// Data area rendered on a white background.
	Light,
}

impl PaletteVariant {
	/// The background fill color for this variant.
	pub const fn background(self) -> Color {
		match self {
			Self::Dark => Color::new(0, 0, 0),
			Self::Light => Color::new(255, 255, 255),
		}
	}

	/// The fiducial ink color for this variant: the opposite of [`PaletteVariant::background`]
	/// so anchors and guides stay maximally separable from the page background.
	pub const fn ink(self) -> Color {
		match self {
			Self::Dark => Color::new(255, 255, 255),
			Self::Light => Color::new(0, 0, 0),
		}
	}
}

/// Four colors addressed by a 2-bit index, used to carry [`crate::constants::BITS_PER_COLOR`]
/// bits per cell on top of the icon symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
	colors: [Color; 4],
}

impl Palette {
	/// Builds a palette from four explicit colors, indexed `0..4`.
	pub const fn new(colors: [Color; 4]) -> Self {
		Self {
			colors,
		}
	}

	/// The fixed default palette for a variant.
	///
	/// Chosen for maximum pairwise RGB separation so classification tolerates the color drift
	/// introduced by print-and-photograph round trips.
	pub const fn for_variant(variant: PaletteVariant) -> Self {
		match variant {
			PaletteVariant::Dark => Self::new([
				Color::new(0, 255, 0),
				Color::new(0, 0, 255),
				Color::new(255, 255, 0),
				Color::new(255, 0, 0),
			]),
			PaletteVariant::Light => Self::new([
				Color::new(0, 200, 0),
				Color::new(0, 0, 200),
				Color::new(200, 200, 0),
				Color::new(200, 0, 0),
			]),
		}
	}

	/// The color at `index` (`0..4`).
	pub fn get(&self, index: u8) -> Color {
		self.colors[index as usize & 0b11]
	}

	/// All four colors, in index order.
	pub fn colors(&self) -> &[Color; 4] {
		&self.colors
	}

	/// Classifies `sample` as the nearest palette index, returning the index and the squared
	/// distance to the chosen color.
	///
	/// The distance is surfaced (rather than swallowed) so callers can decide for themselves
	/// whether a poor match should become a [`CoreError::PaletteMismatch`].
	pub fn nearest(&self, sample: Color) -> (u8, u32) {
		self.colors
			.iter()
			.enumerate()
			.map(|(i, c)| (i as u8, sample.distance_sq(c)))
			.min_by_key(|&(_, d)| d)
			.expect("palette always has four colors")
	}

	/// Classifies `sample`, returning an error if even the nearest color is implausibly far.
	pub fn classify(&self, sample: Color, tolerance: u32) -> Result<u8, CoreError> {
		let (index, distance) = self.nearest(sample);
		if distance > tolerance {
			Err(CoreError::PaletteMismatch)
		} else {
			Ok(index)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nearest_picks_exact_match() {
		let palette = Palette::for_variant(PaletteVariant::Dark);
		for (i, &color) in palette.colors().iter().enumerate() {
			let (index, distance) = palette.nearest(color);
			assert_eq!(index as usize, i);
			assert_eq!(distance, 0);
		}
	}

	#[test]
	fn classify_rejects_out_of_tolerance_sample() {
		let palette = Palette::for_variant(PaletteVariant::Dark);
		let far = Color::new(128, 128, 128);
		assert!(palette.classify(far, 10).is_err());
		assert!(palette.classify(far, 1_000_000).is_ok());
	}

	#[test]
	fn dark_and_light_variants_differ() {
		assert_ne!(Palette::for_variant(PaletteVariant::Dark), Palette::for_variant(PaletteVariant::Light));
	}
}
