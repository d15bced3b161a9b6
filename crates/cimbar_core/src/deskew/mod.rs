//! Deskew / localization front end: recovering a canonical [`crate::constants::TOTAL_SIZE`]
//! square page from a photographed image via anchor detection, homography, and optional
//! dewarp.

mod anchor;
pub(crate) mod dewarp;
pub(crate) mod fiducial;
pub(crate) mod homography;
pub mod preprocess;

use image::RgbImage;

pub use anchor::{AnchorPoints, detect as detect_anchors};
pub use fiducial::Corner;
pub use homography::Homography;

use crate::constants::TOTAL_SIZE;
use crate::error::CoreError;
use crate::palette::PaletteVariant;

/// How much of the deskew pipeline to run. Levels exist so test harnesses can bypass stages
/// that would otherwise require a real photographed image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeskewLevel {
	/// Skip deskew entirely: the input is assumed already canonical.
	Skip,
	/// Anchor detection and perspective warp only.
	Homography,
	/// Homography, plus guide-bar-driven nonlinear dewarp.
	Dewarp,
}

impl DeskewLevel {
	/// Parses the `--deskew <0-2>` CLI convention.
	pub fn from_level(level: u8) -> Self {
		match level {
			0 => Self::Skip,
			1 => Self::Homography,
			_ => Self::Dewarp,
		}
	}
}

/// The outcome of a deskew pass: the recovered (or passed-through) canonical image, plus its
/// effective dimensions before any implicit resize — used by the caller to decide whether the
/// sharpening preprocess should be forced on.
#[derive(Debug, Clone)]
pub struct DeskewResult {
	/// The canonical image.
	pub image: RgbImage,
	/// Width of the warped image, before being reported to the caller.
	pub width: u32,
	/// Height of the warped image, before being reported to the caller.
	pub height: u32,
}

/// Recovers a canonical page from `src` at the requested `level`.
///
/// `variant` selects which palette's background/ink colors seed the homography warp's
/// out-of-bounds fill and the anchor bullseye reference.
pub fn deskew(src: &RgbImage, variant: PaletteVariant, level: DeskewLevel) -> Result<DeskewResult, CoreError> {
	if level == DeskewLevel::Skip {
		let (width, height) = src.dimensions();
		return Ok(DeskewResult {
			image: src.clone(),
			width,
			height,
		});
	}

	let detected = detect_anchors(src)?;
	let canonical: AnchorPoints = Corner::ALL.map(|c| c.center(TOTAL_SIZE));
	let src_to_dst = Homography::from_correspondences(detected, canonical)?;
	let dst_to_src = src_to_dst.invert()?;
	let warped = homography::warp_perspective(src, &dst_to_src, TOTAL_SIZE, TOTAL_SIZE, variant.background());

	let image = if level == DeskewLevel::Dewarp { dewarp::correct(&warped) } else { warped };

	Ok(DeskewResult {
		image,
		width: TOTAL_SIZE,
		height: TOTAL_SIZE,
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skip_level_is_a_no_op() {
		let img = fiducial::render_template(1024, PaletteVariant::Dark);
		let result = deskew(&img, PaletteVariant::Dark, DeskewLevel::Skip).unwrap();
		assert_eq!(result.image.as_raw(), img.as_raw());
	}

	#[test]
	fn homography_level_recovers_an_already_canonical_page() {
		let img = fiducial::render_template(1024, PaletteVariant::Dark);
		let result = deskew(&img, PaletteVariant::Dark, DeskewLevel::Homography).unwrap();
		assert_eq!(result.image.dimensions(), (1024, 1024));

		// Corner anchor blocks should still read as dark/ink in roughly the same place.
		let (ox, oy) = Corner::TopLeft.origin(1024);
		assert_ne!(result.image.get_pixel(ox + 9, oy + 9), result.image.get_pixel(512, 512));
	}
}
