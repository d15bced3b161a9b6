//! Unified error type for the codec core.

use thiserror::Error;

/// Errors that can occur anywhere in the encode/decode pipeline.
#[derive(Debug, Error)]
pub enum CoreError {
	/// The deskewer could not locate one or more of the four anchor fiducials.
	#[error("anchor fiducial not found: {0}")]
	AnchorNotFound(&'static str),

	/// The four detected anchor centers do not admit a non-degenerate homography
	/// (e.g. three or more are collinear).
	#[error("homography is degenerate for the detected anchor points")]
	HomographyDegenerate,

	/// A Reed-Solomon block had more symbol errors than `ecc / 2` could correct.
	///
	/// Non-fatal: the caller (the fountain layer, or the raw stream) receives the
	/// block's best-effort bytes and may still recover the payload.
	#[error("reed-solomon block {block} unrecoverable: {errors} errors exceed capacity {capacity}")]
	BlockUnrecoverable {
		/// Index of the unrecoverable block.
		block: usize,
		/// Number of symbol errors detected.
		errors: usize,
		/// Maximum correctable errors (`ecc / 2`).
		capacity: usize,
	},

	/// The fountain decoder has not yet collected enough independent chunks to
	/// invert the generator. Non-fatal: more pages may complete it.
	#[error("fountain decode incomplete: {resolved}/{total} source blocks resolved")]
	FountainIncomplete {
		/// Source blocks resolved so far.
		resolved: usize,
		/// Total source blocks required.
		total: usize,
	},

	/// The underlying byte stream ended before a full group of bits could be read.
	#[error("bit stream truncated: expected {expected} bits, got {actual}")]
	StreamTruncated {
		/// Bits expected for a full group.
		expected: u32,
		/// Bits actually available.
		actual: u32,
	},

	/// A classified color did not land near any palette entry within tolerance.
	///
	/// Non-fatal: the nearest palette entry is used regardless.
	#[error("classified color is not close to any palette entry")]
	PaletteMismatch,

	/// Underlying I/O failure.
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Underlying image decode/encode failure.
	#[error(transparent)]
	Image(#[from] image::ImageError),

	/// The caller's [`crate::cancel::CancelToken`] was signaled before decode finished.
	#[error("decode cancelled")]
	Cancelled,
}
