//! Cooperative cancellation: a cheaply cloneable flag the decode BFS and stream pipeline poll
//! between cells/blocks.
//!
//! The core has no suspension points of its own, so it cannot be cancelled preemptively; a
//! caller running a page decode on a background thread signals [`CancelToken::cancel`] and the
//! in-flight `decode` call observes it at the next cell boundary, returning
//! [`crate::error::CoreError::Cancelled`]. Timeouts are the caller's responsibility — wrap the
//! call in whatever deadline mechanism fits the embedding application and cancel on expiry.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A handle that can be cloned and shared across threads to request cancellation of an
/// in-progress decode.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
	flag: Arc<AtomicBool>,
}

impl CancelToken {
	/// Builds a fresh, not-yet-cancelled token.
	pub fn new() -> Self {
		Self::default()
	}

	/// Requests cancellation. Idempotent.
	pub fn cancel(&self) {
		self.flag.store(true, Ordering::Relaxed);
	}

	/// Returns `true` if [`Self::cancel`] has been called on this token or any of its clones.
	pub fn is_cancelled(&self) -> bool {
		self.flag.load(Ordering::Relaxed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn fresh_token_is_not_cancelled() {
		assert!(!CancelToken::new().is_cancelled());
	}

	#[test]
	fn cancelling_a_clone_is_observed_by_the_original() {
		let token = CancelToken::new();
		let clone = token.clone();
		clone.cancel();
		assert!(token.is_cancelled());
	}
}
