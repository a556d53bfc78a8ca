//! Process-wide request spacing for one external service.

// self
use crate::{_prelude::*, clock::Clock};

/// Serializes callers so consecutive dispatches are at least `min_interval` apart.
///
/// The slot timestamp is written when a caller is released, before its request goes out, so the
/// interval is measured between dispatches rather than between responses. Callers targeting a
/// different service need their own limiter.
pub struct RateLimiter {
	clock: Arc<dyn Clock>,
	min_interval: Duration,
	last_request_at: AsyncMutex<Option<OffsetDateTime>>,
}
impl RateLimiter {
	/// Spacing used when none is configured.
	pub const DEFAULT_MIN_INTERVAL: Duration = Duration::milliseconds(1_100);

	/// Creates a limiter with [`RateLimiter::DEFAULT_MIN_INTERVAL`].
	pub fn new(clock: Arc<dyn Clock>) -> Self {
		Self {
			clock,
			min_interval: Self::DEFAULT_MIN_INTERVAL,
			last_request_at: AsyncMutex::new(None),
		}
	}

	/// Overrides the spacing.
	pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
		self.min_interval = min_interval;

		self
	}

	/// Spacing enforced between dispatches.
	pub fn min_interval(&self) -> Duration {
		self.min_interval
	}

	/// Waits until the next dispatch slot is available and reserves it.
	pub async fn acquire(&self) {
		let mut last_request_at = self.last_request_at.lock().await;

		if let Some(previous) = *last_request_at {
			let elapsed = self.clock.now() - previous;

			if elapsed < self.min_interval {
				self.clock.sleep(self.min_interval - elapsed).await;
			}
		}

		*last_request_at = Some(self.clock.now());
	}
}
impl Debug for RateLimiter {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RateLimiter").field("min_interval", &self.min_interval).finish()
	}
}
