//! Injectable time source shared by caches, the rate limiter, and flows.

// self
use crate::_prelude::*;

/// Boxed future returned by [`Clock::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Time source plus suspension primitive.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current UTC instant.
	fn now(&self) -> OffsetDateTime;

	/// Suspends the caller for `duration`. Non-positive durations complete immediately.
	fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Wall clock backed by [`OffsetDateTime::now_utc`] and `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		Box::pin(async move {
			if duration.is_positive() {
				tokio::time::sleep(duration.unsigned_abs()).await;
			}
		})
	}
}

/// Deterministic clock for tests; [`Clock::sleep`] advances the clock instead of waiting.
#[derive(Clone, Debug)]
pub struct ManualClock {
	now: Arc<Mutex<OffsetDateTime>>,
	slept: Arc<Mutex<Duration>>,
}
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Arc::new(Mutex::new(start)), slept: Arc::new(Mutex::new(Duration::ZERO)) }
	}

	/// Moves the clock forward by `delta`.
	pub fn advance(&self, delta: Duration) {
		*self.now.lock() += delta;
	}

	/// Jumps the clock to `instant`.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.now.lock() = instant;
	}

	/// Total time spent in [`Clock::sleep`] so far.
	pub fn total_slept(&self) -> Duration {
		*self.slept.lock()
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock()
	}

	fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
		if duration.is_positive() {
			self.advance(duration);

			*self.slept.lock() += duration;
		}

		Box::pin(async {})
	}
}
