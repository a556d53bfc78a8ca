//! Release-year cache with differentiated TTLs for hits and confirmed misses.

// self
use crate::_prelude::*;

const SEPARATOR: &str = "::";

/// Normalized lookup key: `lower(trim(track)) :: lower(trim(artist)) :: lower(trim(isrc))`.
///
/// A track or artist containing `::` can collide with a different split of the same text.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct YearKey(String);
impl YearKey {
	/// Normalizes the inputs into a key; an absent ISRC becomes the empty string.
	pub fn new(track: &str, artist: &str, isrc: Option<&str>) -> Self {
		let normalize = |value: &str| value.trim().to_lowercase();

		Self(
			[normalize(track), normalize(artist), normalize(isrc.unwrap_or_default())]
				.join(SEPARATOR),
		)
	}

	/// Borrows the normalized key text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

/// Cached outcome of one resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearCacheEntry {
	/// Resolved year; `None` is a confirmed "not found".
	pub year: Option<i32>,
	/// Instant after which the entry is no longer trusted.
	pub expires_at: OffsetDateTime,
}
impl YearCacheEntry {
	/// `true` while `now` is before the expiry.
	pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at > now
	}

	/// Expiry as Unix epoch milliseconds.
	pub fn expires_at_epoch_millis(&self) -> i64 {
		(self.expires_at.unix_timestamp_nanos() / 1_000_000) as i64
	}
}

/// TTLs applied when storing a result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearCachePolicy {
	/// Lifetime of a resolved year.
	pub found_ttl: Duration,
	/// Lifetime of a "not found" result.
	pub missing_ttl: Duration,
}
impl YearCachePolicy {
	/// TTL for a result carrying `year`.
	pub fn ttl_for(&self, year: Option<i32>) -> Duration {
		if year.is_some() { self.found_ttl } else { self.missing_ttl }
	}
}
impl Default for YearCachePolicy {
	fn default() -> Self {
		Self { found_ttl: Duration::hours(24), missing_ttl: Duration::minutes(10) }
	}
}

/// Thread-safe release-year cache.
#[derive(Debug, Default)]
pub struct YearCache {
	policy: YearCachePolicy,
	entries: RwLock<HashMap<YearKey, YearCacheEntry>>,
}
impl YearCache {
	/// Creates an empty cache with `policy`.
	pub fn with_policy(policy: YearCachePolicy) -> Self {
		Self { policy, entries: Default::default() }
	}

	/// TTL policy in effect.
	pub fn policy(&self) -> YearCachePolicy {
		self.policy
	}

	/// Returns the stored entry for `key`, expired or not.
	pub fn get(&self, key: &YearKey) -> Option<YearCacheEntry> {
		self.entries.read().get(key).copied()
	}

	/// Returns the entry for `key` only if it is still live at `now`.
	pub fn get_live(&self, key: &YearKey, now: OffsetDateTime) -> Option<YearCacheEntry> {
		self.get(key).filter(|entry| entry.is_live_at(now))
	}

	/// Stores `year` for `key`, expiring one policy TTL after `now`.
	///
	/// Entries already expired at `now` are dropped in the same write.
	pub fn put(&self, key: YearKey, year: Option<i32>, now: OffsetDateTime) -> YearCacheEntry {
		let entry = YearCacheEntry { year, expires_at: now + self.policy.ttl_for(year) };
		let mut entries = self.entries.write();

		entries.retain(|_, existing| existing.is_live_at(now));
		entries.insert(key, entry);

		entry
	}

	/// Drops entries that expired at or before `now`; returns how many were removed.
	pub fn purge_expired(&self, now: OffsetDateTime) -> usize {
		let mut entries = self.entries.write();
		let before = entries.len();

		entries.retain(|_, entry| entry.is_live_at(now));

		before - entries.len()
	}

	/// Number of stored entries, live or expired.
	pub fn len(&self) -> usize {
		self.entries.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.entries.read().is_empty()
	}
}
