//! Short-lived bearer tokens minted by the token endpoint.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access token plus the instant it stops being valid.
///
/// Only the broker's token cache holds these; nothing persists them.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
	/// Bearer value; callers must avoid logging it.
	pub value: TokenSecret,
	/// Expiry reported by the token endpoint, relative to the exchange start.
	pub expires_at: OffsetDateTime,
}
impl AccessToken {
	/// Margin subtracted from the expiry before a token is considered stale.
	pub const SAFETY_MARGIN: Duration = Duration::seconds(15);

	/// Creates a token that expires at `expires_at`.
	pub fn new(value: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { value: TokenSecret::new(value), expires_at }
	}

	/// Bearer value, for building `Authorization` headers.
	pub fn expose(&self) -> &str {
		self.value.expose()
	}

	/// Expiry as Unix epoch seconds.
	pub fn expires_at_epoch_seconds(&self) -> i64 {
		self.expires_at.unix_timestamp()
	}

	/// `true` iff the token outlives `now` by more than `margin`.
	pub fn is_fresh_with_margin(&self, now: OffsetDateTime, margin: Duration) -> bool {
		self.expires_at > now + margin
	}

	/// [`AccessToken::is_fresh_with_margin`] using [`AccessToken::SAFETY_MARGIN`].
	pub fn is_fresh(&self, now: OffsetDateTime) -> bool {
		self.is_fresh_with_margin(now, Self::SAFETY_MARGIN)
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("value", &"<redacted>")
			.field("expires_at", &self.expires_at)
			.finish()
	}
}
