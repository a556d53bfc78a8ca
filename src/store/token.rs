//! Thread-safe in-memory access token cache.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CacheIdentity},
};

type TokenMap = RwLock<HashMap<CacheIdentity, AccessToken>>;

/// Access tokens keyed by the identity of the refresh credential that minted them.
#[derive(Debug, Default)]
pub struct TokenCache(TokenMap);
impl TokenCache {
	/// Returns the cached token for `identity`, fresh or not.
	pub fn get(&self, identity: &CacheIdentity) -> Option<AccessToken> {
		self.0.read().get(identity).cloned()
	}

	/// Returns the cached token for `identity` only if it is still fresh at `now`.
	pub fn get_fresh(&self, identity: &CacheIdentity, now: OffsetDateTime) -> Option<AccessToken> {
		self.get(identity).filter(|token| token.is_fresh(now))
	}

	/// Stores `token` under `identity`, replacing any previous entry.
	///
	/// Other entries that went stale before `now` are dropped in the same write.
	pub fn put(&self, identity: CacheIdentity, token: AccessToken, now: OffsetDateTime) {
		let mut map = self.0.write();

		map.retain(|_, existing| existing.is_fresh(now));
		map.insert(identity, token);
	}

	/// Number of cached entries.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
