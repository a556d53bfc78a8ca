//! Cache identities for access tokens.
//!
//! The configured credential owns one global slot. Per-user credentials are keyed by a short
//! one-way digest so the raw refresh token never doubles as a map key.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

const DIGEST_HEX_LEN: usize = 16;

/// Identity of the refresh credential an access token was minted from.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum CacheIdentity {
	/// Server-wide credential loaded from configuration.
	Configured,
	/// Per-user credential, identified by a truncated SHA-256 hex digest.
	User(String),
}
impl CacheIdentity {
	/// Derives the identity of a per-user refresh credential.
	pub fn for_refresh_token(refresh_token: &TokenSecret) -> Self {
		Self::User(short_digest(refresh_token.expose()))
	}
}
impl Debug for CacheIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Configured => f.write_str("CacheIdentity::Configured"),
			Self::User(digest) => write!(f, "CacheIdentity::User({digest})"),
		}
	}
}

fn short_digest(value: &str) -> String {
	let digest = Sha256::digest(value.as_bytes());
	let mut hex = String::with_capacity(DIGEST_HEX_LEN);

	for byte in digest.iter().take(DIGEST_HEX_LEN / 2) {
		hex.push_str(&format!("{byte:02x}"));
	}

	hex
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn user_identity_is_a_stable_short_digest() {
		let secret = TokenSecret::new("user-refresh-token");
		let first = CacheIdentity::for_refresh_token(&secret);
		let second = CacheIdentity::for_refresh_token(&secret);

		assert_eq!(first, second);

		let CacheIdentity::User(digest) = first else {
			panic!("Per-user identity should carry a digest.");
		};

		assert_eq!(digest.len(), DIGEST_HEX_LEN);
		assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
		assert!(!digest.contains("user-refresh-token"));
	}

	#[test]
	fn sha256_prefix_matches_known_vector() {
		// sha256("abc") = ba7816bf8f01cfea...
		assert_eq!(short_digest("abc"), "ba7816bf8f01cfea");
	}

	#[test]
	fn distinct_credentials_get_distinct_identities() {
		let a = CacheIdentity::for_refresh_token(&TokenSecret::new("refresh-a"));
		let b = CacheIdentity::for_refresh_token(&TokenSecret::new("refresh-b"));

		assert_ne!(a, b);
		assert_ne!(a, CacheIdentity::Configured);
	}
}
