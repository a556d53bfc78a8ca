//! Access token acquisition through the refresh grant.
//!
//! [`Broker::access_token`] resolves the refresh credential for a [`CredentialSource`], derives
//! its cache identity, and answers from the [`crate::store::TokenCache`] while the cached token
//! is fresh. On a miss it performs one `grant_type=refresh_token` exchange, with no retries, and
//! caches the result with an expiry measured from the instant the request started.

mod metrics;

pub use metrics::ExchangeMetrics;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, CacheIdentity, TokenSecret},
	config::ENV_REFRESH_TOKEN,
	flows::{Broker, CredentialSource},
	http::TokenHttpClient,
	oauth::{BasicFacade, TransportErrorMapper},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	seal,
};

/// Lifetime assumed when the token endpoint omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::seconds(3_600);

impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Returns an access token for `source`, exchanging the refresh credential when the cache
	/// has nothing fresh.
	///
	/// # Errors
	///
	/// - [`Error::NotAuthenticated`] when the cookie flow has no cookie.
	/// - [`Error::Integrity`] when the cookie does not unseal.
	/// - [`Error::ConfigurationMissing`] when the flow's configuration value is unset.
	/// - [`Error::TokenExchangeFailed`] when the endpoint rejects the refresh or omits the token.
	pub async fn access_token(&self, source: CredentialSource<'_>) -> Result<AccessToken> {
		const KIND: FlowKind = FlowKind::TokenRefresh;

		let span = FlowSpan::new(KIND, "access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.exchange_metrics.record_attempt();

		let result = span
			.instrument(async move {
				let now = self.clock.now();
				let (identity, refresh_token) = self.resolve_credential(source)?;

				if let Some(token) = self.tokens.get_fresh(&identity, now) {
					return Ok((token, true));
				}

				let facade = <BasicFacade<C, M>>::new(
					&self.token_endpoint,
					&self.client_id,
					&self.client_secret,
					self.http_client.clone(),
					self.transport_mapper.clone(),
				)?;
				let grant = facade.refresh_token(&refresh_token).await?;
				let token = AccessToken {
					value: grant.access_token,
					expires_at: now + grant.expires_in.unwrap_or(DEFAULT_EXPIRES_IN),
				};

				obs::log_token_exchanged(&identity, token.expires_at);
				self.tokens.put(identity, token.clone(), now);

				Ok((token, false))
			})
			.await;

		match result {
			Ok((token, true)) => {
				self.exchange_metrics.record_cache_hit();
				obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);

				Ok(token)
			},
			Ok((token, false)) => {
				self.exchange_metrics.record_exchange();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				Ok(token)
			},
			Err(err) => {
				self.exchange_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				Err(err)
			},
		}
	}

	/// Shorthand for [`Broker::access_token`] with [`CredentialSource::Configured`].
	pub async fn configured_access_token(&self) -> Result<AccessToken> {
		self.access_token(CredentialSource::Configured).await
	}

	/// Shorthand for [`Broker::access_token`] with [`CredentialSource::SealedCookie`].
	pub async fn user_access_token(&self, cookie: Option<&str>) -> Result<AccessToken> {
		self.access_token(CredentialSource::SealedCookie(cookie)).await
	}

	fn resolve_credential(
		&self,
		source: CredentialSource<'_>,
	) -> Result<(CacheIdentity, TokenSecret)> {
		match source {
			CredentialSource::Configured => {
				let refresh = self
					.server_refresh_token
					.clone()
					.ok_or(Error::ConfigurationMissing { name: ENV_REFRESH_TOKEN })?;

				Ok((CacheIdentity::Configured, refresh))
			},
			CredentialSource::SealedCookie(cookie) => {
				let blob = cookie.filter(|value| !value.is_empty()).ok_or(Error::NotAuthenticated)?;
				let refresh = TokenSecret::new(seal::unseal(blob, self.cookie_key()?)?);

				if refresh.is_empty() {
					return Err(Error::NotAuthenticated);
				}

				Ok((CacheIdentity::for_refresh_token(&refresh), refresh))
			},
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	const UNUSED_ENDPOINT: &str = "http://127.0.0.1:9/api/token";

	#[tokio::test]
	async fn missing_cookie_is_not_authenticated() {
		let (broker, _, tokens) = build_test_broker(UNUSED_ENDPOINT, None);

		for cookie in [None, Some("")] {
			let err = broker
				.user_access_token(cookie)
				.await
				.expect_err("A missing cookie should not authenticate.");

			assert!(matches!(err, Error::NotAuthenticated));
		}

		assert!(tokens.is_empty());
		assert_eq!(broker.exchange_metrics.failures(), 2);
	}

	#[tokio::test]
	async fn tampered_cookie_fails_integrity_and_requires_login() {
		let (broker, _, _) = build_test_broker(UNUSED_ENDPOINT, None);
		let blob = broker.seal_refresh_token("user-refresh").expect("Sealing should succeed.");
		let mut tampered = blob.into_string();
		let last = tampered.pop().expect("Sealed blob should not be empty.");

		tampered.push(if last == 'A' { 'B' } else { 'A' });

		let err = broker
			.user_access_token(Some(&tampered))
			.await
			.expect_err("A tampered cookie should be rejected.");

		assert!(matches!(err, Error::Integrity(_)));
		assert!(err.requires_login());
	}

	#[tokio::test]
	async fn configured_flow_without_refresh_token_reports_the_variable() {
		let (broker, _, _) = build_test_broker(UNUSED_ENDPOINT, None);
		let err = broker
			.configured_access_token()
			.await
			.expect_err("Configured flow without a refresh token should fail.");

		assert!(matches!(err, Error::ConfigurationMissing { name: ENV_REFRESH_TOKEN }));
	}

	#[tokio::test]
	async fn fresh_cached_token_skips_the_exchange() {
		let (broker, clock, tokens) = build_test_broker(UNUSED_ENDPOINT, Some("srv-refresh"));
		let now = clock.now();

		tokens.put(
			CacheIdentity::Configured,
			AccessToken::new("cached-token", now + Duration::minutes(30)),
			now,
		);

		let token =
			broker.configured_access_token().await.expect("Cached token should be returned.");

		assert_eq!(token.expose(), "cached-token");
		assert_eq!(broker.exchange_metrics.cache_hits(), 1);
		assert_eq!(broker.exchange_metrics.exchanges(), 0);
	}
}
