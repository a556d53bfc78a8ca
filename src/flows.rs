//! Credential broker: turns refresh credentials into cached access tokens.

pub mod refresh;

pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	clock::{Clock, SystemClock},
	config::{BrokerConfig, ENV_COOKIE_SECRET},
	http::{ReqwestHttpClient, TokenHttpClient},
	oauth::{ReqwestTransportErrorMapper, TransportErrorMapper},
	seal::{self, SealedBlob, SealingKey},
	store::TokenCache,
};

/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Where the refresh credential for one [`Broker::access_token`] call comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CredentialSource<'a> {
	/// The server-wide refresh token from configuration.
	Configured,
	/// A per-user refresh token sealed into a cookie; `None` when the request carried no cookie.
	SealedCookie(Option<&'a str>),
}

/// Mints access tokens from refresh credentials and caches them per credential identity.
///
/// The broker holds no per-request state; clone it or share it behind an [`Arc`]. Concurrent
/// misses for the same identity may each perform an exchange, and the last write wins.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every token exchange.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Access token cache shared with other broker clones.
	pub tokens: Arc<TokenCache>,
	/// Time source for freshness checks and expiry computation.
	pub clock: Arc<dyn Clock>,
	/// Counters for broker outcomes.
	pub exchange_metrics: Arc<ExchangeMetrics>,
	/// Token endpoint for refresh exchanges.
	pub token_endpoint: Url,
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	client_secret: TokenSecret,
	server_refresh_token: Option<TokenSecret>,
	cookie_key: Option<SealingKey>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	pub fn with_http_client(
		config: &BrokerConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			tokens: Default::default(),
			clock: Arc::new(SystemClock),
			exchange_metrics: Default::default(),
			token_endpoint: config.token_endpoint.clone(),
			client_id: config.client_id.clone(),
			client_secret: config.client_secret.clone(),
			server_refresh_token: config.refresh_token.clone(),
			cookie_key: config
				.cookie_secret
				.as_ref()
				.map(|secret| SealingKey::derive(secret.expose())),
		}
	}

	/// Replaces the time source.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Replaces the token cache, e.g. to share one cache between brokers.
	pub fn with_token_cache(mut self, tokens: Arc<TokenCache>) -> Self {
		self.tokens = tokens;

		self
	}

	/// Seals a per-user refresh token into the cookie value [`CredentialSource::SealedCookie`]
	/// expects.
	pub fn seal_refresh_token(&self, refresh_token: &str) -> Result<SealedBlob> {
		seal::seal(refresh_token, self.cookie_key()?)
	}

	fn cookie_key(&self) -> Result<&SealingKey> {
		self.cookie_key.as_ref().ok_or(Error::ConfigurationMissing { name: ENV_COOKIE_SECRET })
	}
}
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own reqwest transport and the system clock.
	pub fn new(config: &BrokerConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default(), ReqwestTransportErrorMapper)
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("server_refresh_token_set", &self.server_refresh_token.is_some())
			.field("cookie_key_set", &self.cookie_key.is_some())
			.field("cached_tokens", &self.tokens.len())
			.finish()
	}
}
