//! Process configuration for the broker and the catalog resolver.
//!
//! Values come from environment variables (see the `ENV_*` constants). Empty values count as
//! absent. Client credentials are required at load time; the configured refresh token and the
//! cookie passphrase are only required by the flow that uses them, so their absence surfaces as
//! [`Error::ConfigurationMissing`] on first use instead.

// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// OAuth client identifier.
pub const ENV_CLIENT_ID: &str = "SPOTIFY_CLIENT_ID";
/// OAuth client secret.
pub const ENV_CLIENT_SECRET: &str = "SPOTIFY_CLIENT_SECRET";
/// Server-wide refresh token.
pub const ENV_REFRESH_TOKEN: &str = "SPOTIFY_REFRESH_TOKEN";
/// Passphrase the cookie sealing key is derived from.
pub const ENV_COOKIE_SECRET: &str = "COOKIE_SECRET";
/// Token endpoint override.
pub const ENV_TOKEN_URL: &str = "SPOTIFY_TOKEN_URL";
/// Catalog base URL override.
pub const ENV_CATALOG_URL: &str = "MUSICBRAINZ_BASE_URL";
/// Application name sent in the catalog `User-Agent`.
pub const ENV_CATALOG_APP_NAME: &str = "MUSICBRAINZ_APP_NAME";
/// Application version sent in the catalog `User-Agent`.
pub const ENV_CATALOG_APP_VERSION: &str = "MUSICBRAINZ_APP_VERSION";
/// Contact address sent in the catalog `User-Agent`.
pub const ENV_CATALOG_CONTACT: &str = "MUSICBRAINZ_CONTACT";

const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
const DEFAULT_CATALOG_URL: &str = "https://musicbrainz.org/ws/2/";
const DEFAULT_APP_NAME: &str = "spotify-printer-player";
const DEFAULT_APP_VERSION: &str = "1.0.0";
const DEFAULT_CONTACT: &str = "you@example.com";

/// Full process configuration.
#[derive(Clone, Debug)]
pub struct Config {
	/// Token exchange settings.
	pub broker: BrokerConfig,
	/// Catalog settings.
	pub catalog: CatalogConfig,
}
impl Config {
	/// Loads configuration from the process environment.
	pub fn from_env() -> Result<Self> {
		Self::from_lookup(|name| std::env::var(name).ok())
	}

	/// Loads configuration through `lookup`, which maps a variable name to its value.
	pub fn from_lookup<F>(lookup: F) -> Result<Self>
	where
		F: Fn(&str) -> Option<String>,
	{
		let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
		let require = |name: &'static str| get(name).ok_or(Error::ConfigurationMissing { name });
		let token_endpoint =
			parse_endpoint("token", get(ENV_TOKEN_URL).as_deref().unwrap_or(DEFAULT_TOKEN_URL))?;
		let mut broker =
			BrokerConfig::new(token_endpoint, require(ENV_CLIENT_ID)?, require(ENV_CLIENT_SECRET)?);

		if let Some(refresh) = get(ENV_REFRESH_TOKEN) {
			broker = broker.with_refresh_token(refresh);
		}
		if let Some(secret) = get(ENV_COOKIE_SECRET) {
			broker = broker.with_cookie_secret(secret);
		}

		let catalog_endpoint = parse_endpoint(
			"catalog",
			get(ENV_CATALOG_URL).as_deref().unwrap_or(DEFAULT_CATALOG_URL),
		)?;
		let mut catalog = CatalogConfig::new(catalog_endpoint);

		if let Some(app_name) = get(ENV_CATALOG_APP_NAME) {
			catalog.app_name = app_name;
		}
		if let Some(app_version) = get(ENV_CATALOG_APP_VERSION) {
			catalog.app_version = app_version;
		}
		if let Some(contact) = get(ENV_CATALOG_CONTACT) {
			catalog.contact = contact;
		}

		Ok(Self { broker, catalog })
	}
}

/// Settings consumed by [`crate::flows::Broker`].
#[derive(Clone, Debug)]
pub struct BrokerConfig {
	/// Token endpoint used for `grant_type=refresh_token` exchanges.
	pub token_endpoint: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret, sent via HTTP basic auth.
	pub client_secret: TokenSecret,
	/// Server-wide refresh token for the configured-credential flow.
	pub refresh_token: Option<TokenSecret>,
	/// Passphrase for the cookie sealing key.
	pub cookie_secret: Option<TokenSecret>,
}
impl BrokerConfig {
	/// Creates a configuration with client credentials and no refresh material.
	pub fn new(
		token_endpoint: Url,
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
	) -> Self {
		Self {
			token_endpoint,
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			refresh_token: None,
			cookie_secret: None,
		}
	}

	/// Sets the server-wide refresh token.
	pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(refresh_token));

		self
	}

	/// Sets the cookie sealing passphrase.
	pub fn with_cookie_secret(mut self, secret: impl Into<String>) -> Self {
		self.cookie_secret = Some(TokenSecret::new(secret));

		self
	}
}

/// Settings consumed by [`crate::catalog::MetadataResolver`].
#[derive(Clone, Debug)]
pub struct CatalogConfig {
	/// Catalog web service root (for example `https://musicbrainz.org/ws/2/`).
	pub endpoint: Url,
	/// Application name for the `User-Agent` header.
	pub app_name: String,
	/// Application version for the `User-Agent` header.
	pub app_version: String,
	/// Contact address for the `User-Agent` header.
	pub contact: String,
	/// Minimum spacing between two catalog requests.
	pub min_interval: Duration,
}
impl CatalogConfig {
	/// Creates catalog settings for `endpoint` with the default client identification and
	/// request spacing.
	pub fn new(endpoint: Url) -> Self {
		Self {
			endpoint,
			app_name: DEFAULT_APP_NAME.into(),
			app_version: DEFAULT_APP_VERSION.into(),
			contact: DEFAULT_CONTACT.into(),
			min_interval: crate::catalog::RateLimiter::DEFAULT_MIN_INTERVAL,
		}
	}

	/// Replaces the minimum request spacing.
	pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
		self.min_interval = min_interval;

		self
	}

	/// Client identification string, `{app}/{version} ({contact})`.
	pub fn user_agent(&self) -> String {
		format!("{}/{} ({})", self.app_name, self.app_version, self.contact)
	}
}

fn parse_endpoint(name: &'static str, raw: &str) -> Result<Url> {
	Url::parse(raw).map_err(|source| ConfigError::InvalidEndpoint { name, source }.into())
}
