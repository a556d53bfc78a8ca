//! Credential lifecycle and release-year resolution core for a Spotify printer player.
//!
//! Two subsystems live here. The [`flows::Broker`] turns a refresh credential (server-wide
//! or sealed in a per-user cookie) into a cached access token. The
//! [`catalog::MetadataResolver`] answers "what year was this recording first released?"
//! against a rate-limited catalog with ISRC-first, text-search-second fallback.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod seal;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::{
		_prelude::*,
		clock::{Clock, ManualClock},
	};

	// self
	use crate::{
		catalog::MetadataResolver,
		config::{BrokerConfig, CatalogConfig},
		flows::ReqwestBroker,
		http::ReqwestHttpClient,
		store::TokenCache,
	};

	/// Client identifier used by test brokers.
	pub const TEST_CLIENT_ID: &str = "client-test";
	/// Client secret used by test brokers.
	pub const TEST_CLIENT_SECRET: &str = "secret-test";
	/// Cookie passphrase used by test brokers.
	pub const TEST_COOKIE_SECRET: &str = "cookie-passphrase-test";

	/// Fixed starting instant for [`ManualClock`] fixtures.
	pub fn test_epoch() -> OffsetDateTime {
		time::macros::datetime!(2025-01-01 00:00 UTC)
	}

	/// Builds a reqwest HTTP client suitable for talking to `httpmock` servers.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Broker configuration pointing at `token_endpoint` with the test client credentials.
	pub fn test_broker_config(token_endpoint: &str, refresh_token: Option<&str>) -> BrokerConfig {
		let mut config = BrokerConfig::new(
			Url::parse(token_endpoint).expect("Test token endpoint should parse."),
			TEST_CLIENT_ID,
			TEST_CLIENT_SECRET,
		)
		.with_cookie_secret(TEST_COOKIE_SECRET);

		if let Some(refresh) = refresh_token {
			config = config.with_refresh_token(refresh);
		}

		config
	}

	/// Constructs a reqwest-backed broker driven by a [`ManualClock`].
	pub fn build_test_broker(
		token_endpoint: &str,
		refresh_token: Option<&str>,
	) -> (ReqwestBroker, Arc<ManualClock>, Arc<TokenCache>) {
		let clock = Arc::new(ManualClock::new(test_epoch()));
		let dyn_clock: Arc<dyn Clock> = clock.clone();
		let tokens = Arc::new(TokenCache::default());
		let broker = ReqwestBroker::with_http_client(
			&test_broker_config(token_endpoint, refresh_token),
			test_reqwest_http_client(),
			Arc::new(crate::oauth::ReqwestTransportErrorMapper),
		)
		.with_clock(dyn_clock)
		.with_token_cache(tokens.clone());

		(broker, clock, tokens)
	}

	/// Constructs a resolver against `catalog_base` driven by a [`ManualClock`].
	pub fn build_test_resolver(catalog_base: &str) -> (MetadataResolver, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(test_epoch()));
		let dyn_clock: Arc<dyn Clock> = clock.clone();
		let config = CatalogConfig::new(
			Url::parse(catalog_base).expect("Test catalog endpoint should parse."),
		);
		let resolver = MetadataResolver::new(test_reqwest_http_client(), &config, dyn_clock);

		(resolver, clock)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		hash::Hash,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
