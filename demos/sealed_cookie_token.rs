//! Seals a user's refresh token into a cookie value, then trades the cookie for an access token
//! against a mock Spotify token endpoint and shows the second call coming from the cache.

// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use printer_player::{config::BrokerConfig, flows::ReqwestBroker};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/token").body_includes("grant_type=refresh_token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"demo-access\",\"expires_in\":3600}");
		})
		.await;
	let config =
		BrokerConfig::new(Url::parse(&server.url("/api/token"))?, "demo-client", "demo-secret")
			.with_cookie_secret("demo-cookie-passphrase");
	let broker = ReqwestBroker::new(&config);
	let cookie = broker.seal_refresh_token("demo-user-refresh")?;

	println!("Sealed cookie value: {}", cookie.as_str());

	let first = broker.user_access_token(Some(cookie.as_str())).await?;
	let second = broker.user_access_token(Some(cookie.as_str())).await?;

	println!("Access token expires at {} (reused: {}).", first.expires_at, first == second);
	println!(
		"Exchanges: {}, cache hits: {}.",
		broker.exchange_metrics.exchanges(),
		broker.exchange_metrics.cache_hits()
	);

	token_mock.assert_calls_async(1).await;

	Ok(())
}
