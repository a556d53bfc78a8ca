//! Resolves an original release year against a mock MusicBrainz service: the ISRC lookup fails,
//! the rate-limited search fallback answers, and the repeat call is served from the cache.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use printer_player::{
	catalog::MetadataResolver, clock::SystemClock, config::CatalogConfig, http::ReqwestHttpClient,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let isrc_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ws/2/isrc/GBUM71029604");
			then.status(503).body("busy");
		})
		.await;
	let search_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/ws/2/recording/").query_param("fmt", "json");
			then.status(200).header("content-type", "application/json").body(
				r#"{"recordings":[{"first-release-date":"1980-06-27"},{"first-release-date":"1975-10-31"}]}"#,
			);
		})
		.await;
	let config = CatalogConfig::new(Url::parse(&server.url("/ws/2/"))?);
	let resolver =
		MetadataResolver::new(ReqwestHttpClient::default(), &config, Arc::new(SystemClock));
	let first = resolver.resolve("Bohemian Rhapsody", "Queen", Some("GBUM71029604")).await;
	let second = resolver.resolve("bohemian rhapsody", "QUEEN", Some("GBUM71029604")).await;

	println!("First: {:?} (cached: {}).", first.year, first.cached);
	println!("Second: {:?} (cached: {}).", second.year, second.cached);

	isrc_mock.assert_calls_async(1).await;
	search_mock.assert_calls_async(1).await;

	Ok(())
}
