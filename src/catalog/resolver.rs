//! ISRC-first, search-second release-year resolution.

// crates.io
use reqwest::header::{ACCEPT, USER_AGENT};
// self
use crate::{
	_prelude::*,
	catalog::{CatalogError, RateLimiter, RecordingList},
	clock::{Clock, SystemClock},
	config::CatalogConfig,
	http::ReqwestHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	store::{YearCache, YearKey},
};

const KIND: FlowKind = FlowKind::YearResolution;

/// Answer to one resolution request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YearResolution {
	/// Earliest known release year, or `None` when the catalog had nothing.
	pub year: Option<i32>,
	/// `true` when the answer came from the cache without touching the catalog.
	pub cached: bool,
}

/// Resolves the original release year of a recording.
///
/// Catalog failures never surface: a failed step is logged and treated as "no year from this
/// step", so the worst outcome is a cached `None`.
#[derive(Clone)]
pub struct MetadataResolver {
	http_client: ReqwestHttpClient,
	endpoint: Url,
	user_agent: String,
	clock: Arc<dyn Clock>,
	limiter: Arc<RateLimiter>,
	cache: Arc<YearCache>,
}
impl MetadataResolver {
	/// Creates a resolver with its own rate limiter and cache.
	pub fn new(
		http_client: ReqwestHttpClient,
		config: &CatalogConfig,
		clock: Arc<dyn Clock>,
	) -> Self {
		let limiter = RateLimiter::new(clock.clone()).with_min_interval(config.min_interval);

		Self {
			http_client,
			endpoint: config.endpoint.clone(),
			user_agent: config.user_agent(),
			clock,
			limiter: Arc::new(limiter),
			cache: Default::default(),
		}
	}

	/// Creates a resolver with a default reqwest client and the system clock.
	pub fn from_config(config: &CatalogConfig) -> Self {
		Self::new(ReqwestHttpClient::default(), config, Arc::new(SystemClock))
	}

	/// Shares `limiter` with other clients of the same catalog.
	pub fn with_rate_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
		self.limiter = limiter;

		self
	}

	/// Replaces the result cache.
	pub fn with_cache(mut self, cache: Arc<YearCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Result cache in use.
	pub fn cache(&self) -> &Arc<YearCache> {
		&self.cache
	}

	/// Resolves the earliest release year for a track, reporting whether the cache answered.
	pub async fn resolve(&self, track: &str, artist: &str, isrc: Option<&str>) -> YearResolution {
		let span = FlowSpan::new(KIND, "resolve");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		span.instrument(async move {
			let now = self.clock.now();
			let key = YearKey::new(track, artist, isrc);

			if let Some(entry) = self.cache.get_live(&key, now) {
				obs::record_flow_outcome(KIND, FlowOutcome::CacheHit);

				return YearResolution { year: entry.year, cached: true };
			}

			let mut year = None;

			if let Some(isrc) = isrc.map(str::trim).filter(|isrc| !isrc.is_empty()) {
				year = absorb("isrc_lookup", self.lookup_isrc(isrc).await);
			}
			if year.is_none() {
				year = absorb(
					"recording_search",
					self.search_recordings(track.trim(), artist.trim()).await,
				);
			}

			self.cache.put(key, year, now);
			obs::record_flow_outcome(KIND, FlowOutcome::Success);

			YearResolution { year, cached: false }
		})
		.await
	}

	/// [`MetadataResolver::resolve`] without the cache flag.
	pub async fn resolve_original_year(
		&self,
		track: &str,
		artist: &str,
		isrc: Option<&str>,
	) -> Option<i32> {
		self.resolve(track, artist, isrc).await.year
	}

	async fn lookup_isrc(&self, isrc: &str) -> Result<Option<i32>, CatalogError> {
		let mut url = self.endpoint.clone();

		url.path_segments_mut()
			.map_err(|_| CatalogError::InvalidEndpoint)?
			.pop_if_empty()
			.extend(["isrc", isrc]);
		url.set_query(Some("inc=recordings+releases&fmt=json"));

		Ok(self.fetch(url).await?.earliest_year())
	}

	async fn search_recordings(
		&self,
		track: &str,
		artist: &str,
	) -> Result<Option<i32>, CatalogError> {
		let mut url = self.endpoint.clone();

		url.path_segments_mut()
			.map_err(|_| CatalogError::InvalidEndpoint)?
			.pop_if_empty()
			.extend(["recording", ""]);
		url.query_pairs_mut()
			.append_pair("query", &recording_query(track, artist))
			.append_pair("fmt", "json");

		Ok(self.fetch(url).await?.earliest_first_release_year())
	}

	async fn fetch(&self, url: Url) -> Result<RecordingList, CatalogError> {
		self.limiter.acquire().await;

		let response = self
			.http_client
			.get(url)
			.header(USER_AGENT, &self.user_agent)
			.header(ACCEPT, "application/json")
			.send()
			.await?;
		let status = response.status();

		if !status.is_success() {
			return Err(CatalogError::Status { status: status.as_u16() });
		}

		RecordingList::from_slice(&response.bytes().await?)
	}
}
impl Debug for MetadataResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetadataResolver")
			.field("endpoint", &self.endpoint.as_str())
			.field("user_agent", &self.user_agent)
			.field("limiter", &self.limiter)
			.field("cached_entries", &self.cache.len())
			.finish()
	}
}

fn absorb(stage: &'static str, outcome: Result<Option<i32>, CatalogError>) -> Option<i32> {
	match outcome {
		Ok(year) => year,
		Err(err) => {
			obs::log_degraded(KIND, stage, &err);
			obs::record_flow_outcome(KIND, FlowOutcome::Degraded);

			None
		},
	}
}

/// Structured search query: `recording:"{track}" AND artist:"{artist}"`.
fn recording_query(track: &str, artist: &str) -> String {
	format!("recording:\"{}\" AND artist:\"{}\"", escape_phrase(track), escape_phrase(artist))
}

fn escape_phrase(value: &str) -> String {
	value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::*;

	#[test]
	fn query_quotes_both_phrases() {
		assert_eq!(
			recording_query("Bohemian Rhapsody", "Queen"),
			"recording:\"Bohemian Rhapsody\" AND artist:\"Queen\""
		);
	}

	#[test]
	fn embedded_quotes_and_backslashes_are_escaped() {
		assert_eq!(
			recording_query("12\" Mix", "AC\\DC"),
			"recording:\"12\\\" Mix\" AND artist:\"AC\\\\DC\""
		);
	}

	#[test]
	fn absorb_turns_failures_into_no_data() {
		assert_eq!(absorb("isrc_lookup", Ok(Some(1971))), Some(1971));
		assert_eq!(absorb("isrc_lookup", Err(CatalogError::Status { status: 503 })), None);
	}

	#[tokio::test]
	async fn live_cache_entry_answers_without_network() {
		// Nothing listens on the discard port; a network attempt would degrade to `None`.
		let (resolver, clock) = build_test_resolver("http://127.0.0.1:9/");

		resolver.cache().put(YearKey::new("Song", "Band", None), Some(1985), clock.now());

		let resolution = resolver.resolve(" song ", "BAND", None).await;

		assert_eq!(resolution, YearResolution { year: Some(1985), cached: true });
		assert_eq!(clock.total_slept(), Duration::ZERO);
	}

	#[tokio::test]
	async fn unreachable_catalog_degrades_to_a_cached_miss() {
		let (resolver, clock) = build_test_resolver("http://127.0.0.1:9/");
		let resolution = resolver.resolve("Song", "Band", Some("US1234567890")).await;

		assert_eq!(resolution, YearResolution { year: None, cached: false });
		// Both steps went through the limiter.
		assert_eq!(clock.total_slept(), RateLimiter::DEFAULT_MIN_INTERVAL);

		let entry = resolver
			.cache()
			.get(&YearKey::new("Song", "Band", Some("US1234567890")))
			.expect("The miss should be cached.");

		assert_eq!(entry.expires_at, test_epoch() + Duration::minutes(10));
	}
}
