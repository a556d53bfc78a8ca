//! Catalog wire model and year extraction.
//!
//! Decoding is lenient: absent or `null` lists read as empty, and a date that is absent, `null`,
//! or of an unexpected JSON type reads as "no date". Only structurally broken payloads fail.

// crates.io
use serde::Deserializer;
use serde_json::Value;
// self
use crate::_prelude::*;

/// Extracts the year from a catalog date such as `1971-05-01`, `1971-05`, or `1971`.
///
/// The year is the first four characters parsed as an integer; anything else is `None`.
pub fn year_from_date(date: &str) -> Option<i32> {
	let head = date.chars().take(4).collect::<String>();
	let head = head.trim();

	if head.is_empty() {
		return None;
	}

	head.parse().ok()
}

/// Failure of one catalog lookup step. Never escapes the resolver.
#[derive(Debug, ThisError)]
pub enum CatalogError {
	/// The configured endpoint cannot carry path segments.
	#[error("Catalog endpoint cannot be used as a base URL.")]
	InvalidEndpoint,
	/// Network-level failure.
	#[error("Catalog request failed.")]
	Transport(#[from] ReqwestError),
	/// Non-success HTTP status.
	#[error("Catalog answered with status {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Response body was not a recording list.
	#[error("Catalog response could not be decoded: {0}.")]
	Parse(#[from] serde_path_to_error::Error<serde_json::Error>),
}

/// Recordings returned by the ISRC and recording-search endpoints.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecordingList {
	/// Matching recordings.
	#[serde(default, deserialize_with = "lenient_list")]
	pub recordings: Vec<Recording>,
}
impl RecordingList {
	/// Decodes a response body, reporting the JSON path of any structural failure.
	pub fn from_slice(body: &[u8]) -> Result<Self, CatalogError> {
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		Ok(serde_path_to_error::deserialize(&mut deserializer)?)
	}

	/// Earliest year across every recording's releases and first-release dates.
	pub fn earliest_year(&self) -> Option<i32> {
		self.recordings
			.iter()
			.flat_map(|recording| {
				[recording.earliest_release_year(), recording.first_release_year()]
			})
			.flatten()
			.min()
	}

	/// Earliest first-release year across recordings, ignoring linked releases.
	pub fn earliest_first_release_year(&self) -> Option<i32> {
		self.recordings.iter().filter_map(Recording::first_release_year).min()
	}
}

/// One catalog recording.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Recording {
	/// Catalog identifier.
	#[serde(default)]
	pub id: Option<String>,
	/// Recording title.
	#[serde(default)]
	pub title: Option<String>,
	/// Date the recording first appeared on any release.
	#[serde(default, rename = "first-release-date", deserialize_with = "lenient_date")]
	pub first_release_date: Option<String>,
	/// Releases carrying this recording.
	#[serde(default, deserialize_with = "lenient_list")]
	pub releases: Vec<Release>,
}
impl Recording {
	/// Earliest year among linked releases.
	pub fn earliest_release_year(&self) -> Option<i32> {
		self.releases.iter().filter_map(Release::year).min()
	}

	/// Year of the recording's own first-release date.
	pub fn first_release_year(&self) -> Option<i32> {
		self.first_release_date.as_deref().and_then(year_from_date)
	}
}

/// One release linked to a recording.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Release {
	/// Release date.
	#[serde(default, deserialize_with = "lenient_date")]
	pub date: Option<String>,
}
impl Release {
	/// Year of the release date.
	pub fn year(&self) -> Option<i32> {
		self.date.as_deref().and_then(year_from_date)
	}
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(deserializer)? {
		Value::String(date) => Some(date),
		Value::Number(date) => Some(date.to_string()),
		_ => None,
	})
}

fn lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
