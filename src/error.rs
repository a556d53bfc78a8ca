//! Crate-level error types shared by the credential broker and its collaborators.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
///
/// Credential errors surface to callers because they need user action. Catalog failures never
/// appear here; the metadata resolver absorbs them.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Sealed cookie value failed authentication.
	#[error(transparent)]
	Integrity(#[from] IntegrityError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// No usable refresh credential is available for the per-user flow.
	#[error("Not authenticated: no refresh credential cookie was supplied.")]
	NotAuthenticated,
	/// Authorization server rejected or failed the refresh.
	#[error("Token exchange failed ({status}): {body}")]
	TokenExchangeFailed {
		/// HTTP status returned by the token endpoint, `0` when none was observed.
		status: u16,
		/// Raw response body (or the best available description of the failure).
		body: String,
	},
	/// A required configuration value is absent.
	#[error("Missing configuration value `{name}`.")]
	ConfigurationMissing {
		/// Name of the missing setting (environment variable name).
		name: &'static str,
	},
}
impl Error {
	/// Returns `true` when the caller should prompt the user to log in again.
	pub fn requires_login(&self) -> bool {
		matches!(self, Self::NotAuthenticated | Self::Integrity(_))
	}

	/// Returns `true` when the token endpoint reported an invalid or revoked credential.
	pub fn is_rejected_credential(&self) -> bool {
		matches!(self, Self::TokenExchangeFailed { status: 400 | 401, .. })
	}
}

/// Sealed value could not be authenticated.
///
/// Malformed input and a failed tag check produce the same error so callers cannot tell them
/// apart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ThisError)]
#[error("Sealed value failed integrity verification.")]
pub struct IntegrityError;

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A configured endpoint is not a valid URL.
	#[error("The {name} endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Endpoint label.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Token endpoint returned an excessively large `expires_in`.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// The AEAD cipher refused to seal the plaintext.
	#[error("Refresh credential could not be sealed.")]
	Seal,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// Transport failed without a structured error.
	#[error("HTTP client error occurred while calling the token endpoint: {message}.")]
	Other {
		/// Transport-supplied description.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
