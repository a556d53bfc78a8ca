//! Token endpoint facade built on the `oauth2` crate.
//!
//! Only the refresh grant is spoken here. Client credentials travel via HTTP basic auth, and every
//! endpoint failure collapses into [`Error::TokenExchangeFailed`] carrying the observed status and
//! response body, except for transport failures, which go through a [`TransportErrorMapper`].

pub use oauth2;

// crates.io
use oauth2::{
	AccessToken as OAuthAccessToken, Client, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RefreshToken, RequestTokenError, Scope, StandardRevocableToken, TokenResponse,
	TokenType, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRequestTokenError, BasicRevocationErrorResponse,
		BasicTokenIntrospectionResponse,
	},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, TransportError},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
};

type RefreshGrantClient = Client<
	BasicErrorResponse,
	RefreshGrantResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;

/// Maps HTTP transport failures into crate [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted by the transport into a crate error.
	fn map_transport_error(
		&self,
		metadata: Option<&ResponseMetadata>,
		error: HttpClientError<E>,
	) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		meta: Option<&ResponseMetadata>,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(meta, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Other { message }.into(),
			_ => TransportError::Other { message: "unknown transport failure".into() }.into(),
		}
	}
}

/// Outcome of a successful refresh grant.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// Newly minted bearer value.
	pub access_token: TokenSecret,
	/// Lifetime reported by the endpoint, if any.
	pub expires_in: Option<Duration>,
}

/// `token_type` as sent by the endpoint; absent or `null` reads as unspecified.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct GrantTokenType(Option<String>);
impl GrantTokenType {
	/// Raw token type, if the endpoint sent one.
	pub fn as_str(&self) -> Option<&str> {
		self.0.as_deref()
	}
}
impl TokenType for GrantTokenType {}

/// Successful refresh grant body.
///
/// Only `access_token` is required. `token_type` and `expires_in` may be omitted, and unknown
/// fields such as `scope` are ignored.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RefreshGrantResponse {
	access_token: OAuthAccessToken,
	#[serde(default)]
	token_type: GrantTokenType,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	expires_in: Option<u64>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<RefreshToken>,
}
impl TokenResponse for RefreshGrantResponse {
	type TokenType = GrantTokenType;

	fn access_token(&self) -> &OAuthAccessToken {
		&self.access_token
	}

	fn token_type(&self) -> &Self::TokenType {
		&self.token_type
	}

	fn expires_in(&self) -> Option<std::time::Duration> {
		self.expires_in.map(std::time::Duration::from_secs)
	}

	fn refresh_token(&self) -> Option<&RefreshToken> {
		self.refresh_token.as_ref()
	}

	fn scopes(&self) -> Option<&Vec<Scope>> {
		None
	}
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: RefreshGrantClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + TokenHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn new(
		token_endpoint: &Url,
		client_id: &str,
		client_secret: &TokenSecret,
		http_client: Arc<C>,
		error_mapper: Arc<M>,
	) -> Result<Self> {
		let token_url = TokenUrl::new(token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { name: "token", source })?;
		let oauth_client: RefreshGrantClient = Client::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		Ok(Self { oauth_client, http_client, error_mapper })
	}

	/// Performs a `grant_type=refresh_token` exchange.
	pub(crate) async fn refresh_token(&self, refresh_token: &TokenSecret) -> Result<TokenGrant> {
		let meta = ResponseMetadataSlot::default();
		let instrumented = self.http_client.with_metadata(meta.clone());
		let refresh_secret = RefreshToken::new(refresh_token.expose().to_owned());
		let response = self
			.oauth_client
			.exchange_refresh_token(&refresh_secret)
			.request_async(&instrumented)
			.await
			.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;
		let access_token = response.access_token().secret();

		if access_token.is_empty() {
			return Err(Error::TokenExchangeFailed {
				status: meta.take().and_then(|value| value.status).unwrap_or_default(),
				body: "Token endpoint returned an empty access_token.".into(),
			});
		}

		let expires_in = response
			.expires_in()
			.map(|lifetime| {
				i64::try_from(lifetime.as_secs())
					.map(Duration::seconds)
					.map_err(|_| ConfigError::ExpiresInOutOfRange)
			})
			.transpose()?;

		Ok(TokenGrant {
			access_token: TokenSecret::new(access_token.to_owned()),
			expires_in,
		})
	}
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let status = meta.as_ref().and_then(|value| value.status).unwrap_or_default();
	let error_body = meta.as_ref().and_then(|value| value.error_body.clone());

	match err {
		RequestTokenError::ServerResponse(response) => Error::TokenExchangeFailed {
			status,
			body: error_body.unwrap_or_else(|| response.error().as_ref().to_owned()),
		},
		RequestTokenError::Request(error) => mapper.map_transport_error(meta.as_ref(), error),
		// A 2xx body without `access_token` (or otherwise unreadable) lands here.
		RequestTokenError::Parse(_, body) => Error::TokenExchangeFailed {
			status,
			body: error_body.unwrap_or_else(|| String::from_utf8_lossy(&body).into_owned()),
		},
		RequestTokenError::Other(message) =>
			Error::TokenExchangeFailed { status, body: error_body.unwrap_or(message) },
	}
}

fn map_reqwest_error(meta: Option<&ResponseMetadata>, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	// Failed while reading the body of a response whose status was already seen.
	if let Some(status) =
		meta.and_then(|value| value.status).or_else(|| err.status().map(|code| code.as_u16()))
	{
		return Error::TokenExchangeFailed { status, body: err.to_string() };
	}

	TransportError::from(err).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::ReqwestHttpClient;

	fn facade(
		endpoint: &str,
	) -> Result<BasicFacade<ReqwestHttpClient, ReqwestTransportErrorMapper>> {
		BasicFacade::new(
			&Url::parse(endpoint).expect("Test endpoint should parse."),
			"client-id",
			&TokenSecret::new("secret"),
			Arc::new(ReqwestHttpClient::default()),
			Arc::new(ReqwestTransportErrorMapper),
		)
	}

	#[test]
	fn grant_body_without_token_type_decodes() {
		let response: RefreshGrantResponse =
			serde_json::from_str("{\"access_token\":\"abc\",\"expires_in\":3600}")
				.expect("Body without token_type should decode.");

		assert_eq!(response.access_token().secret(), "abc");
		assert_eq!(response.token_type().as_str(), None);
		assert_eq!(response.expires_in(), Some(std::time::Duration::from_secs(3_600)));
	}

	#[test]
	fn grant_body_keeps_token_type_and_ignores_unknown_fields() {
		let response: RefreshGrantResponse = serde_json::from_str(
			"{\"access_token\":\"abc\",\"token_type\":\"Bearer\",\"scope\":\"user-read-playback-state\"}",
		)
		.expect("Spotify-shaped body should decode.");

		assert_eq!(response.token_type().as_str(), Some("Bearer"));
		assert_eq!(response.expires_in(), None);
	}

	#[test]
	fn grant_body_without_access_token_is_rejected() {
		assert!(
			serde_json::from_str::<RefreshGrantResponse>("{\"token_type\":\"Bearer\"}").is_err()
		);
	}

	#[test]
	fn builds_basic_auth_client() {
		assert!(facade("https://accounts.example.com/api/token").is_ok());
	}

	#[test]
	fn captured_error_body_wins_over_fallback_message() {
		let meta = ResponseMetadata {
			status: Some(400),
			error_body: Some("{\"error\":\"invalid_grant\"}".into()),
		};
		let err = map_request_error::<ReqwestError, _>(
			Some(meta),
			RequestTokenError::Other("unexpected".into()),
			&ReqwestTransportErrorMapper,
		);

		assert!(matches!(
			err,
			Error::TokenExchangeFailed { status: 400, ref body } if body.contains("invalid_grant")
		));
	}

	#[test]
	fn missing_metadata_reports_status_zero() {
		let err = map_request_error::<ReqwestError, _>(
			None,
			RequestTokenError::Other("no response".into()),
			&ReqwestTransportErrorMapper,
		);

		assert!(matches!(
			err,
			Error::TokenExchangeFailed { status: 0, ref body } if body == "no response"
		));
	}

	#[test]
	fn unstructured_transport_failures_map_to_transport_errors() {
		let err = ReqwestTransportErrorMapper
			.map_transport_error(None, HttpClientError::Other("connection reset".into()));

		assert!(matches!(
			err,
			Error::Transport(TransportError::Other { ref message }) if message == "connection reset"
		));
	}
}
