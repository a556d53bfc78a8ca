#![cfg(feature = "test")]

// crates.io
use httpmock::prelude::*;
// self
use printer_player::{
	_preludet::*,
	auth::{CacheIdentity, TokenSecret},
	flows::CredentialSource,
};

const TOKEN_PATH: &str = "/api/token";
// base64("client-test:secret-test")
const BASIC_AUTH: &str = "Basic Y2xpZW50LXRlc3Q6c2VjcmV0LXRlc3Q=";

#[tokio::test]
async fn configured_flow_reuses_token_until_the_safety_margin() {
	let server = MockServer::start_async().await;
	let (broker, clock, _) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).header("authorization", BASIC_AUTH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-configured\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;
	let first = broker.configured_access_token().await.expect("First exchange should succeed.");
	let second = broker.configured_access_token().await.expect("Cached token should be reused.");

	mock.assert_calls_async(1).await;

	assert_eq!(first.expose(), "access-configured");
	assert_eq!(second, first);
	assert_eq!(first.expires_at, test_epoch() + Duration::seconds(3_600));

	clock.advance(Duration::seconds(3_584));
	broker.configured_access_token().await.expect("Token should still be fresh.");
	mock.assert_calls_async(1).await;

	clock.advance(Duration::seconds(1));

	let refreshed =
		broker.configured_access_token().await.expect("Stale token should be re-exchanged.");

	mock.assert_calls_async(2).await;

	assert_eq!(refreshed.expires_at, test_epoch() + Duration::seconds(3_585 + 3_600));
	assert_eq!(broker.exchange_metrics.exchanges(), 2);
	assert_eq!(broker.exchange_metrics.cache_hits(), 2);
}

#[tokio::test]
async fn cookie_flow_caches_by_credential_digest() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), None);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).header("authorization", BASIC_AUTH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-user\",\"token_type\":\"Bearer\",\"expires_in\":1800}",
			);
		})
		.await;
	let cookie = broker.seal_refresh_token("user-refresh-a").expect("Sealing should succeed.");
	let token = broker
		.access_token(CredentialSource::SealedCookie(Some(cookie.as_str())))
		.await
		.expect("Cookie exchange should succeed.");

	assert_eq!(token.expose(), "access-user");
	assert_eq!(token.expires_at, test_epoch() + Duration::seconds(1_800));

	let identity = CacheIdentity::for_refresh_token(&TokenSecret::new("user-refresh-a"));

	assert_eq!(identity, CacheIdentity::User("979493877f23ad0d".into()));
	assert!(tokens.get(&identity).is_some());
	assert!(tokens.get(&CacheIdentity::Configured).is_none());

	// A re-sealed cookie carries the same credential and hits the same slot.
	let resealed = broker.seal_refresh_token("user-refresh-a").expect("Sealing should succeed.");

	assert_ne!(resealed, cookie);

	broker
		.user_access_token(Some(resealed.as_str()))
		.await
		.expect("Cached token should be reused.");
	mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn distinct_users_get_distinct_cache_slots() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"access-any\",\"token_type\":\"Bearer\",\"expires_in\":3600}",
			);
		})
		.await;

	for refresh in ["user-a", "user-b"] {
		let cookie = broker.seal_refresh_token(refresh).expect("Sealing should succeed.");

		broker.user_access_token(Some(cookie.as_str())).await.expect("Exchange should succeed.");
	}

	broker.configured_access_token().await.expect("Configured exchange should succeed.");

	mock.assert_calls_async(3).await;

	assert_eq!(tokens.len(), 3);
}

#[tokio::test]
async fn rejected_refresh_reports_status_and_body() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), Some("revoked-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(400).header("content-type", "application/json").body(
				"{\"error\":\"invalid_grant\",\"error_description\":\"Invalid refresh token\"}",
			);
		})
		.await;
	let err = broker.configured_access_token().await.expect_err("Revoked refresh should fail.");

	mock.assert_calls_async(1).await;

	match &err {
		Error::TokenExchangeFailed { status, body } => {
			assert_eq!(*status, 400);
			assert!(body.contains("invalid_grant"));
			assert!(body.contains("Invalid refresh token"));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(err.is_rejected_credential());
	assert!(tokens.is_empty());
	assert_eq!(broker.exchange_metrics.failures(), 1);
}

#[tokio::test]
async fn server_failure_is_not_retried() {
	let server = MockServer::start_async().await;
	let (broker, _, _) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(503).header("content-type", "text/plain").body("upstream unavailable");
		})
		.await;
	let err = broker.configured_access_token().await.expect_err("A 503 should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::TokenExchangeFailed { status: 503, ref body } if body == "upstream unavailable"
	));
	assert!(!err.is_rejected_credential());
}

#[tokio::test]
async fn success_without_access_token_fails() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = broker.configured_access_token().await.expect_err("Missing token should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(
		err,
		Error::TokenExchangeFailed { status: 200, ref body } if body.contains("expires_in")
	));
	assert!(tokens.is_empty());
}

#[tokio::test]
async fn missing_expires_in_defaults_to_one_hour() {
	let server = MockServer::start_async().await;
	let (broker, _, _) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-default\",\"token_type\":\"Bearer\"}");
		})
		.await;
	let token = broker.configured_access_token().await.expect("Exchange should succeed.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.expires_at, test_epoch() + Duration::seconds(3_600));
}

#[tokio::test]
async fn missing_cookie_never_reaches_the_endpoint() {
	let server = MockServer::start_async().await;
	let (broker, _, _) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(500);
		})
		.await;
	let err = broker.user_access_token(None).await.expect_err("No cookie should fail.");

	assert!(matches!(err, Error::NotAuthenticated));
	assert!(err.requires_login());

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn success_without_token_type_is_accepted() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH).header("authorization", BASIC_AUTH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-plain\",\"expires_in\":3600}");
		})
		.await;
	let token = broker
		.configured_access_token()
		.await
		.expect("A body with only access_token and expires_in should be accepted.");

	mock.assert_calls_async(1).await;

	assert_eq!(token.expose(), "access-plain");
	assert_eq!(token.expires_at, test_epoch() + Duration::seconds(3_600));
	assert_eq!(tokens.get(&CacheIdentity::Configured), Some(token));
}

#[tokio::test]
async fn empty_access_token_is_rejected_and_not_cached() {
	let server = MockServer::start_async().await;
	let (broker, _, tokens) = build_test_broker(&server.url(TOKEN_PATH), Some("srv-refresh"));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"\",\"token_type\":\"Bearer\",\"expires_in\":3600}");
		})
		.await;
	let err = broker.configured_access_token().await.expect_err("An empty token should fail.");

	mock.assert_calls_async(1).await;

	assert!(matches!(err, Error::TokenExchangeFailed { status: 200, .. }));
	assert!(tokens.is_empty());
	assert_eq!(broker.exchange_metrics.failures(), 1);
}
