#![cfg(feature = "reqwest")]

// crates.io
use httpmock::{prelude::*, Method::HEAD};
// self
use webid_oidc_rp::{
	_preludet::*,
	discovery::link::ISSUER_REL,
	error::{DiscoveryError, Error},
	provider::ProviderResolver,
};

fn resolver(http_client: webid_oidc_rp::http::ReqwestHttpClient) -> ProviderResolver {
	ProviderResolver::new(Arc::new(http_client))
}

fn url(value: &str) -> Url {
	Url::parse(value).expect("Failed to parse test URL.")
}

/// Identities under test never pass the well-known self-check.
async fn mock_no_well_known(server: &MockServer) {
	server
		.mock_async(|when, then| {
			when.method(HEAD).path("/.well-known/openid-configuration");
			then.status(404);
		})
		.await;
}

#[tokio::test]
async fn header_probe_advertises_the_issuer() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;

	let probe = identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/profile/card");
			then.status(200).header(
				"link",
				format!("<https://provider.example/op?x=1>; rel=\"{ISSUER_REL}\""),
			);
		})
		.await;
	let identity = url(&identity_server.url("/profile/card"));
	let origin = resolver(test_reqwest_http_client())
		.resolve(&identity, None)
		.await
		.expect("Header-advertised issuer should resolve successfully.");

	probe.assert_async().await;

	// Path and query are stripped down to the issuer origin.
	assert_eq!(origin.origin().ascii_serialization(), "https://provider.example");
}

#[tokio::test]
async fn profile_fallback_covers_silent_headers() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/profile/card");
			then.status(200);
		})
		.await;

	let identity = url(&identity_server.url("/profile/card#me"));
	let profile = identity_server
		.mock_async(|when, then| {
			when.method(GET).path("/profile/card").header("accept", "application/ld+json");
			then.status(200).header("content-type", "application/ld+json").body(format!(
				"{{\"@id\": \"{identity}\", \"solid:oidcIssuer\": {{\"@id\": \"https://provider.example/\"}}}}"
			));
		})
		.await;
	let origin = resolver(test_reqwest_http_client())
		.resolve(&identity, None)
		.await
		.expect("Profile-advertised issuer should resolve successfully.");

	profile.assert_async().await;

	assert_eq!(origin.origin().ascii_serialization(), "https://provider.example");
}

#[tokio::test]
async fn multi_issuer_profiles_disambiguate_by_expected_issuer() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(200);
		})
		.await;

	let identity = url(&identity_server.url("/card#me"));

	identity_server
		.mock_async(|when, then| {
			when.method(GET).path("/card");
			then.status(200).body(format!(
				"{{\"@id\": \"{identity}\", \"solid:oidcIssuer\": [\
				 {{\"@id\": \"https://a.example\"}}, {{\"@id\": \"https://b.example\"}}]}}"
			));
		})
		.await;

	let resolver = resolver(test_reqwest_http_client());
	let first = resolver
		.resolve(&identity, None)
		.await
		.expect("Multi-issuer profile should resolve successfully.");

	assert_eq!(first.origin().ascii_serialization(), "https://a.example");

	let expected = url("https://b.example");
	let chosen = resolver
		.resolve(&identity, Some(&expected))
		.await
		.expect("Expected-issuer disambiguation should resolve successfully.");

	assert_eq!(chosen.origin().ascii_serialization(), "https://b.example");
}

#[tokio::test]
async fn unreachable_identity_is_a_typed_failure() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(503);
		})
		.await;

	let identity = url(&identity_server.url("/card"));
	let err = resolver(test_reqwest_http_client())
		.resolve(&identity, None)
		.await
		.expect_err("Unreachable identity must fail discovery.");

	assert!(matches!(err, Error::Discovery(DiscoveryError::IdentityUnreachable { .. })));
	assert!(
		err.to_string().contains(identity.as_str()),
		"Discovery errors must carry the identity URI for operators."
	);
}

#[tokio::test]
async fn reachable_but_silent_identity_reports_no_issuer() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(200);
		})
		.await;
	identity_server
		.mock_async(|when, then| {
			when.method(GET).path("/card");
			then.status(200).body("{\"@id\": \"https://elsewhere.example/#me\"}");
		})
		.await;

	let identity = url(&identity_server.url("/card"));
	let err = resolver(test_reqwest_http_client())
		.resolve(&identity, None)
		.await
		.expect_err("Silent identity must fail with a distinct error.");

	assert!(matches!(err, Error::Discovery(DiscoveryError::NoIssuerAdvertised { .. })));
	assert!(err.to_string().contains("solid:oidcIssuer"));
}

#[tokio::test]
async fn malformed_advertisements_surface_the_last_validation_error() {
	let identity_server = MockServer::start_async().await;

	mock_no_well_known(&identity_server).await;

	let header = format!("<mailto:op@example.com>; rel=\"{ISSUER_REL}\"");

	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(200).header("link", header);
		})
		.await;

	let identity = url(&identity_server.url("/card"));
	let err = resolver(test_reqwest_http_client())
		.resolve(&identity, None)
		.await
		.expect_err("Non-HTTP issuer advertisements must be rejected.");

	assert!(matches!(err, Error::Discovery(DiscoveryError::MalformedIssuer { .. })));
	assert!(err.to_string().contains("mailto:op@example.com"));
}
