#![cfg(feature = "reqwest")]

// crates.io
use httpmock::{prelude::*, Method::HEAD};
// self
use webid_oidc_rp::{_preludet::*, provider::ProviderResolver};

#[tokio::test]
async fn provider_uris_short_circuit_discovery() {
	let provider_server = MockServer::start_async().await;
	let well_known = provider_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/.well-known/openid-configuration");
			then.status(200);
		})
		.await;
	// Any discovery attempt against this origin would hit this mock; the
	// self-check must keep it at zero calls.
	let probe = provider_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/authorize");
			then.status(500);
		})
		.await;
	let resolver = ProviderResolver::new(Arc::new(test_reqwest_http_client()));
	let uri = Url::parse(&provider_server.url("/authorize?client_id=x"))
		.expect("Provider URI fixture should parse successfully.");
	let origin =
		resolver.resolve(&uri, None).await.expect("Provider URI should resolve to its origin.");

	well_known.assert_async().await;
	probe.assert_calls_async(0).await;

	assert_eq!(
		origin.origin().ascii_serialization(),
		uri.origin().ascii_serialization(),
		"The origin itself is the provider; paths are dropped."
	);
}

#[tokio::test]
async fn failed_self_check_falls_through_to_discovery() {
	let identity_server = MockServer::start_async().await;

	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/.well-known/openid-configuration");
			then.status(404);
		})
		.await;

	let probe = identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(200).header(
				"link",
				"<https://provider.example>; rel=\"http://openid.net/specs/connect/1.0/issuer\"",
			);
		})
		.await;
	let resolver = ProviderResolver::new(Arc::new(test_reqwest_http_client()));
	let identity = Url::parse(&identity_server.url("/card"))
		.expect("Identity fixture should parse successfully.");
	let origin = resolver
		.resolve(&identity, None)
		.await
		.expect("Discovery should run once the self-check misses.");

	probe.assert_async().await;

	assert_eq!(origin.origin().ascii_serialization(), "https://provider.example");
}
