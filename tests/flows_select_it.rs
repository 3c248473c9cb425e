#![cfg(feature = "reqwest")]

// crates.io
use httpmock::{prelude::*, Method::HEAD};
// self
use webid_oidc_rp::{
	_preludet::*,
	auth::ClientId,
	client::{ClientFuture, ClientRegistry, TokenClient, WebIdClaimsResolver},
	flows::{ProviderSelection, RelyingParty, RelyingPartyEndpoints, SelectionResponse},
	store::{MemoryConsentStore, MemorySessionStore, SessionStore},
};

fn provider_config_body(server: &MockServer) -> String {
	format!(
		"{{\"issuer\": \"{base}\", \
		 \"authorization_endpoint\": \"{base}/authorize\", \
		 \"token_endpoint\": \"{base}/token\"}}",
		base = server.base_url()
	)
}

#[tokio::test]
async fn selection_discovers_the_provider_and_redirects() {
	let identity_server = MockServer::start_async().await;
	let provider_server = MockServer::start_async().await;

	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/.well-known/openid-configuration");
			then.status(404);
		})
		.await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(200).header(
				"link",
				format!(
					"<{}>; rel=\"http://openid.net/specs/connect/1.0/issuer\"",
					provider_server.base_url()
				),
			);
		})
		.await;
	provider_server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/openid-configuration");
			then.status(200)
				.header("content-type", "application/json")
				.body(provider_config_body(&provider_server));
		})
		.await;

	let (rp, session_store, _) = build_reqwest_test_rp("https://rp.example/");
	let session_id = test_session_id("sess-select");
	let response = rp
		.select_provider(&session_id, ProviderSelection::of(identity_server.url("/card")))
		.await;
	let redirect = response.redirect().expect("Selection should end in a redirect.");

	assert!(redirect.as_str().starts_with(&provider_server.url("/authorize?")));

	let pairs: HashMap<String, String> = redirect.query_pairs().into_owned().collect();

	assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
	assert_eq!(pairs.get("client_id").map(String::as_str), Some("local-rp"));
	assert!(pairs.contains_key("state"));
	assert!(pairs.contains_key("nonce"));
	assert_eq!(pairs.get("code_challenge_method").map(String::as_str), Some("S256"));

	let session = session_store
		.load(&session_id)
		.await
		.expect("Session load should succeed.")
		.expect("Selection must persist the session before redirecting.");
	let auth_state = session.auth_state.expect("Session should hold authorization bookkeeping.");

	assert_eq!(Some(&auth_state.state), pairs.get("state"));
	assert_eq!(
		auth_state.issuer.origin().ascii_serialization(),
		Url::parse(&provider_server.base_url())
			.expect("Provider base URL should parse successfully.")
			.origin()
			.ascii_serialization()
	);
}

#[tokio::test]
async fn missing_identity_re_renders_the_form_with_400() {
	let (rp, _, _) = build_reqwest_test_rp("https://rp.example/");
	let response =
		rp.select_provider(&test_session_id("sess-no-webid"), ProviderSelection::default()).await;

	match response {
		SelectionResponse::Form { status, error } => {
			assert_eq!(status, 400);
			assert!(!error.is_empty());
		},
		SelectionResponse::Redirect(_) => panic!("Invalid input must never redirect."),
	}
}

#[tokio::test]
async fn discovery_failures_re_render_the_form_with_400() {
	let identity_server = MockServer::start_async().await;

	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/.well-known/openid-configuration");
			then.status(500);
		})
		.await;
	identity_server
		.mock_async(|when, then| {
			when.method(HEAD).path("/card");
			then.status(500);
		})
		.await;

	let (rp, _, _) = build_reqwest_test_rp("https://rp.example/");
	let response = rp
		.select_provider(
			&test_session_id("sess-unreachable"),
			ProviderSelection::of(identity_server.url("/card")),
		)
		.await;

	match response {
		SelectionResponse::Form { status, error } => {
			assert_eq!(status, 400);
			assert!(error.contains("discovery"), "Error message should point at discovery: {error}");
		},
		SelectionResponse::Redirect(_) => panic!("Discovery failure must never redirect."),
	}
}

struct UnusedRegistry;
impl ClientRegistry for UnusedRegistry {
	fn client_for<'a>(&'a self, _issuer: &'a Url) -> ClientFuture<'a, Arc<dyn TokenClient>> {
		Box::pin(async { panic!("The registry must not be consulted without a resolver.") })
	}
}

#[tokio::test]
async fn missing_resolver_is_a_configuration_error() {
	let endpoints = RelyingPartyEndpoints::from_root(
		Url::parse("https://rp.example/").expect("Root fixture should parse successfully."),
	)
	.expect("Endpoint layout should derive successfully.");
	let rp = RelyingParty::new(
		Arc::new(MemorySessionStore::default()),
		Arc::new(MemoryConsentStore::default()),
		Arc::new(UnusedRegistry),
		Arc::new(WebIdClaimsResolver),
		ClientId::new("local-rp").expect("Client id fixture should be valid."),
		endpoints,
	);
	let response = rp
		.select_provider(
			&test_session_id("sess-no-resolver"),
			ProviderSelection::of("https://alice.example/#me"),
		)
		.await;

	match response {
		SelectionResponse::Form { status, .. } => assert_eq!(status, 500),
		SelectionResponse::Redirect(_) => panic!("Configuration errors must never redirect."),
	}
}
