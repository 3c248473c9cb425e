//! Built-in token client backed by the provider's well-known configuration
//! and the `oauth2` crate.
//!
//! [`BasicTokenClient`] covers deployments with a static relying-party
//! registration: it mints Authorization Code + PKCE authorize URLs, validates
//! the returned `state`, exchanges the code, and decodes the ID-token claims
//! payload. ID-token signature verification is delegated to deployments that
//! bring a verifying [`TokenClient`] implementation — the exchange happens
//! over the TLS channel to the token endpoint this client just discovered.

// crates.io
use oauth2::{
	AuthUrl, AuthorizationCode, ClientSecret, EndpointNotSet, EndpointSet, PkceCodeVerifier,
	RedirectUrl, StandardRevocableToken, StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenSecret, webid},
	client::{
		CallbackValidation, ClientFactory, ClientFuture, PkcePair, TokenClient, decode_jwt_claims,
		random_nonce, random_state,
	},
	error::{CallbackValidationError, ConfigError},
	http::ReqwestHttpClient,
	provider::ProviderConfig,
	session::{AuthState, Session},
};

/// Extra token-endpoint fields carrying the OpenID Connect ID token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IdTokenFields {
	/// Compact-serialized ID token, when the provider returned one.
	pub id_token: Option<String>,
}
impl oauth2::ExtraTokenFields for IdTokenFields {}

type OidcTokenResponse = StandardTokenResponse<IdTokenFields, BasicTokenType>;
type OidcClient<
	HasAuthUrl = EndpointNotSet,
	HasDeviceAuthUrl = EndpointNotSet,
	HasIntrospectionUrl = EndpointNotSet,
	HasRevocationUrl = EndpointNotSet,
	HasTokenUrl = EndpointNotSet,
> = oauth2::Client<
	BasicErrorResponse,
	OidcTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	HasAuthUrl,
	HasDeviceAuthUrl,
	HasIntrospectionUrl,
	HasRevocationUrl,
	HasTokenUrl,
>;
type ConfiguredOidcClient =
	OidcClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Token client bound to one provider's validated configuration.
pub struct BasicTokenClient {
	config: ProviderConfig,
	issuer_origin: Url,
	client_id: String,
	client_secret: Option<String>,
	redirect_uri: Url,
	scope: ScopeSet,
	http_client: ReqwestHttpClient,
}
impl BasicTokenClient {
	/// Creates a client for an already-fetched provider configuration.
	pub fn new(
		config: ProviderConfig,
		client_id: impl Into<String>,
		redirect_uri: Url,
		http_client: ReqwestHttpClient,
	) -> Result<Self, ConfigError> {
		let issuer_origin =
			webid::origin_of(&config.issuer).ok_or_else(|| ConfigError::InsecureEndpoint {
				endpoint: "issuer",
				url: config.issuer.to_string(),
			})?;

		Ok(Self {
			config,
			issuer_origin,
			client_id: client_id.into(),
			client_secret: None,
			redirect_uri,
			scope: default_scope(),
			http_client,
		})
	}

	/// Sets or replaces the confidential client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the requested scope set (defaults to `openid webid`).
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	fn oauth_client(&self) -> Result<ConfiguredOidcClient, ConfigError> {
		let auth_url = AuthUrl::new(self.config.authorization_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "authorization", source })?;
		let token_url = TokenUrl::new(self.config.token_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "token", source })?;
		let redirect_url = RedirectUrl::new(self.redirect_uri.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "callback", source })?;
		let mut client = OidcClient::new(oauth2::ClientId::new(self.client_id.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url);

		if let Some(secret) = &self.client_secret {
			client = client.set_client_secret(ClientSecret::new(secret.clone()));
		}

		Ok(client)
	}

	fn check_claims(
		&self,
		claims: &serde_json::Value,
		auth_state: &AuthState,
	) -> Result<(), CallbackValidationError> {
		if claims.get("nonce").and_then(serde_json::Value::as_str) != Some(&auth_state.nonce) {
			return Err(CallbackValidationError::NonceMismatch);
		}

		let advertised = claims.get("iss").and_then(serde_json::Value::as_str).unwrap_or_default();
		let advertised_origin = Url::parse(advertised).ok().and_then(|url| webid::origin_of(&url));

		if advertised_origin.as_ref() != Some(&self.issuer_origin) {
			return Err(CallbackValidationError::ForeignIssuer { advertised: advertised.to_owned() });
		}

		Ok(())
	}
}
impl TokenClient for BasicTokenClient {
	fn authorization_url<'a>(&'a self, session: &'a mut Session) -> ClientFuture<'a, Url> {
		Box::pin(async move {
			let state = random_state();
			let nonce = random_nonce();
			let pkce = PkcePair::generate();
			let mut url = self.config.authorization_endpoint.clone();

			{
				let mut pairs = url.query_pairs_mut();

				pairs.append_pair("response_type", "code");
				pairs.append_pair("client_id", &self.client_id);
				pairs.append_pair("redirect_uri", self.redirect_uri.as_str());

				if !self.scope.is_empty() {
					pairs.append_pair("scope", &self.scope.normalized());
				}

				pairs.append_pair("state", &state);
				pairs.append_pair("nonce", &nonce);
				pairs.append_pair("code_challenge", pkce.challenge());
				pairs.append_pair("code_challenge_method", "S256");
			}

			session.auth_state = Some(AuthState {
				issuer: self.issuer_origin.clone(),
				state,
				nonce,
				pkce_verifier: pkce.verifier().clone(),
			});

			Ok(url)
		})
	}

	fn validate_callback<'a>(
		&'a self,
		request_uri: &'a Url,
		session: &'a mut Session,
	) -> ClientFuture<'a, CallbackValidation> {
		Box::pin(async move {
			// The state stays in the session until the callback flow records
			// the identity; a replayed callback then fails at the token
			// endpoint rather than silently re-running.
			let auth_state = session
				.auth_state
				.clone()
				.ok_or(CallbackValidationError::MissingAuthState)?;
			let params: HashMap<String, String> = request_uri.query_pairs().into_owned().collect();

			if let Some(error) = params.get("error") {
				return Err(CallbackValidationError::ProviderError {
					error: error.clone(),
					description: params.get("error_description").cloned(),
				}
				.into());
			}
			if params.get("state") != Some(&auth_state.state) {
				return Err(CallbackValidationError::StateMismatch.into());
			}

			let code = params.get("code").ok_or(CallbackValidationError::MissingCode)?;
			let exchange_handle = self.http_client.exchange_handle();
			let oauth_client = self.oauth_client()?;
			let response = oauth_client
				.exchange_code(AuthorizationCode::new(code.clone()))
				.set_pkce_verifier(PkceCodeVerifier::new(
					auth_state.pkce_verifier.expose().to_owned(),
				))
				.request_async(&exchange_handle)
				.await
				.map_err(|err| CallbackValidationError::Exchange { reason: err.to_string() })?;
			let id_token = response
				.extra_fields()
				.id_token
				.clone()
				.ok_or(CallbackValidationError::MissingIdToken)?;
			let claims = decode_jwt_claims(&id_token)?;

			self.check_claims(&claims, &auth_state)?;

			let access_token = TokenSecret::new(response.access_token().secret().as_str());
			let refresh_token =
				response.refresh_token().map(|token| TokenSecret::new(token.secret().as_str()));
			let expires_in = response
				.expires_in()
				.and_then(|duration| i64::try_from(duration.as_secs()).ok())
				.map(Duration::seconds);

			Ok(CallbackValidation { claims, access_token, refresh_token, expires_in })
		})
	}
}
impl Debug for BasicTokenClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicTokenClient")
			.field("issuer", &self.issuer_origin.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("redirect_uri", &self.redirect_uri.as_str())
			.finish()
	}
}

/// [`ClientFactory`] building [`BasicTokenClient`]s from each issuer's
/// well-known configuration.
#[derive(Clone)]
pub struct BasicClientFactory {
	http_client: ReqwestHttpClient,
	client_id: String,
	client_secret: Option<String>,
	callback_base: Url,
	scope: ScopeSet,
}
impl BasicClientFactory {
	/// Creates a factory registering `client_id` at every issuer.
	///
	/// `callback_base` is this node's callback endpoint; the URI-encoded
	/// issuer origin is appended as the final path segment.
	pub fn new(
		http_client: ReqwestHttpClient,
		client_id: impl Into<String>,
		callback_base: Url,
	) -> Self {
		let mut callback_base = callback_base;

		if !callback_base.path().ends_with('/') {
			let path = format!("{}/", callback_base.path());

			callback_base.set_path(&path);
		}

		Self {
			http_client,
			client_id: client_id.into(),
			client_secret: None,
			callback_base,
			scope: default_scope(),
		}
	}

	/// Sets or replaces the confidential client secret.
	pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Overrides the requested scope set (defaults to `openid webid`).
	pub fn with_scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}
}
impl ClientFactory for BasicClientFactory {
	fn build<'a>(&'a self, issuer: &'a Url) -> ClientFuture<'a, Arc<dyn TokenClient>> {
		Box::pin(async move {
			let config = ProviderConfig::fetch(&self.http_client, issuer).await?;
			let segment = urlencoding::encode(&issuer.origin().ascii_serialization()).into_owned();
			let redirect_uri = self.callback_base.join(&segment).map_err(|source| {
				ConfigError::InvalidEndpoint { endpoint: "callback", source }
			})?;
			let mut client = BasicTokenClient::new(
				config,
				self.client_id.clone(),
				redirect_uri,
				self.http_client.clone(),
			)?
			.with_scope(self.scope.clone());

			if let Some(secret) = &self.client_secret {
				client = client.with_client_secret(secret.clone());
			}

			Ok(Arc::new(client) as Arc<dyn TokenClient>)
		})
	}
}
impl Debug for BasicClientFactory {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BasicClientFactory")
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("callback_base", &self.callback_base.as_str())
			.finish()
	}
}

fn default_scope() -> ScopeSet {
	ScopeSet::new(["openid", "webid"]).unwrap_or_default()
}
