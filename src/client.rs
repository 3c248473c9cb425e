//! External collaborator contracts: per-issuer token clients, claims-to-WebID
//! resolution, and logout delegation.
//!
//! The flows never talk OAuth wire formats themselves — they drive a
//! [`TokenClient`] obtained from a [`ClientRegistry`](registry::ClientRegistry)
//! and hand its claims to an [`IdentityResolver`]. Deployments bring their own
//! implementations or use the built-in ones
//! ([`BasicTokenClient`](basic::BasicTokenClient) behind the `reqwest`
//! feature).

#[cfg(feature = "reqwest")] pub mod basic;
pub mod registry;

#[cfg(feature = "reqwest")] pub use basic::*;
pub use registry::*;

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::{Rng, distr::Alphanumeric};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret},
	error::{CallbackValidationError, IdentityResolutionError},
	session::Session,
	store::SessionStore,
};

const STATE_LEN: usize = 32;
const NONCE_LEN: usize = 32;
const PKCE_VERIFIER_LEN: usize = 64;

/// Boxed future returned by collaborator implementations.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Validated outcome of a provider's authorization response.
#[derive(Clone, Debug)]
pub struct CallbackValidation {
	/// Decoded identity claims (ID-token payload or equivalent).
	pub claims: serde_json::Value,
	/// Access token issued by the provider.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Relative expiry hint for the access token.
	pub expires_in: Option<Duration>,
}

/// Per-issuer relying-party client capability.
///
/// The client owns all state/nonce/PKCE bookkeeping: `authorization_url`
/// records whatever it needs in the session's
/// [`auth_state`](Session::auth_state) slot and `validate_callback` consumes
/// it. Both take the session mutably so that bookkeeping never leaks outside
/// the capability.
pub trait TokenClient
where
	Self: Send + Sync,
{
	/// Mints the provider's authorization URL for the current session.
	fn authorization_url<'a>(&'a self, session: &'a mut Session) -> ClientFuture<'a, Url>;

	/// Validates the authorization response carried by `request_uri` and
	/// exchanges it for tokens and claims.
	fn validate_callback<'a>(
		&'a self,
		request_uri: &'a Url,
		session: &'a mut Session,
	) -> ClientFuture<'a, CallbackValidation>;
}

/// Maps validated claims onto the authenticated WebID.
pub trait IdentityResolver
where
	Self: Send + Sync,
{
	/// Derives the identity URI from the claims, or fails with the cause.
	fn identity_from(&self, claims: &serde_json::Value) -> Result<Url, IdentityResolutionError>;
}

/// Default resolver: the `webid` claim wins, then a URI-shaped `sub`.
///
/// A non-URI `sub` is not treated as an identity — plain OIDC subjects are
/// opaque strings and must not be mistaken for WebIDs.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebIdClaimsResolver;
impl IdentityResolver for WebIdClaimsResolver {
	fn identity_from(&self, claims: &serde_json::Value) -> Result<Url, IdentityResolutionError> {
		if let Some(webid) = claims.get("webid") {
			let raw = webid.as_str().unwrap_or_default();

			return parse_http_url(raw)
				.ok_or_else(|| IdentityResolutionError::NonUriClaim {
					claim: "webid",
					value: webid.to_string(),
				});
		}
		if let Some(sub) = claims.get("sub").and_then(serde_json::Value::as_str)
			&& let Some(url) = parse_http_url(sub)
		{
			return Ok(url);
		}

		Err(IdentityResolutionError::MissingIdentityClaim)
	}
}

/// Session termination collaborator used by the host bridge.
pub trait LogoutHandler
where
	Self: Send + Sync,
{
	/// Terminates the session for `id`.
	fn logout<'a>(&'a self, id: &'a SessionId) -> ClientFuture<'a, ()>;
}

/// Default logout collaborator that destroys the stored session.
pub struct SessionStoreLogout(Arc<dyn SessionStore>);
impl SessionStoreLogout {
	/// Wraps the session store the relying party already uses.
	pub fn new(store: Arc<dyn SessionStore>) -> Self {
		Self(store)
	}
}
impl LogoutHandler for SessionStoreLogout {
	fn logout<'a>(&'a self, id: &'a SessionId) -> ClientFuture<'a, ()> {
		Box::pin(async move {
			self.0.destroy(id).await?;

			Ok(())
		})
	}
}

/// PKCE verifier/challenge pair (RFC 7636 S256).
#[derive(Clone)]
pub struct PkcePair {
	verifier: TokenSecret,
	challenge: String,
}
impl PkcePair {
	/// Generates a fresh random pair.
	pub fn generate() -> Self {
		let verifier = random_string(PKCE_VERIFIER_LEN);
		let challenge = compute_pkce_challenge(&verifier);

		Self { verifier: TokenSecret::new(verifier), challenge }
	}

	/// The secret verifier, to be stored in the session.
	pub fn verifier(&self) -> &TokenSecret {
		&self.verifier
	}

	/// The derived challenge sent on the authorize leg.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair").field("challenge", &self.challenge).finish()
	}
}

/// Generates random `state`/`nonce` material for authorization requests.
pub fn random_state() -> String {
	random_string(STATE_LEN)
}

/// See [`random_state`]; nonces use the same alphabet.
pub fn random_nonce() -> String {
	random_string(NONCE_LEN)
}

/// Decodes the claims payload of a compact JWT without verifying signatures.
///
/// Verification belongs to the [`TokenClient`] implementation; this helper
/// only splits and base64url-decodes the payload segment for implementations
/// that delegate verification elsewhere.
pub fn decode_jwt_claims(token: &str) -> Result<serde_json::Value, CallbackValidationError> {
	let decode_error = |message: &str| CallbackValidationError::ClaimsDecode {
		message: message.to_owned(),
	};
	let mut segments = token.split('.');
	let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
		(Some(_), Some(payload), Some(_), None) => payload,
		_ => return Err(decode_error("token is not a three-segment compact JWT")),
	};
	let bytes = URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|_| decode_error("payload is not base64url"))?;

	serde_json::from_slice(&bytes).map_err(|_| decode_error("payload is not a JSON object"))
}

fn parse_http_url(raw: &str) -> Option<Url> {
	let url = Url::parse(raw).ok()?;

	matches!(url.scheme(), "http" | "https").then_some(url)
}

fn random_string(len: usize) -> String {
	rand::rng().sample_iter(Alphanumeric).take(len).map(char::from).collect()
}

fn compute_pkce_challenge(verifier: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(verifier.as_bytes());

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}
