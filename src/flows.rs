//! High-level flow orchestrators for the relying party.
//!
//! [`RelyingParty`] owns the collaborator capabilities (session store,
//! durable consent store, per-issuer client registry, claims resolver,
//! logout handler) plus the endpoint configuration, so the individual flows
//! — provider selection, callback handling, consent decisions, and the host
//! bridge — can focus on their own state machines.

pub mod bridge;
pub mod callback;
pub mod consent;
pub mod select;

pub use bridge::*;
pub use consent::*;
pub use select::*;

// self
use crate::{
	_prelude::*,
	auth::{ClientId, SessionId},
	client::{ClientRegistry, IdentityResolver, LogoutHandler, SessionStoreLogout},
	error::ConfigError,
	provider::ProviderResolver,
	session::Session,
	store::{ConsentStore, SessionStore},
};
#[cfg(feature = "reqwest")]
use crate::{
	client::{BasicClientFactory, CachedClientRegistry, WebIdClaimsResolver},
	http::ReqwestHttpClient,
};

/// Absolute URLs of this node's own HTTP surface.
///
/// The web layer owns routing; the flows only need to know where the login
/// form, the interactive consent page, and the callback endpoint live so they
/// can mint redirect targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelyingPartyEndpoints {
	/// Site root, the default post-login redirect target.
	pub root: Url,
	/// Login entry point rendering the provider-selection form.
	pub login: Url,
	/// Interactive consent page.
	pub consent: Url,
	/// Callback base; the URI-encoded issuer is appended as a path segment.
	pub callback: Url,
}
impl RelyingPartyEndpoints {
	/// Derives the conventional endpoint layout under `root`:
	/// `/login`, `/consent`, and `/auth/callback/`.
	pub fn from_root(root: Url) -> Result<Self, ConfigError> {
		let join = |endpoint: &'static str, path: &str| {
			root.join(path).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
		};
		let login = join("login", "login")?;
		let consent = join("consent", "consent")?;
		let callback = join("callback", "auth/callback/")?;

		Ok(Self { root, login, consent, callback })
	}
}

/// Coordinates the relying-party authentication flows.
pub struct RelyingParty {
	/// Session persistence capability.
	pub session_store: Arc<dyn SessionStore>,
	/// Durable record of prior consent decisions.
	pub consent_store: Arc<dyn ConsentStore>,
	/// Per-issuer token-client registry.
	pub registry: Arc<dyn ClientRegistry>,
	/// Claims-to-WebID resolver.
	pub identity_resolver: Arc<dyn IdentityResolver>,
	/// Session termination collaborator.
	pub logout_handler: Arc<dyn LogoutHandler>,
	/// This node's own first-party client registration; consent for it is
	/// always implicit.
	pub local_client_id: ClientId,
	/// Redirect targets on this node's HTTP surface.
	pub endpoints: RelyingPartyEndpoints,
	/// Grants consent to every authenticated subject without a consent page
	/// (for deployments that forgo interactive consent).
	pub skip_consent: bool,
	resolver: Option<Arc<ProviderResolver>>,
}
impl RelyingParty {
	/// Creates a relying party from explicit collaborator capabilities.
	///
	/// The logout handler defaults to destroying the stored session; the
	/// provider resolver is attached separately via
	/// [`with_resolver`](Self::with_resolver) because deployments acting only
	/// as a callback target may not need discovery at all.
	pub fn new(
		session_store: Arc<dyn SessionStore>,
		consent_store: Arc<dyn ConsentStore>,
		registry: Arc<dyn ClientRegistry>,
		identity_resolver: Arc<dyn IdentityResolver>,
		local_client_id: ClientId,
		endpoints: RelyingPartyEndpoints,
	) -> Self {
		let logout_handler = Arc::new(SessionStoreLogout::new(session_store.clone()));

		Self {
			session_store,
			consent_store,
			registry,
			identity_resolver,
			logout_handler,
			local_client_id,
			endpoints,
			skip_consent: false,
			resolver: None,
		}
	}

	/// Attaches the provider-resolution capability.
	pub fn with_resolver(mut self, resolver: ProviderResolver) -> Self {
		self.resolver = Some(Arc::new(resolver));

		self
	}

	/// Replaces the logout collaborator.
	pub fn with_logout_handler(mut self, handler: Arc<dyn LogoutHandler>) -> Self {
		self.logout_handler = handler;

		self
	}

	/// Toggles consent skipping for authenticated subjects.
	pub fn with_skip_consent(mut self, skip: bool) -> Self {
		self.skip_consent = skip;

		self
	}

	pub(crate) fn resolver(&self) -> Result<&ProviderResolver> {
		self.resolver.as_deref().ok_or_else(|| ConfigError::MissingResolver.into())
	}

	/// Sessions are created on first contact.
	pub(crate) async fn load_or_create_session(&self, id: &SessionId) -> Result<Session> {
		Ok(self.session_store.load(id).await?.unwrap_or_else(|| Session::new(id.clone())))
	}
}
#[cfg(feature = "reqwest")]
impl RelyingParty {
	/// Creates a relying party wired to the crate's default reqwest stack:
	/// a shared HTTP client backing both discovery and the basic token-client
	/// factory, plus the default claims resolver.
	///
	/// The factory registers `local_client_id` as a public client (PKCE, no
	/// secret) at every issuer; deployments with confidential registrations
	/// should assemble a [`BasicClientFactory`] themselves and use
	/// [`RelyingParty::new`].
	pub fn with_reqwest(
		session_store: Arc<dyn SessionStore>,
		consent_store: Arc<dyn ConsentStore>,
		local_client_id: ClientId,
		endpoints: RelyingPartyEndpoints,
	) -> Self {
		let http_client = ReqwestHttpClient::default();
		let factory = BasicClientFactory::new(
			http_client.clone(),
			local_client_id.as_ref(),
			endpoints.callback.clone(),
		);
		let registry = Arc::new(CachedClientRegistry::new(Arc::new(factory)));
		let resolver = ProviderResolver::new(Arc::new(http_client));

		Self::new(
			session_store,
			consent_store,
			registry,
			Arc::new(WebIdClaimsResolver),
			local_client_id,
			endpoints,
		)
		.with_resolver(resolver)
	}
}
impl Debug for RelyingParty {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RelyingParty")
			.field("local_client_id", &self.local_client_id)
			.field("endpoints", &self.endpoints)
			.field("skip_consent", &self.skip_consent)
			.field("resolver_configured", &self.resolver.is_some())
			.finish()
	}
}
