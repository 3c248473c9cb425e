//! Relying-party error types shared across discovery, flows, and stores.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relying-party error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Store(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// End-user supplied a missing or malformed value.
	#[error(transparent)]
	UserInput(#[from] UserInputError),
	/// Provider discovery failed against the identity.
	#[error(transparent)]
	Discovery(#[from] DiscoveryError),
	/// Callback claims did not yield a usable identity.
	#[error(transparent)]
	IdentityResolution(#[from] IdentityResolutionError),
	/// Authorization response validation or code exchange failed.
	#[error(transparent)]
	CallbackValidation(#[from] CallbackValidationError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
}
impl Error {
	/// HTTP status class the error maps onto when rendered by a web layer.
	///
	/// User-input and discovery failures re-render forms with `400`, identity
	/// resolution and callback validation reject with `401`, configuration and
	/// storage failures surface as `500`, transport failures as `502`.
	pub fn status(&self) -> u16 {
		match self {
			Error::UserInput(_) | Error::Discovery(_) => 400,
			Error::IdentityResolution(_) | Error::CallbackValidation(_) => 401,
			Error::Config(_) | Error::Store(_) => 500,
			Error::Transport(_) => 502,
		}
	}
}

/// Configuration and validation failures raised by the relying party.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// No provider-resolution capability has been configured.
	#[error("No provider resolver is configured for this relying party.")]
	MissingResolver,
	/// A relying-party endpoint URL cannot be derived or parsed.
	#[error("The {endpoint} endpoint is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider metadata endpoints must use HTTP(S).
	#[error("The provider {endpoint} endpoint must use HTTP(S): {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Provider configuration document could not be fetched.
	#[error("Provider configuration at {url} answered with status {status}.")]
	MetadataUnavailable {
		/// Well-known URL that was fetched.
		url: String,
		/// HTTP status code the provider answered with.
		status: u16,
	},
	/// Provider configuration document could not be parsed.
	#[error("Provider configuration document is malformed.")]
	MetadataParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Provider configuration advertises an issuer outside the probed origin.
	#[error("Provider configuration advertises foreign issuer {advertised}; expected {expected}.")]
	IssuerMismatch {
		/// Origin the configuration document was fetched from.
		expected: String,
		/// Issuer value found in the document.
		advertised: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// End-user input failures recovered locally by re-rendering the form.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum UserInputError {
	/// Provider selection form was submitted without an identity.
	#[error("Enter a WebID or the URI of an OpenID Connect provider.")]
	MissingIdentity,
	/// Submitted identity is not a well-formed URI after normalization.
	#[error("`{identity}` is not a valid WebID or provider URI.")]
	MalformedIdentity {
		/// Raw value submitted by the user.
		identity: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Callback request path carries no issuer segment.
	#[error("Callback request is missing the issuer path segment.")]
	MissingIssuerSegment,
	/// Callback issuer segment does not decode to a well-formed URI.
	#[error("Callback issuer segment `{segment}` is not a valid URI.")]
	MalformedIssuerSegment {
		/// Raw segment value from the request path.
		segment: String,
	},
}

/// Provider discovery failures; messages carry the identity URI and point at
/// the discovery contract for operator debuggability.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum DiscoveryError {
	/// Identity did not answer the capability probe or the profile fetch.
	#[error(
		"Identity {identity} could not be reached during provider discovery; the identity must \
		 answer capability probes and profile requests per the WebID-OIDC discovery contract."
	)]
	IdentityUnreachable {
		/// Identity URI that failed to respond.
		identity: String,
	},
	/// Identity is reachable but advertises no issuer anywhere.
	#[error(
		"Identity {identity} does not advertise an OpenID Connect issuer; expected a Link header \
		 with rel=\"http://openid.net/specs/connect/1.0/issuer\" or a solid:oidcIssuer statement \
		 in the profile document."
	)]
	NoIssuerAdvertised {
		/// Identity URI that was inspected.
		identity: String,
	},
	/// Advertised issuer value cannot be reduced to an HTTP(S) origin.
	#[error("Identity {identity} advertises a malformed issuer URI: {value}.")]
	MalformedIssuer {
		/// Identity URI that advertised the value.
		identity: String,
		/// Offending issuer value.
		value: String,
	},
}

/// Identity resolution failures raised while mapping claims onto a WebID.
#[derive(Debug, ThisError)]
pub enum IdentityResolutionError {
	/// No claim in the callback response identifies the user.
	#[error("Callback claims are missing an identity claim (`webid` or URI-shaped `sub`).")]
	MissingIdentityClaim,
	/// The identity claim exists but is not an HTTP(S) URI.
	#[error("Claim `{claim}` is not an HTTP(S) URI: {value}.")]
	NonUriClaim {
		/// Claim name that was inspected.
		claim: &'static str,
		/// Claim value that failed to parse.
		value: String,
	},
	/// Custom resolver failure wrapping the underlying cause.
	#[error("Callback claims did not yield a usable identity.")]
	Other {
		/// Resolver-specific failure.
		#[source]
		source: BoxError,
	},
}
impl IdentityResolutionError {
	/// Wraps a resolver-specific failure inside [`IdentityResolutionError`].
	pub fn other(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Other { source: Box::new(src) }
	}
}

/// Authorization response validation failures raised by token clients.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum CallbackValidationError {
	/// Session carries no pending authorization state for this callback.
	#[error("Session has no pending authorization state for this callback.")]
	MissingAuthState,
	/// Returned `state` parameter does not match the stored value.
	#[error("Authorization state mismatch.")]
	StateMismatch,
	/// Callback carries neither a code nor an error parameter.
	#[error("Authorization response is missing the `code` parameter.")]
	MissingCode,
	/// Provider answered the authorization request with an OAuth error.
	#[error("Provider rejected the authorization request: {error}.")]
	ProviderError {
		/// OAuth `error` parameter from the callback query.
		error: String,
		/// Optional `error_description` parameter.
		description: Option<String>,
	},
	/// Token endpoint rejected the code exchange (e.g., a replayed code).
	#[error("Authorization code exchange failed: {reason}.")]
	Exchange {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Token response did not include an ID token.
	#[error("Token response is missing the ID token.")]
	MissingIdToken,
	/// ID token claims payload could not be decoded.
	#[error("ID token claims could not be decoded: {message}.")]
	ClaimsDecode {
		/// Human-readable decode failure.
		message: String,
	},
	/// ID token `nonce` claim does not match the stored value.
	#[error("ID token nonce mismatch.")]
	NonceMismatch,
	/// ID token `iss` claim sits outside the expected issuer origin.
	#[error("ID token was issued by a foreign issuer: {advertised}.")]
	ForeignIssuer {
		/// Issuer value found in the claims.
		advertised: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred during a discovery or token request.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during a discovery or token request.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
