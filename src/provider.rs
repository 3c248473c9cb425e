//! Provider resolution: "is this URI itself a provider?" versus "discover
//! the provider for this identity", normalized to an HTTP(S) origin.

// std
use std::collections::BTreeMap;
// self
use crate::{
	_prelude::*,
	auth::webid,
	discovery::LinkDiscovery,
	error::{ConfigError, DiscoveryError, UserInputError},
	http::DiscoveryHttpClient,
};

/// Well-known path of the OpenID provider configuration document, relative to
/// the provider origin.
pub const WELL_KNOWN_OPENID: &str = ".well-known/openid-configuration";

/// Media type requested for provider configuration documents.
const METADATA_ACCEPT: &str = "application/json";

/// Resolves a user-supplied URI (a WebID or a provider URI) to the origin of
/// the authoritative OpenID Connect provider.
pub struct ProviderResolver {
	http_client: Arc<dyn DiscoveryHttpClient>,
	discovery: LinkDiscovery,
}
impl ProviderResolver {
	/// Creates a resolver with the default discovery chain.
	pub fn new(http_client: Arc<dyn DiscoveryHttpClient>) -> Self {
		let discovery = LinkDiscovery::new(http_client.clone());

		Self { http_client, discovery }
	}

	/// Replaces the discovery chain.
	pub fn with_discovery(mut self, discovery: LinkDiscovery) -> Self {
		self.discovery = discovery;

		self
	}

	/// Resolves `uri` to a provider origin.
	///
	/// Steps, in order:
	///
	/// 1. **Self-check** — probe `<origin>/.well-known/openid-configuration`;
	///    a success means `uri` already points at a provider and its origin is
	///    returned without running discovery.
	/// 2. **Discovery** — run the link-discovery chain against the identity.
	/// 3. **Disambiguation** — normalize every candidate to an origin and
	///    validate it; when `expected_issuer` is supplied (callers resuming a
	///    callback know which issuer they stored) the first validated
	///    candidate equal to it wins, otherwise the first validated candidate
	///    does. If nothing validates, the last validation error surfaces.
	pub async fn resolve(&self, uri: &Url, expected_issuer: Option<&Url>) -> Result<Url> {
		let origin = webid::origin_of(uri).ok_or_else(|| UserInputError::MalformedIdentity {
			identity: uri.to_string(),
			source: url::ParseError::RelativeUrlWithoutBase,
		})?;

		if self.is_provider_origin(&origin).await {
			return Ok(origin);
		}

		let candidates = self.discovery.discover(uri).await?;

		if candidates.is_empty() {
			return Err(DiscoveryError::NoIssuerAdvertised { identity: uri.to_string() }.into());
		}

		let expected_origin = expected_issuer.and_then(webid::origin_of);
		let mut first_valid = None;
		let mut last_error = None;

		for raw in &candidates {
			match validate_candidate(raw, uri) {
				Ok(candidate_origin) => {
					if Some(&candidate_origin) == expected_origin.as_ref() {
						return Ok(candidate_origin);
					}
					if first_valid.is_none() {
						first_valid = Some(candidate_origin);
					}
				},
				Err(error) => last_error = Some(error),
			}
		}

		if let Some(origin) = first_valid {
			return Ok(origin);
		}

		Err(last_error
			.unwrap_or(DiscoveryError::NoIssuerAdvertised { identity: uri.to_string() })
			.into())
	}

	/// Opportunistic self-check; probe failures fall through to discovery.
	async fn is_provider_origin(&self, origin: &Url) -> bool {
		let Ok(well_known) = origin.join(WELL_KNOWN_OPENID) else {
			return false;
		};

		match self.http_client.probe(&well_known).await {
			Ok(probe) => probe.is_success(),
			Err(_) => false,
		}
	}
}
impl Debug for ProviderResolver {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ProviderResolver").field("discovery", &self.discovery).finish()
	}
}

/// Validates one advertised issuer value and reduces it to an origin.
fn validate_candidate(raw: &str, identity: &Url) -> Result<Url, DiscoveryError> {
	let malformed = || DiscoveryError::MalformedIssuer {
		identity: identity.to_string(),
		value: raw.to_owned(),
	};
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(malformed());
	}

	let parsed = Url::parse(trimmed).map_err(|_| malformed())?;

	webid::origin_of(&parsed).ok_or_else(malformed)
}

/// OpenID provider configuration, as served from the well-known document.
///
/// Only the subset the relying party consumes is modeled; unknown members are
/// preserved in [`extra`](Self::extra) so callers can reach provider-specific
/// metadata without another fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
	/// Issuer identifier; must sit on the origin the document was fetched
	/// from.
	pub issuer: Url,
	/// Authorization endpoint used for the redirect leg.
	pub authorization_endpoint: Url,
	/// Token endpoint used for the code exchange.
	pub token_endpoint: Url,
	/// Remaining configuration members, untouched.
	#[serde(flatten)]
	pub extra: BTreeMap<String, serde_json::Value>,
}
impl ProviderConfig {
	/// Parses a configuration document, reporting the JSON path on failure.
	pub fn parse(body: &str) -> Result<Self, ConfigError> {
		let deserializer = &mut serde_json::Deserializer::from_str(body);

		serde_path_to_error::deserialize(deserializer)
			.map_err(|source| ConfigError::MetadataParse { source })
	}

	/// Fetches and validates the configuration for the provider at `issuer`.
	pub async fn fetch(http_client: &dyn DiscoveryHttpClient, issuer: &Url) -> Result<Self> {
		let origin = webid::origin_of(issuer).ok_or_else(|| ConfigError::InsecureEndpoint {
			endpoint: "issuer",
			url: issuer.to_string(),
		})?;
		let well_known = origin.join(WELL_KNOWN_OPENID).map_err(|source| {
			ConfigError::InvalidEndpoint { endpoint: "provider configuration", source }
		})?;
		let response = http_client.fetch_document(&well_known, METADATA_ACCEPT).await?;

		if !response.is_success() {
			return Err(ConfigError::MetadataUnavailable {
				url: well_known.to_string(),
				status: response.status,
			}
			.into());
		}

		let config = Self::parse(&response.body)?;

		config.validate(&origin)?;

		Ok(config)
	}

	/// Endpoint sanity checks: HTTP(S) everywhere, issuer on the probed
	/// origin.
	pub fn validate(&self, origin: &Url) -> Result<(), ConfigError> {
		validate_endpoint("authorization", &self.authorization_endpoint)?;
		validate_endpoint("token", &self.token_endpoint)?;

		if webid::origin_of(&self.issuer).as_ref() != Some(origin) {
			return Err(ConfigError::IssuerMismatch {
				expected: origin.to_string(),
				advertised: self.issuer.to_string(),
			});
		}

		Ok(())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	if url.scheme() == "https" || url.scheme() == "http" {
		Ok(())
	} else {
		Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn candidate_validation_reduces_to_origins() {
		let identity = Url::parse("https://alice.example/#me")
			.expect("Identity fixture should parse successfully.");
		let origin = validate_candidate("https://provider.example/issuer?x=1", &identity)
			.expect("Candidate with a path should validate.");

		assert_eq!(origin.origin().ascii_serialization(), "https://provider.example");

		for bad in ["", "   ", "not a url", "mailto:op@example.com"] {
			let err = validate_candidate(bad, &identity)
				.expect_err("Malformed candidate should be rejected.");

			assert!(matches!(err, DiscoveryError::MalformedIssuer { .. }));
			assert!(err.to_string().contains("https://alice.example/#me"));
		}
	}

	#[test]
	fn provider_config_parses_and_validates() {
		let body = r#"{
			"issuer": "https://provider.example",
			"authorization_endpoint": "https://provider.example/authorize",
			"token_endpoint": "https://provider.example/token",
			"jwks_uri": "https://provider.example/jwks"
		}"#;
		let config = ProviderConfig::parse(body).expect("Configuration document should parse.");
		let origin = Url::parse("https://provider.example")
			.expect("Origin fixture should parse successfully.");

		config.validate(&origin).expect("Matching issuer origin should validate.");

		assert!(config.extra.contains_key("jwks_uri"));

		let foreign = Url::parse("https://other.example")
			.expect("Foreign origin fixture should parse successfully.");
		let err = config.validate(&foreign).expect_err("Foreign issuer must be rejected.");

		assert!(matches!(err, ConfigError::IssuerMismatch { .. }));
	}

	#[test]
	fn provider_config_parse_reports_the_json_path() {
		let err = ProviderConfig::parse(r#"{"issuer": "https://provider.example"}"#)
			.expect_err("Missing endpoints should fail to parse.");

		assert!(matches!(err, ConfigError::MetadataParse { .. }));
	}
}
