//! Provider discovery against a WebID identity.
//!
//! Discovery asks "which OpenID Connect issuer is authoritative for this
//! identity?" using an ordered list of strategies with explicit
//! short-circuit-on-first-success semantics:
//!
//! 1. [`HeaderProbeStrategy`] issues a capability probe against the identity
//!    URI and reads its `Link` response headers for the
//!    `http://openid.net/specs/connect/1.0/issuer` relation.
//! 2. [`ProfileStrategy`] fetches the identity's profile document as a
//!    linked-data graph and collects every object of an OIDC-issuer
//!    statement on the identity node, preserving document order.
//!
//! Network failure or a non-success status at either step is a typed
//! "identity unreachable" failure; a reachable identity that advertises
//! nothing yields an empty candidate list, which resolvers report as "no
//! issuer advertised" — the two must never be conflated, operators debug
//! them differently.

pub mod link;
pub mod profile;

// self
use crate::{_prelude::*, error::DiscoveryError, http::DiscoveryHttpClient};

/// Media type requested for profile documents.
const PROFILE_ACCEPT: &str = "application/ld+json";

/// Boxed future returned by [`DiscoveryStrategy`] implementations.
pub type DiscoveryFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// One step of the ordered discovery chain.
///
/// Strategies return raw candidate values — validation and origin reduction
/// belong to the resolver, which owns the error reporting for malformed
/// advertisements. An empty list means "this strategy found nothing"; the
/// chain then falls through to the next strategy.
pub trait DiscoveryStrategy
where
	Self: Send + Sync,
{
	/// Stable label used in spans and diagnostics.
	fn name(&self) -> &'static str;

	/// Collects issuer candidates advertised by `identity`.
	fn candidates<'a>(
		&'a self,
		http_client: &'a dyn DiscoveryHttpClient,
		identity: &'a Url,
	) -> DiscoveryFuture<'a, Vec<String>>;
}

/// Reads the issuer relation from the identity's `Link` response headers.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeaderProbeStrategy;
impl DiscoveryStrategy for HeaderProbeStrategy {
	fn name(&self) -> &'static str {
		"header_probe"
	}

	fn candidates<'a>(
		&'a self,
		http_client: &'a dyn DiscoveryHttpClient,
		identity: &'a Url,
	) -> DiscoveryFuture<'a, Vec<String>> {
		Box::pin(async move {
			let probe = http_client
				.probe(identity)
				.await
				.map_err(|_| unreachable_identity(identity))?;

			if !probe.is_success() {
				return Err(unreachable_identity(identity).into());
			}

			Ok(link::issuer_targets(&probe.link_headers))
		})
	}
}

/// Reads OIDC-issuer statements from the identity's profile document.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProfileStrategy;
impl DiscoveryStrategy for ProfileStrategy {
	fn name(&self) -> &'static str {
		"profile"
	}

	fn candidates<'a>(
		&'a self,
		http_client: &'a dyn DiscoveryHttpClient,
		identity: &'a Url,
	) -> DiscoveryFuture<'a, Vec<String>> {
		Box::pin(async move {
			let document = http_client
				.fetch_document(identity, PROFILE_ACCEPT)
				.await
				.map_err(|_| unreachable_identity(identity))?;

			if !document.is_success() {
				return Err(unreachable_identity(identity).into());
			}

			// An unparsable profile counts as reachable-but-silent, not as a
			// failure; the resolver reports the empty list.
			Ok(profile::issuer_candidates(&document.body, identity))
		})
	}
}

/// Ordered discovery chain over the identity URI.
pub struct LinkDiscovery {
	http_client: Arc<dyn DiscoveryHttpClient>,
	strategies: Vec<Arc<dyn DiscoveryStrategy>>,
}
impl LinkDiscovery {
	/// Creates a chain with the default strategy order: header probe, then
	/// profile fallback.
	pub fn new(http_client: Arc<dyn DiscoveryHttpClient>) -> Self {
		Self {
			http_client,
			strategies: vec![Arc::new(HeaderProbeStrategy), Arc::new(ProfileStrategy)],
		}
	}

	/// Replaces the strategy chain (e.g., to add a Turtle-capable profile
	/// reader).
	pub fn with_strategies(mut self, strategies: Vec<Arc<dyn DiscoveryStrategy>>) -> Self {
		self.strategies = strategies;

		self
	}

	/// Runs the chain; the first strategy yielding any candidate wins.
	///
	/// An empty result means every strategy reached the identity and none
	/// found an advertisement.
	pub async fn discover(&self, identity: &Url) -> Result<Vec<String>> {
		for strategy in &self.strategies {
			let found = strategy.candidates(self.http_client.as_ref(), identity).await?;

			if !found.is_empty() {
				return Ok(found);
			}
		}

		Ok(Vec::new())
	}
}
impl Debug for LinkDiscovery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LinkDiscovery")
			.field("strategies", &self.strategies.iter().map(|s| s.name()).collect::<Vec<_>>())
			.finish()
	}
}

fn unreachable_identity(identity: &Url) -> DiscoveryError {
	DiscoveryError::IdentityUnreachable { identity: identity.to_string() }
}
