//! Per-issuer token-client registry with caching and singleflight builds.

// self
use crate::{
	_prelude::*,
	client::{ClientFuture, TokenClient},
};

/// Looks up the relying-party client registered for an issuer.
pub trait ClientRegistry
where
	Self: Send + Sync,
{
	/// Returns the client for `issuer`, building or loading it on demand.
	fn client_for<'a>(&'a self, issuer: &'a Url) -> ClientFuture<'a, Arc<dyn TokenClient>>;
}

/// Builds a fresh token client for an issuer (dynamic registration, static
/// configuration, or whatever the deployment does).
pub trait ClientFactory
where
	Self: Send + Sync,
{
	/// Constructs the client for `issuer`.
	fn build<'a>(&'a self, issuer: &'a Url) -> ClientFuture<'a, Arc<dyn TokenClient>>;
}

/// [`ClientRegistry`] that caches factory-built clients per issuer.
///
/// Builds are singleflighted per issuer key so concurrent requests for one
/// provider trigger exactly one factory call; failed builds leave no cache
/// entry and the next request retries.
pub struct CachedClientRegistry {
	factory: Arc<dyn ClientFactory>,
	cache: RwLock<HashMap<String, Arc<dyn TokenClient>>>,
	build_guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl CachedClientRegistry {
	/// Wraps a factory with an empty cache.
	pub fn new(factory: Arc<dyn ClientFactory>) -> Self {
		Self { factory, cache: RwLock::new(HashMap::new()), build_guards: Mutex::new(HashMap::new()) }
	}

	/// Returns (and creates on demand) the singleflight guard for a key.
	fn guard(&self, key: &str) -> Arc<AsyncMutex<()>> {
		let mut guards = self.build_guards.lock();

		guards.entry(key.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	fn cached(&self, key: &str) -> Option<Arc<dyn TokenClient>> {
		self.cache.read().get(key).cloned()
	}
}
impl ClientRegistry for CachedClientRegistry {
	fn client_for<'a>(&'a self, issuer: &'a Url) -> ClientFuture<'a, Arc<dyn TokenClient>> {
		Box::pin(async move {
			let key = issuer.origin().ascii_serialization();

			if let Some(client) = self.cached(&key) {
				return Ok(client);
			}

			let guard = self.guard(&key);
			let _singleflight = guard.lock().await;

			// A concurrent build may have finished while we waited.
			if let Some(client) = self.cached(&key) {
				return Ok(client);
			}

			let client = self.factory.build(issuer).await?;

			self.cache.write().insert(key, client.clone());

			Ok(client)
		})
	}
}
impl Debug for CachedClientRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CachedClientRegistry")
			.field("cached_issuers", &self.cache.read().keys().cloned().collect::<Vec<_>>())
			.finish()
	}
}
