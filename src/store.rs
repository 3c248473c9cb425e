//! Storage contracts consumed by the flows, plus in-memory implementations.
//!
//! The flows only require capability-shaped stores: sessions addressed by an
//! opaque identifier and a durable record of per-client consent decisions.
//! Persistent backends (files, databases) live with the host application.

pub mod memory;

pub use memory::{MemoryConsentStore, MemorySessionStore};

// self
use crate::{_prelude::*, auth::ClientId, session::Session};

/// Boxed future returned by store implementations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Session persistence contract, addressed by the browser session id.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Fetches the session for `id`, if one exists.
	fn load<'a>(&'a self, id: &'a crate::auth::SessionId) -> StoreFuture<'a, Option<Session>>;

	/// Persists or replaces the session keyed by its own id.
	fn save(&self, session: Session) -> StoreFuture<'_, ()>;

	/// Removes the session for `id`; removing a missing session is a no-op.
	fn destroy<'a>(&'a self, id: &'a crate::auth::SessionId) -> StoreFuture<'a, ()>;
}

/// Durable record of prior consent decisions, keyed by client id.
pub trait ConsentStore
where
	Self: Send + Sync,
{
	/// Returns true when the client already holds a durable consent grant.
	fn has_consent<'a>(&'a self, client: &'a ClientId) -> StoreFuture<'a, bool>;

	/// Records a consent grant for the client.
	fn save_consent<'a>(&'a self, client: &'a ClientId) -> StoreFuture<'a, ()>;
}

/// Error type produced by store implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;
	use std::error::Error as StdError;

	#[test]
	fn store_error_converts_into_crate_error_with_source() {
		let store_error = StoreError::Backend { message: "session backend unreachable".into() };
		let crate_error: Error = store_error.clone().into();

		assert!(matches!(crate_error, Error::Store(_)));
		assert!(crate_error.to_string().contains("session backend unreachable"));

		let source = StdError::source(&crate_error)
			.expect("Crate error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}
}
