//! Relying-party core for WebID-based OpenID Connect—provider discovery, the
//! selection/callback/consent flow machine, and capability-shaped
//! collaborator contracts in one crate built for production.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod discovery;
pub mod error;
pub mod flows;
pub mod http;
pub mod obs;
pub mod provider;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::{ClientId, SessionId},
		client::{BasicClientFactory, CachedClientRegistry, WebIdClaimsResolver},
		flows::{RelyingParty, RelyingPartyEndpoints},
		http::ReqwestHttpClient,
		provider::ProviderResolver,
		store::{MemoryConsentStore, MemorySessionStore},
	};

	/// Builds a reqwest HTTP client that accepts the self-signed certificates
	/// produced by `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Parses a session-id fixture.
	pub fn test_session_id(value: &str) -> SessionId {
		SessionId::new(value).expect("Failed to build session identifier for tests.")
	}

	/// Constructs a [`RelyingParty`] rooted at `root`, backed by in-memory
	/// stores, the default discovery chain, and the insecure reqwest
	/// transport used across integration tests.
	pub fn build_reqwest_test_rp(
		root: &str,
	) -> (RelyingParty, Arc<MemorySessionStore>, Arc<MemoryConsentStore>) {
		let root = Url::parse(root).expect("Failed to parse test relying-party root URL.");
		let endpoints = RelyingPartyEndpoints::from_root(root)
			.expect("Failed to derive test relying-party endpoints.");
		let http_client = test_reqwest_http_client();
		let factory =
			BasicClientFactory::new(http_client.clone(), "local-rp", endpoints.callback.clone());
		let registry = Arc::new(CachedClientRegistry::new(Arc::new(factory)));
		let resolver = ProviderResolver::new(Arc::new(http_client));
		let session_store = Arc::new(MemorySessionStore::default());
		let consent_store = Arc::new(MemoryConsentStore::default());
		let local_client_id =
			ClientId::new("local-rp").expect("Failed to build local client identifier for tests.");
		let rp = RelyingParty::new(
			session_store.clone(),
			consent_store.clone(),
			registry,
			Arc::new(WebIdClaimsResolver),
			local_client_id,
			endpoints,
		)
		.with_resolver(resolver);

		(rp, session_store, consent_store)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
