//! Thread-safe in-memory store implementations for local development and
//! tests.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, SessionId},
	session::Session,
	store::{ConsentStore, SessionStore, StoreError, StoreFuture},
};

type SessionMap = Arc<RwLock<HashMap<SessionId, Session>>>;

/// In-process [`SessionStore`] keeping sessions in a hash map.
#[derive(Clone, Debug, Default)]
pub struct MemorySessionStore(SessionMap);
impl MemorySessionStore {
	fn load_now(map: SessionMap, id: SessionId) -> Option<Session> {
		map.read().get(&id).cloned()
	}

	fn save_now(map: SessionMap, session: Session) -> Result<(), StoreError> {
		map.write().insert(session.id.clone(), session);

		Ok(())
	}

	fn destroy_now(map: SessionMap, id: SessionId) {
		map.write().remove(&id);
	}
}
impl SessionStore for MemorySessionStore {
	fn load<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, Option<Session>> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move { Ok(Self::load_now(map, id)) })
	}

	fn save(&self, session: Session) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move { Self::save_now(map, session) })
	}

	fn destroy<'a>(&'a self, id: &'a SessionId) -> StoreFuture<'a, ()> {
		let map = self.0.clone();
		let id = id.to_owned();

		Box::pin(async move {
			Self::destroy_now(map, id);

			Ok(())
		})
	}
}

type ConsentSet = Arc<RwLock<BTreeSet<ClientId>>>;

/// In-process [`ConsentStore`] keeping granted client ids in a set.
#[derive(Clone, Debug, Default)]
pub struct MemoryConsentStore(ConsentSet);
impl ConsentStore for MemoryConsentStore {
	fn has_consent<'a>(&'a self, client: &'a ClientId) -> StoreFuture<'a, bool> {
		let set = self.0.clone();
		let client = client.to_owned();

		Box::pin(async move { Ok(set.read().contains(&client)) })
	}

	fn save_consent<'a>(&'a self, client: &'a ClientId) -> StoreFuture<'a, ()> {
		let set = self.0.clone();
		let client = client.to_owned();

		Box::pin(async move {
			set.write().insert(client);

			Ok(())
		})
	}
}
