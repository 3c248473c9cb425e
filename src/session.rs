//! Server-side session state mutated by the authentication flows.
//!
//! A [`Session`] is created on first contact, enriched by the callback flow
//! (identity + tokens), appended to by the consent flow (consented origins),
//! and destroyed by the logout collaborator. All mutation helpers are
//! idempotent so a retried callback cannot corrupt the record.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, TokenSecret, webid},
};

/// Per-session record keyed by the browser session identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
	/// Opaque identifier supplied by the surrounding HTTP layer.
	pub id: SessionId,
	/// Whether the callback flow has established an identity.
	pub identified: bool,
	/// Authenticated WebID, once established.
	pub user_id: Option<Url>,
	/// Access token issued by the provider; redacted in logs.
	pub access_token: Option<TokenSecret>,
	/// Refresh token issued by the provider, when one was returned.
	pub refresh_token: Option<TokenSecret>,
	/// Instant the current token pair was stored.
	pub issued_at: Option<OffsetDateTime>,
	/// ASCII origins of clients the user already consented to.
	pub consented_origins: BTreeSet<String>,
	/// One-time redirect target restored after a successful callback. Stored
	/// URI-encoded by the web layer; the callback flow decodes it.
	pub return_to_url: Option<String>,
	/// Pending authorization bookkeeping owned by the token client.
	pub auth_state: Option<AuthState>,
}
impl Session {
	/// Creates an empty, unauthenticated session.
	pub fn new(id: SessionId) -> Self {
		Self {
			id,
			identified: false,
			user_id: None,
			access_token: None,
			refresh_token: None,
			issued_at: None,
			consented_origins: BTreeSet::new(),
			return_to_url: None,
			auth_state: None,
		}
	}

	/// Stores the authenticated identity and its token pair.
	///
	/// Also clears the pending authorization state — it is single-use by
	/// construction.
	pub fn record_identity(
		&mut self,
		user_id: Url,
		access_token: TokenSecret,
		refresh_token: Option<TokenSecret>,
		now: OffsetDateTime,
	) {
		self.user_id = Some(user_id);
		self.access_token = Some(access_token);
		self.refresh_token = refresh_token;
		self.issued_at = Some(now);
		self.identified = true;
		self.auth_state = None;
	}

	/// Appends the origin of `url` to the consented set; returns whether the
	/// origin was newly added.
	pub fn record_consented_origin(&mut self, url: &Url) -> bool {
		match webid::origin_of(url) {
			Some(origin) => self.consented_origins.insert(origin.origin().ascii_serialization()),
			None => false,
		}
	}

	/// Returns true when the origin of `url` is already consented.
	pub fn has_consented_origin(&self, url: &Url) -> bool {
		webid::origin_of(url)
			.is_some_and(|origin| self.consented_origins.contains(&origin.origin().ascii_serialization()))
	}

	/// Takes the one-time redirect target, leaving the slot empty.
	pub fn take_return_to(&mut self) -> Option<String> {
		self.return_to_url.take()
	}
}

/// Pending authorization bookkeeping recorded when the selection flow mints
/// an authorization URL and consumed when the callback returns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuthState {
	/// Issuer origin the user was sent to.
	pub issuer: Url,
	/// Opaque `state` value that must round-trip through the provider.
	pub state: String,
	/// `nonce` value expected back inside the ID token.
	pub nonce: String,
	/// PKCE code verifier matching the challenge sent on the authorize leg.
	pub pkce_verifier: TokenSecret,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn session() -> Session {
		Session::new(SessionId::new("sess-1").expect("Session id fixture should be valid."))
	}

	#[test]
	fn record_identity_marks_the_session_identified() {
		let mut session = session();
		let webid = Url::parse("https://alice.example/#me")
			.expect("WebID fixture should parse successfully.");

		session.auth_state = Some(AuthState {
			issuer: Url::parse("https://provider.example")
				.expect("Issuer fixture should parse successfully."),
			state: "state".into(),
			nonce: "nonce".into(),
			pkce_verifier: TokenSecret::new("verifier"),
		});
		session.record_identity(
			webid.clone(),
			TokenSecret::new("access"),
			Some(TokenSecret::new("refresh")),
			OffsetDateTime::UNIX_EPOCH,
		);

		assert!(session.identified);
		assert_eq!(session.user_id, Some(webid));
		assert!(session.auth_state.is_none(), "Authorization state is single-use.");
	}

	#[test]
	fn consented_origins_deduplicate_and_strip_paths() {
		let mut session = session();
		let redirect = Url::parse("https://app.example/callback?code=1")
			.expect("Redirect fixture should parse successfully.");

		assert!(session.record_consented_origin(&redirect));
		assert!(!session.record_consented_origin(&redirect), "Second insert is a no-op.");
		assert!(session.has_consented_origin(
			&Url::parse("https://app.example/other").expect("Origin probe should parse.")
		));
		assert!(session.consented_origins.contains("https://app.example"));
	}

	#[test]
	fn return_to_is_single_use() {
		let mut session = session();

		session.return_to_url = Some("https%3A%2F%2Frp.example%2Fdocs".into());

		assert!(session.take_return_to().is_some());
		assert!(session.take_return_to().is_none());
	}

	#[test]
	fn serde_round_trip_preserves_the_record() {
		let mut session = session();

		session.record_identity(
			Url::parse("https://alice.example/#me").expect("WebID fixture should parse."),
			TokenSecret::new("access"),
			None,
			OffsetDateTime::UNIX_EPOCH,
		);

		let payload =
			serde_json::to_string(&session).expect("Session should serialize successfully.");
		let round_trip: Session =
			serde_json::from_str(&payload).expect("Session should deserialize successfully.");

		assert_eq!(round_trip, session);
		assert!(
			!format!("{session:?}").contains("access"),
			"Token material must stay out of Debug output."
		);
	}
}
