//! Authorization callback handling: the provider redirects back, the flow
//! validates the response, establishes the session identity, and resumes the
//! user's original navigation.
//!
//! Request progression: called back → validated → response exchanged →
//! session initialized → resumed. The top-level policy converts every
//! failure into a redirect to the login entry point — a broken or stale
//! callback must never trap the user on an error page.

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	auth::{SessionId, webid},
	error::UserInputError,
	flows::RelyingParty,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl RelyingParty {
	/// Handles the provider's redirect back to this node.
	///
	/// `issuer_segment` is the URI-encoded issuer from the callback path;
	/// `request_uri` is the full callback request URI including its query.
	/// The returned URL is always a redirect target: the recovered
	/// return-to destination on success, the login entry point on any
	/// failure.
	pub async fn handle_callback(
		&self,
		session_id: &SessionId,
		issuer_segment: &str,
		request_uri: &Url,
	) -> Url {
		const KIND: FlowKind = FlowKind::Callback;

		let span = FlowSpan::new(KIND, "handle_callback");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match span.instrument(self.run_callback(session_id, issuer_segment, request_uri)).await {
			Ok(return_to) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				return_to
			},
			Err(error) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				#[cfg(feature = "tracing")]
				tracing::warn!(
					error = %error,
					status = error.status(),
					"Callback handling failed; redirecting to the login entry point.",
				);
				#[cfg(not(feature = "tracing"))]
				let _ = &error;

				self.endpoints.login.clone()
			},
		}
	}

	async fn run_callback(
		&self,
		session_id: &SessionId,
		issuer_segment: &str,
		request_uri: &Url,
	) -> Result<Url> {
		// Validated.
		let issuer = decode_issuer_segment(issuer_segment)?;
		let mut session = self.load_or_create_session(session_id).await?;
		// Recover the one-time return target up front; it defaults to the
		// site root when no navigation was interrupted.
		let return_to = session
			.take_return_to()
			.and_then(|raw| decode_return_to(&raw))
			.unwrap_or_else(|| self.endpoints.root.clone());
		// Response exchanged: the per-issuer client performs whatever code
		// exchange and validation the protocol requires.
		let client = self.registry.client_for(&issuer).await?;
		let validation = client.validate_callback(request_uri, &mut session).await?;
		// Session initialized.
		let identity = self.identity_resolver.identity_from(&validation.claims)?;

		session.record_identity(
			identity,
			validation.access_token,
			validation.refresh_token,
			OffsetDateTime::now_utc(),
		);
		// All session mutation lands before the terminal redirect; replaying
		// the same callback afterwards fails at the token endpoint instead of
		// corrupting this record.
		self.session_store.save(session).await?;

		// Resumed.
		Ok(return_to)
	}
}

fn decode_issuer_segment(segment: &str) -> Result<Url> {
	if segment.is_empty() {
		return Err(UserInputError::MissingIssuerSegment.into());
	}

	let malformed =
		|| UserInputError::MalformedIssuerSegment { segment: segment.to_owned() };
	let decoded = urlencoding::decode(segment).map_err(|_| malformed())?;
	let url = Url::parse(&decoded).map_err(|_| malformed())?;

	webid::origin_of(&url).ok_or_else(|| malformed().into())
}

/// A stored return-to value may arrive URI-encoded from the web layer; an
/// undecodable or relative value falls back to the site root.
fn decode_return_to(raw: &str) -> Option<Url> {
	let decoded = urlencoding::decode(raw).map(Cow::into_owned).unwrap_or_else(|_| raw.to_owned());

	Url::parse(&decoded).ok()
}
