//! Host bridge: the thin adapter an identity-provider component drives while
//! processing its own `/authorize` calls.
//!
//! Three entry points: `authenticate` copies the session identity into the
//! authorization context or redirects to login, `obtain_consent` delegates
//! to the consent decision (optionally skipping interactive consent), and
//! `logout` hands session termination to the configured collaborator without
//! ever failing the surrounding request.

// self
use crate::{
	_prelude::*,
	auth::SessionId,
	flows::{AuthorizeContext, ConsentOutcome, RelyingParty},
	obs::{self, FlowKind, FlowOutcome},
	session::Session,
};

/// Outcome of the authentication bridge step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AuthenticateOutcome {
	/// The session is identified; the identity was copied into the context's
	/// `subject` field.
	Identified(Url),
	/// A redirect response to the login entry point was produced, original
	/// query preserved; the caller must emit it and stop all further
	/// authorize-processing.
	Redirect(Url),
}
impl AuthenticateOutcome {
	/// Returns true when a response was already produced and processing must
	/// stop.
	pub fn is_terminal(&self) -> bool {
		matches!(self, AuthenticateOutcome::Redirect(_))
	}
}

impl RelyingParty {
	/// Establishes the authorize-request subject from the current session.
	pub fn authenticate(
		&self,
		context: &mut AuthorizeContext,
		session: &Session,
	) -> AuthenticateOutcome {
		if session.identified
			&& let Some(user_id) = &session.user_id
		{
			context.subject = Some(user_id.clone());

			return AuthenticateOutcome::Identified(user_id.clone());
		}

		let mut login = self.endpoints.login.clone();

		if !context.query.is_empty() {
			login
				.query_pairs_mut()
				.extend_pairs(context.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		AuthenticateOutcome::Redirect(login)
	}

	/// Obtains consent for the authorize request, honoring the
	/// `skip_consent` deployment flag.
	pub async fn obtain_consent(
		&self,
		context: &mut AuthorizeContext,
		session: &mut Session,
		submitted_consent: bool,
	) -> Result<ConsentOutcome> {
		if self.skip_consent && context.subject.is_some() {
			context.grant();

			return Ok(ConsentOutcome::Granted);
		}

		self.decide_consent(context, session, submitted_consent).await
	}

	/// Terminates the session through the logout collaborator.
	///
	/// Collaborator failures are reported, never propagated — logout must not
	/// fail the overall request.
	pub async fn logout(&self, session_id: &SessionId) {
		const KIND: FlowKind = FlowKind::Logout;

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match self.logout_handler.logout(session_id).await {
			Ok(()) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(error) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				#[cfg(feature = "tracing")]
				tracing::error!(error = %error, "Logout collaborator failed; session may linger.");
				#[cfg(not(feature = "tracing"))]
				let _ = error;
			},
		}
	}
}
