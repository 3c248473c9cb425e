//! Consent decisions for clients requesting authorization through this node.
//!
//! Invoked while an identity-provider component processes a nested
//! `/authorize` call. The outcome is an explicit three-valued result —
//! granted, pending, or redirect-already-sent — consumed by the caller; no
//! control flow happens through errors.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet},
	flows::RelyingParty,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	session::Session,
};

/// Per-request authorization context shared by the bridge entry points.
///
/// The context is an explicit mutable record passed through the ordered
/// authenticate → consent pipeline: `subject` is filled by authentication,
/// `consent`/`granted_scope` by the consent decision. It is owned by the
/// current request and discarded once authorize-processing finishes.
#[derive(Clone, Debug, PartialEq)]
pub struct AuthorizeContext {
	/// Requesting client's identifier.
	pub client_id: ClientId,
	/// Requesting client's redirect URI.
	pub redirect_uri: Url,
	/// Requested scope set.
	pub scope: ScopeSet,
	/// Original query parameters of the `/authorize` call, passed through to
	/// interactive redirects.
	pub query: Vec<(String, String)>,
	/// Resolved identity, when authentication has run.
	pub subject: Option<Url>,
	/// Whether consent has been granted for this request.
	pub consent: bool,
	/// Scope granted alongside consent; unset until granting.
	pub granted_scope: Option<ScopeSet>,
}
impl AuthorizeContext {
	/// Creates a context for a client's authorization request.
	pub fn new(client_id: ClientId, redirect_uri: Url, scope: ScopeSet) -> Self {
		Self {
			client_id,
			redirect_uri,
			scope,
			query: Vec::new(),
			subject: None,
			consent: false,
			granted_scope: None,
		}
	}

	/// Attaches the original query parameters for pass-through redirects.
	pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
		self.query = query;

		self
	}

	pub(crate) fn grant(&mut self) {
		self.consent = true;
		self.granted_scope = Some(self.scope.clone());
	}
}

/// Outcome of a consent decision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConsentOutcome {
	/// Consent granted; the context now carries `consent = true` and the
	/// granted scope.
	Granted,
	/// No decision possible yet — the subject is unauthenticated and a
	/// separate authentication step must run first.
	Pending,
	/// A redirect response to the interactive consent page was produced;
	/// the caller must emit it and stop all further authorize-processing.
	Redirect(Url),
}
impl ConsentOutcome {
	/// Returns true when the decision granted consent.
	pub fn is_granted(&self) -> bool {
		matches!(self, ConsentOutcome::Granted)
	}

	/// Returns true when a response was already produced and processing must
	/// stop.
	pub fn is_terminal(&self) -> bool {
		matches!(self, ConsentOutcome::Redirect(_))
	}
}

impl RelyingParty {
	/// Decides whether the requesting client holds consent for the current
	/// subject.
	///
	/// Decision order, first match wins:
	///
	/// 1. unauthenticated subject → [`ConsentOutcome::Pending`];
	/// 2. the local first-party client → implicit grant, nothing persisted;
	/// 3. redirect-URI origin already consented in this session, or an
	///    explicit consent flag submitted with this request → persist the
	///    origin and grant;
	/// 4. durable prior consent recorded for the client id → grant;
	/// 5. otherwise → redirect to the interactive consent page, original
	///    query attached (terminal).
	pub async fn decide_consent(
		&self,
		context: &mut AuthorizeContext,
		session: &mut Session,
		submitted_consent: bool,
	) -> Result<ConsentOutcome> {
		const KIND: FlowKind = FlowKind::ConsentDecision;

		let span = FlowSpan::new(KIND, "decide_consent");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result =
			span.instrument(self.run_consent_decision(context, session, submitted_consent)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn run_consent_decision(
		&self,
		context: &mut AuthorizeContext,
		session: &mut Session,
		submitted_consent: bool,
	) -> Result<ConsentOutcome> {
		if context.subject.is_none() {
			return Ok(ConsentOutcome::Pending);
		}
		if context.client_id == self.local_client_id {
			context.grant();

			return Ok(ConsentOutcome::Granted);
		}
		if session.has_consented_origin(&context.redirect_uri) || submitted_consent {
			session.record_consented_origin(&context.redirect_uri);
			self.session_store.save(session.clone()).await?;
			context.grant();

			return Ok(ConsentOutcome::Granted);
		}
		if self.consent_store.has_consent(&context.client_id).await? {
			context.grant();

			return Ok(ConsentOutcome::Granted);
		}

		let mut consent_page = self.endpoints.consent.clone();

		if !context.query.is_empty() {
			consent_page
				.query_pairs_mut()
				.extend_pairs(context.query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(ConsentOutcome::Redirect(consent_page))
	}
}
