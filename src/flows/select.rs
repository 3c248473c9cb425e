//! Provider selection: the user submits an identity, the flow discovers the
//! authoritative provider and redirects to its authorization endpoint.
//!
//! Request progression: received → validated → discovering → redirected.
//! Every failure re-renders the selection form with the error message and a
//! status code — user-input and discovery problems as `400`, missing
//! configuration as `500` — and never redirects on error.

// self
use crate::{
	_prelude::*,
	auth::{SessionId, webid},
	flows::RelyingParty,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// Submitted provider-selection form fields.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ProviderSelection {
	/// The `webid` form field: a WebID or a provider URI.
	pub webid: Option<String>,
}
impl ProviderSelection {
	/// Convenience constructor for a submitted identity value.
	pub fn of(webid: impl Into<String>) -> Self {
		Self { webid: Some(webid.into()) }
	}
}

/// Response data produced by the selection flow, rendered by the web layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionResponse {
	/// Redirect the browser to the provider's authorization endpoint.
	Redirect(Url),
	/// Re-render the selection form with an error message.
	Form {
		/// HTTP status for the rendered form.
		status: u16,
		/// Error message shown to the user.
		error: String,
	},
}
impl SelectionResponse {
	/// Returns the redirect target, if the flow succeeded.
	pub fn redirect(&self) -> Option<&Url> {
		match self {
			SelectionResponse::Redirect(url) => Some(url),
			SelectionResponse::Form { .. } => None,
		}
	}
}

impl RelyingParty {
	/// Runs the provider-selection flow for a submitted form.
	pub async fn select_provider(
		&self,
		session_id: &SessionId,
		selection: ProviderSelection,
	) -> SelectionResponse {
		const KIND: FlowKind = FlowKind::ProviderSelection;

		let span = FlowSpan::new(KIND, "select_provider");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		match span.instrument(self.run_selection(session_id, selection)).await {
			Ok(authorize_url) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);

				SelectionResponse::Redirect(authorize_url)
			},
			Err(error) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);

				SelectionResponse::Form { status: error.status(), error: error.to_string() }
			},
		}
	}

	async fn run_selection(
		&self,
		session_id: &SessionId,
		selection: ProviderSelection,
	) -> Result<Url> {
		// Validated: the identity must normalize and the resolver capability
		// must exist before any network traffic.
		let identity = webid::normalize_identity(selection.webid.as_deref().unwrap_or_default())?;
		let resolver = self.resolver()?;
		// Discovering.
		let issuer = resolver.resolve(&identity, None).await?;
		let client = self.registry.client_for(&issuer).await?;
		let mut session = self.load_or_create_session(session_id).await?;
		let authorize_url = client.authorization_url(&mut session).await?;

		// The session carries the client's state/nonce bookkeeping and must
		// be durable before the browser leaves for the provider.
		self.session_store.save(session).await?;

		Ok(authorize_url)
	}
}
