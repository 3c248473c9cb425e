//! Optional observability helpers for the relying-party flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `webid_oidc_rp.flow`
//!   with the `flow` (flow kind) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `webid_oidc_rp_flow_total` counter for
//!   every attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Authentication flow kinds observed by the relying party.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Provider selection and discovery.
	ProviderSelection,
	/// Authorization callback handling.
	Callback,
	/// Consent decisions for nested authorize calls.
	ConsentDecision,
	/// Session termination.
	Logout,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::ProviderSelection => "provider_selection",
			FlowKind::Callback => "callback",
			FlowKind::ConsentDecision => "consent_decision",
			FlowKind::Logout => "logout",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a flow method.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure handled or propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
