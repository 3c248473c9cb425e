//! Identity URI normalization and origin reduction.
//!
//! A WebID is an HTTP(S) URI identifying a person or agent. Users type them
//! without schemes (`alice.example`, `localhost:8443`), so normalization
//! prepends `https://` before parsing. Discovered issuers are reduced to
//! their origin (scheme + host + port, no path) before use or storage.

// std
use std::borrow::Cow;
// crates.io
use url::Origin;
// self
use crate::{_prelude::*, error::UserInputError};

/// Prepends `https://` to a URI string that carries no HTTP(S) scheme.
///
/// `None` propagates unchanged, as does whitespace-only input; no parsing or
/// validation is performed. Protocol-relative values (`//host`) receive only
/// the scheme.
pub fn normalize_uri(raw: Option<&str>) -> Option<String> {
	let trimmed = raw?.trim();

	if trimmed.is_empty() {
		return None;
	}
	if has_http_scheme(trimmed) {
		return Some(trimmed.to_owned());
	}
	if let Some(rest) = trimmed.strip_prefix("//") {
		return Some(format!("https://{rest}"));
	}

	Some(format!("https://{trimmed}"))
}

/// Normalizes and parses a user-submitted identity into an absolute URL.
pub fn normalize_identity(raw: &str) -> Result<Url, UserInputError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(UserInputError::MissingIdentity);
	}

	let candidate: Cow<str> = if has_http_scheme(trimmed) {
		Cow::Borrowed(trimmed)
	} else if let Some(rest) = trimmed.strip_prefix("//") {
		Cow::Owned(format!("https://{rest}"))
	} else {
		Cow::Owned(format!("https://{trimmed}"))
	};

	Url::parse(&candidate).map_err(|source| UserInputError::MalformedIdentity {
		identity: trimmed.to_owned(),
		source,
	})
}

/// Reduces a URL to its HTTP(S) origin, dropping path, query, and fragment.
///
/// Returns `None` for opaque origins and non-HTTP(S) schemes.
pub fn origin_of(url: &Url) -> Option<Url> {
	match url.origin() {
		ref origin @ Origin::Tuple(ref scheme, _, _) if scheme == "http" || scheme == "https" =>
			Url::parse(&origin.ascii_serialization()).ok(),
		_ => None,
	}
}

fn has_http_scheme(value: &str) -> bool {
	let lowered = value.get(..8).map(str::to_ascii_lowercase).unwrap_or_default();

	lowered.starts_with("http://") || lowered.starts_with("https://")
}
