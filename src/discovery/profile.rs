//! Profile-document inspection for OIDC-issuer statements.
//!
//! Profile documents are consumed as JSON-LD (flat node objects or a
//! top-level `@graph` array). The walk collects every object of an
//! OIDC-issuer predicate asserted on the identity node, in document order,
//! so an identity may advertise several trusted issuers (e.g., while
//! migrating between providers).

// crates.io
use serde_json::Value;
// self
use crate::_prelude::*;

/// Predicate spellings accepted for the OIDC-issuer statement.
const ISSUER_PREDICATES: [&str; 3] =
	["http://www.w3.org/ns/solid/terms#oidcIssuer", "solid:oidcIssuer", "oidcIssuer"];

/// Collects raw issuer values advertised for `identity` in `document`.
///
/// An unparsable document yields an empty list — the identity was reachable,
/// it just advertised nothing this crate can read.
pub fn issuer_candidates(document: &str, identity: &Url) -> Vec<String> {
	let Ok(value) = serde_json::from_str::<Value>(document) else {
		return Vec::new();
	};
	let nodes = graph_nodes(&value);
	let mut found = Vec::new();

	// Prefer statements on the exact identity node; fall back to
	// fragment-insensitive matches (profiles often hang the triples on
	// `#me` while users type the bare document URI), then to anonymous
	// single-node documents.
	for matcher in [NodeMatch::Exact, NodeMatch::IgnoreFragment, NodeMatch::Anonymous] {
		for node in &nodes {
			if matcher.matches(node, identity, nodes.len()) {
				collect_issuers(node, &mut found);
			}
		}

		if !found.is_empty() {
			break;
		}
	}

	found
}

#[derive(Clone, Copy)]
enum NodeMatch {
	Exact,
	IgnoreFragment,
	Anonymous,
}
impl NodeMatch {
	fn matches(self, node: &Value, identity: &Url, node_count: usize) -> bool {
		let id = node.get("@id").and_then(Value::as_str);

		match self {
			NodeMatch::Exact => id == Some(identity.as_str()),
			NodeMatch::IgnoreFragment => id
				.and_then(|raw| Url::parse(raw).ok())
				.is_some_and(|mut node_url| {
					let mut wanted = identity.clone();

					node_url.set_fragment(None);
					wanted.set_fragment(None);

					node_url == wanted
				}),
			NodeMatch::Anonymous => id.is_none() && node_count == 1,
		}
	}
}

fn graph_nodes(value: &Value) -> Vec<&Value> {
	match value {
		Value::Array(items) => items.iter().collect(),
		Value::Object(map) => match map.get("@graph") {
			Some(Value::Array(items)) => items.iter().collect(),
			_ => vec![value],
		},
		_ => Vec::new(),
	}
}

fn collect_issuers(node: &Value, found: &mut Vec<String>) {
	for predicate in ISSUER_PREDICATES {
		let Some(object) = node.get(predicate) else {
			continue;
		};

		match object {
			Value::Array(items) =>
				for item in items {
					if let Some(target) = object_target(item) {
						found.push(target);
					}
				},
			other =>
				if let Some(target) = object_target(other) {
					found.push(target);
				},
		}
	}
}

/// A statement object is either a plain string or a `{"@id": "..."}` node
/// reference.
fn object_target(object: &Value) -> Option<String> {
	match object {
		Value::String(target) => Some(target.clone()),
		Value::Object(map) => map.get("@id").and_then(Value::as_str).map(str::to_owned),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity() -> Url {
		Url::parse("https://alice.example/profile#me")
			.expect("Identity fixture should parse successfully.")
	}

	#[test]
	fn flat_profile_with_issuer_statement() {
		let document = r#"{
			"@id": "https://alice.example/profile#me",
			"solid:oidcIssuer": {"@id": "https://provider.example/"}
		}"#;

		assert_eq!(issuer_candidates(document, &identity()), vec!["https://provider.example/"]);
	}

	#[test]
	fn graph_documents_and_absolute_predicates_are_walked() {
		let document = r#"{
			"@graph": [
				{"@id": "https://alice.example/profile", "dc:title": "Profile"},
				{
					"@id": "https://alice.example/profile#me",
					"http://www.w3.org/ns/solid/terms#oidcIssuer": [
						{"@id": "https://a.example"},
						{"@id": "https://b.example"}
					]
				}
			]
		}"#;

		assert_eq!(
			issuer_candidates(document, &identity()),
			vec!["https://a.example", "https://b.example"]
		);
	}

	#[test]
	fn fragment_insensitive_match_applies_when_exact_node_is_absent() {
		let document = r#"{
			"@id": "https://alice.example/profile",
			"oidcIssuer": "https://provider.example"
		}"#;

		assert_eq!(issuer_candidates(document, &identity()), vec!["https://provider.example"]);
	}

	#[test]
	fn silent_or_malformed_documents_yield_nothing() {
		assert!(issuer_candidates("not json", &identity()).is_empty());
		assert!(issuer_candidates("{}", &identity()).is_empty());
		assert!(
			issuer_candidates(
				r#"{"@id": "https://bob.example/#me", "solid:oidcIssuer": "https://x.example"}"#,
				&identity()
			)
			.is_empty(),
			"Statements on foreign nodes must not leak into the candidate list."
		);
	}
}
