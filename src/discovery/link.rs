//! RFC 8288 subset parser for `Link` response headers.
//!
//! Only what the discovery contract needs: extracting targets whose `rel`
//! parameter carries the OIDC issuer relation. Malformed entries are skipped
//! rather than failing the probe — a broken third-party header must not mask
//! a valid advertisement elsewhere in the response.

/// Link relation advertising an OpenID Connect issuer.
pub const ISSUER_REL: &str = "http://openid.net/specs/connect/1.0/issuer";

/// Extracts issuer-relation targets from raw `Link` header values, in order.
pub fn issuer_targets(headers: &[String]) -> Vec<String> {
	headers
		.iter()
		.flat_map(|header| split_entries(header))
		.filter_map(parse_entry)
		.filter(|entry| entry.rels.iter().any(|rel| rel == ISSUER_REL))
		.map(|entry| entry.target)
		.collect()
}

struct LinkEntry {
	target: String,
	rels: Vec<String>,
}

/// Splits a header value on commas that sit outside `<...>` and quoted
/// strings.
fn split_entries(header: &str) -> Vec<&str> {
	let mut entries = Vec::new();
	let mut depth_angle = false;
	let mut in_quotes = false;
	let mut start = 0;

	for (idx, ch) in header.char_indices() {
		match ch {
			'<' if !in_quotes => depth_angle = true,
			'>' if !in_quotes => depth_angle = false,
			'"' => in_quotes = !in_quotes,
			',' if !depth_angle && !in_quotes => {
				entries.push(&header[start..idx]);

				start = idx + 1;
			},
			_ => {},
		}
	}

	entries.push(&header[start..]);

	entries
}

/// Parses one `<target>; param=value; ...` entry; `None` when malformed.
fn parse_entry(entry: &str) -> Option<LinkEntry> {
	let entry = entry.trim();
	let rest = entry.strip_prefix('<')?;
	let (target, params) = rest.split_once('>')?;

	if target.is_empty() {
		return None;
	}

	let mut rels = Vec::new();

	for param in params.split(';').skip_while(|part| part.trim().is_empty()) {
		let Some((name, value)) = param.split_once('=') else {
			continue;
		};

		if !name.trim().eq_ignore_ascii_case("rel") {
			continue;
		}

		let value = value.trim().trim_matches('"');

		// A quoted rel value may carry several space-separated relations.
		rels.extend(value.split_whitespace().map(str::to_owned));
	}

	Some(LinkEntry { target: target.to_owned(), rels })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn targets(headers: &[&str]) -> Vec<String> {
		issuer_targets(&headers.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>())
	}

	#[test]
	fn issuer_relation_is_extracted() {
		let found = targets(&[&format!("<https://provider.example>; rel=\"{ISSUER_REL}\"")]);

		assert_eq!(found, vec!["https://provider.example"]);
	}

	#[test]
	fn comma_separated_lists_and_parameter_order_are_handled() {
		let header = format!(
			"<https://other.example/style.css>; rel=\"stylesheet\", \
			 <https://provider.example/op>; title=\"OP\"; rel=\"{ISSUER_REL}\""
		);
		let found = targets(&[&header]);

		assert_eq!(found, vec!["https://provider.example/op"]);
	}

	#[test]
	fn multi_valued_rel_matches() {
		let header = format!("<https://provider.example>; rel=\"describedby {ISSUER_REL}\"");

		assert_eq!(targets(&[&header]), vec!["https://provider.example"]);
	}

	#[test]
	fn malformed_entries_are_skipped() {
		let header =
			format!("garbage, <>; rel=\"{ISSUER_REL}\", <https://ok.example>; rel=\"{ISSUER_REL}\"");

		assert_eq!(targets(&[&header]), vec!["https://ok.example"]);
		assert!(targets(&["<https://no-rel.example>"]).is_empty());
		assert!(targets(&["<https://wrong.example>; rel=\"icon\""]).is_empty());
	}

	#[test]
	fn targets_containing_commas_survive_splitting() {
		let header = format!("<https://provider.example/a,b>; rel=\"{ISSUER_REL}\"");

		assert_eq!(targets(&[&header]), vec!["https://provider.example/a,b"]);
	}
}
