//! Parses the `review-gateway:key=...;hash=...;ver=1` marker embedded in
//! previously-posted comments, so a re-delivered job can detect and skip
//! comments it already posted.

use std::collections::HashSet;

use regex::Regex;

fn marker_regex() -> Regex {
    Regex::new(r"<!--\s*review-gateway:key=([^;>]+);hash=([0-9a-f]+);ver=\d+\s*-->").expect("static regex")
}

/// Extracts `key#hash` pairs from a set of comment bodies already present
/// on the change request.
pub fn extract_existing_keys<'a>(bodies: impl IntoIterator<Item = &'a str>) -> HashSet<String> {
    let re = marker_regex();
    let mut seen = HashSet::new();
    for body in bodies {
        if let Some(caps) = re.captures(body) {
            let key = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let hash = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            seen.insert(format!("{key}#{hash}"));
        }
    }
    seen
}

/// Combines a draft's idempotency key with the hash of its (unmarked) body
/// into the same `key#hash` shape used by [`extract_existing_keys`].
pub fn draft_lookup_key(idempotency_key: &str, body_hash: &str) -> String {
    format!("{idempotency_key}#{body_hash}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_marker_from_body() {
        let body = "some text\n\n<!-- review-gateway:key=a.rs:3;hash=abcdef;ver=1 -->";
        let set = extract_existing_keys([body]);
        assert!(set.contains("a.rs:3#abcdef"));
    }

    #[test]
    fn ignores_bodies_without_marker() {
        let set = extract_existing_keys(["no marker here"]);
        assert!(set.is_empty());
    }
}
