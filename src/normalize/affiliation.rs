use serde_json::Value;
use std::collections::HashSet;
use tracing::trace;

use crate::{AffiliationSuggestion, AffiliationTag};

const ROR_ID_KEYS: [&str; 3] = ["rorId", "rorid", "identifier"];

/// Applies the shared tag rules: trimmed name, identifier as fallback name, empties dropped.
fn canonical_tag(value: &str, ror_id: Option<&str>) -> Option<AffiliationTag> {
    let ror_id = ror_id
        .filter(|id| !id.trim().is_empty())
        .map(String::from);
    let value = value.trim();

    match (value.is_empty(), ror_id) {
        (true, None) => None,
        (true, Some(id)) => Some(AffiliationTag {
            value: id.clone(),
            ror_id: Some(id),
        }),
        (false, ror_id) => Some(AffiliationTag {
            value: value.to_string(),
            ror_id,
        }),
    }
}

/// A string `value` wins over `name`, even if it is blank. Any other `value` is ignored.
fn extract_display_name(affiliation: &serde_json::Map<String, Value>) -> &str {
    affiliation
        .get("value")
        .and_then(Value::as_str)
        .or_else(|| affiliation.get("name").and_then(Value::as_str))
        .unwrap_or("")
}

fn extract_ror_id(affiliation: &serde_json::Map<String, Value>) -> Option<&str> {
    ROR_ID_KEYS
        .iter()
        .find_map(|key| affiliation.get(*key).filter(|v| !v.is_null()))
        .and_then(Value::as_str)
}

/// Maps stored affiliation records of any historical shape into tags.
///
/// Anything that is not an array yields an empty list. Elements may be objects keyed
/// `value`/`name` and `rorId`/`rorid`/`identifier`, or plain strings.
pub fn normalise_initial_affiliations(raw: Option<&Value>) -> Vec<AffiliationTag> {
    let items = match raw {
        Some(Value::Array(items)) => items,
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| {
            let tag = match item {
                Value::Object(obj) => canonical_tag(extract_display_name(obj), extract_ror_id(obj)),
                Value::String(name) => canonical_tag(name, None),
                _ => None,
            };
            if tag.is_none() {
                trace!("Dropping unusable affiliation {}", item);
            }
            tag
        })
        .collect()
}

/// Outbound form of an affiliation list: re-applies the tag rules and removes exact
/// duplicates, keeping the first occurrence.
pub fn serialize_affiliations(affiliations: &[AffiliationTag]) -> Vec<AffiliationTag> {
    let mut seen = HashSet::new();
    affiliations
        .iter()
        .filter_map(|a| canonical_tag(&a.value, a.ror_id.as_deref()))
        .filter(|tag| seen.insert(tag.clone()))
        .collect()
}

/// Turns the comma-separated `affiliationsInput` text into tags, attaching the ROR id of the
/// first suggestion whose name matches case-insensitively.
pub fn tag_affiliations_input(
    text: &str,
    suggestions: &[AffiliationSuggestion],
) -> Vec<AffiliationTag> {
    let tags: Vec<AffiliationTag> = text
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            let ror_id = suggestions
                .iter()
                .find(|s| s.name.trim().eq_ignore_ascii_case(name))
                .and_then(|s| s.ror_id.clone());
            AffiliationTag::new(name, ror_id)
        })
        .collect();

    serialize_affiliations(&tags)
}
