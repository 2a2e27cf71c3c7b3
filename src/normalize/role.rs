use serde_json::Value;
use std::collections::HashSet;

use crate::RoleTag;

/// Contributor roles only an organization can hold.
pub const ORGANIZATION_ONLY_ROLES: [&str; 6] = [
    "Distributor",
    "Hosting Institution",
    "Registration Agency",
    "Registration Authority",
    "Research Group",
    "Sponsor",
];

/// `DataCollector` becomes `Data Collector`; tokens that already contain spaces are kept.
pub fn role_label(token: &str) -> String {
    let token = token.trim();
    if token.contains(char::is_whitespace) {
        return token.to_string();
    }

    let mut label = String::with_capacity(token.len() + 4);
    let mut prev: Option<char> = None;
    for c in token.chars() {
        if c.is_uppercase() && prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
            label.push(' ');
        }
        label.push(c);
        prev = Some(c);
    }
    label
}

fn role_token(raw: &Value) -> Option<&str> {
    match raw {
        Value::String(s) => Some(s),
        Value::Object(obj) => ["value", "name"]
            .iter()
            .find_map(|key| obj.get(*key).and_then(Value::as_str)),
        _ => None,
    }
}

/// Values of an array-like object, ordered by numeric key.
fn array_like_values(obj: &serde_json::Map<String, Value>) -> Vec<&Value> {
    let mut indexed: Vec<(u64, &Value)> = Vec::new();
    let mut rest = Vec::new();
    for (key, value) in obj {
        match key.trim().parse::<u64>() {
            Ok(idx) => indexed.push((idx, value)),
            Err(_) => rest.push(value),
        }
    }
    indexed.sort_by_key(|(idx, _)| *idx);
    indexed.into_iter().map(|(_, v)| v).chain(rest).collect()
}

/// Converts stored role data into deduplicated role tags in first-seen order.
pub fn normalize_roles(raw: Option<&Value>) -> Vec<RoleTag> {
    let tokens: Vec<&Value> = match raw {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(obj)) => array_like_values(obj),
        Some(single) => vec![single],
    };

    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter_map(role_token)
        .map(role_label)
        .filter(|label| !label.is_empty())
        .filter(|label| seen.insert(label.clone()))
        .map(RoleTag::new)
        .collect()
}

pub fn forces_institution(roles: &[RoleTag]) -> bool {
    roles
        .iter()
        .any(|role| ORGANIZATION_ONLY_ROLES.contains(&role.value.as_str()))
}
