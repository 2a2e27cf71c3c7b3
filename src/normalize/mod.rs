use once_cell::sync::Lazy;
use regex::Regex;

mod affiliation;
mod role;

pub use affiliation::{normalise_initial_affiliations, serialize_affiliations, tag_affiliations_input};
pub use role::{forces_institution, normalize_roles, role_label, ORGANIZATION_ONLY_ROLES};

static ORCID_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?://)?(?:www\.)?orcid\.org/").unwrap());

static HTTP_SCHEME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Reduces any accepted ORCID spelling to the bare identifier, e.g. `0000-0002-1825-0097`.
pub fn normalize_orcid(input: &str) -> String {
    let mut s = input.trim();
    while let Some(m) = ORCID_PREFIX_RE.find(s) {
        s = s[m.end()..].trim();
    }
    s.to_string()
}

/// Prefixes scheme-less URLs with `https://`. Existing `http(s)://` URLs are kept verbatim.
pub fn normalize_website_url(input: &str) -> String {
    let s = input.trim();
    if s.is_empty() || HTTP_SCHEME_RE.is_match(s) {
        s.to_string()
    } else {
        format!("https://{s}")
    }
}

fn is_separator(c: char) -> bool {
    c == '_' || c == '-' || c.is_whitespace()
}

/// `MainTitle`, `main_title` and `Main Title` all become `main-title`.
pub fn normalize_title_type_slug(input: &str) -> String {
    let chars: Vec<char> = input.trim().chars().collect();
    let mut out = String::with_capacity(chars.len() + 4);
    let mut pending_separator = false;

    for (i, &c) in chars.iter().enumerate() {
        if is_separator(c) {
            pending_separator = true;
            continue;
        }
        if !c.is_ascii_alphanumeric() {
            continue;
        }

        // camel-case boundary: `aB`, `1B`, and the last capital of an acronym in `XMLTitle`
        let boundary = i > 0 && c.is_ascii_uppercase() && {
            let prev = chars[i - 1];
            prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase()
                    && chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase()))
        };

        if (pending_separator || boundary) && !out.is_empty() {
            out.push('-');
        }
        pending_separator = false;
        out.push(c.to_ascii_lowercase());
    }

    out
}
