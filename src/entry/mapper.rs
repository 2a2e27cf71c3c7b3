//! Boundary between stored records and canonical entries.
//!
//! Stored records were written by several schema versions, so every field is read through
//! an extractor that accepts its known aliases and falls back to an empty default.

use serde_json::{Map, Value};
use tracing::debug;

use super::{
    AuthorEntry, ContributorEntry, EntryType, InstitutionAuthor, InstitutionContributor,
    PersonAuthor, PersonContributor,
};
use crate::form::{
    DateEntry, DescriptionEntry, Fillable, FormLimits, LicenseEntry, ResourceForm, TitleEntry,
};
use crate::normalize::{
    forces_institution, normalise_initial_affiliations, normalize_orcid, normalize_roles,
    normalize_title_type_slug, normalize_website_url,
};
use crate::{AffiliationTag, EntryId, RoleTag};

type Record = Map<String, Value>;

/// First non-null value among `keys`.
fn field<'a>(record: Option<&'a Record>, keys: &[&str]) -> Option<&'a Value> {
    let record = record?;
    keys.iter()
        .find_map(|key| record.get(*key).filter(|v| !v.is_null()))
}

/// First non-blank string among `keys`, so an empty alias does not hide a later one.
fn str_field<'a>(record: Option<&'a Record>, keys: &[&str]) -> &'a str {
    let Some(record) = record else {
        return "";
    };
    keys.iter()
        .find_map(|key| {
            record
                .get(*key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
        })
        .unwrap_or("")
}

fn trimmed(record: Option<&Record>, keys: &[&str]) -> String {
    str_field(record, keys).trim().to_string()
}

fn bool_field(record: Option<&Record>, keys: &[&str]) -> bool {
    match field(record, keys) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.trim().eq_ignore_ascii_case("true"),
        _ => false,
    }
}

/// Accepts JSON numbers and numeric strings.
fn number_field(record: Option<&Record>, keys: &[&str]) -> Option<i64> {
    match field(record, keys)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(obj) => number_field(Some(obj), &["id"]),
        _ => None,
    }
}

fn array_field<'a>(record: Option<&'a Record>, keys: &[&str]) -> &'a [Value] {
    match field(record, keys) {
        Some(Value::Array(items)) => items.as_slice(),
        _ => &[],
    }
}

fn entry_type_of(record: Option<&Record>) -> Option<EntryType> {
    match str_field(record, &["type", "nameType"]).trim().to_ascii_lowercase().as_str() {
        "person" | "personal" => Some(EntryType::Person),
        "institution" | "organization" | "organizational" => Some(EntryType::Institution),
        _ => None,
    }
}

/// Without an explicit type, only a record that names an institution and no person is one.
fn infer_entry_type(record: Option<&Record>) -> EntryType {
    if let Some(explicit) = entry_type_of(record) {
        return explicit;
    }
    let has_institution = !institution_name(record).is_empty();
    let has_person =
        !first_name(record).is_empty() || !last_name(record).is_empty() || !orcid(record).is_empty();
    if has_institution && !has_person {
        EntryType::Institution
    } else {
        EntryType::Person
    }
}

fn first_name(record: Option<&Record>) -> String {
    trimmed(record, &["firstName", "first_name", "givenName"])
}

fn last_name(record: Option<&Record>) -> String {
    trimmed(record, &["lastName", "last_name", "familyName"])
}

fn orcid(record: Option<&Record>) -> String {
    normalize_orcid(str_field(record, &["orcid", "orcidId"]))
}

/// A bare `name` counts only when the record is explicitly typed as an organization.
fn institution_name(record: Option<&Record>) -> String {
    let name = trimmed(record, &["institutionName", "institution_name"]);
    if name.is_empty() && entry_type_of(record) == Some(EntryType::Institution) {
        return trimmed(record, &["name"]);
    }
    name
}

fn affiliations(record: Option<&Record>) -> Vec<AffiliationTag> {
    normalise_initial_affiliations(field(record, &["affiliations", "affiliation"]))
}

fn roles(record: Option<&Record>) -> Vec<RoleTag> {
    normalize_roles(field(record, &["roles", "role"]))
}

fn affiliations_input(affiliations: &[AffiliationTag]) -> String {
    affiliations
        .iter()
        .map(|a| a.value.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Maps one stored author. `null` yields no entry.
pub fn map_initial_author_to_entry(raw: &Value) -> Option<AuthorEntry> {
    if raw.is_null() {
        return None;
    }
    let record = raw.as_object();
    let affiliations = affiliations(record);
    let affiliations_input = affiliations_input(&affiliations);

    let entry = match infer_entry_type(record) {
        EntryType::Person => AuthorEntry::Person(PersonAuthor {
            id: EntryId::new(),
            orcid: orcid(record),
            first_name: first_name(record),
            last_name: last_name(record),
            email: str_field(record, &["email"]).to_string(),
            website: normalize_website_url(str_field(record, &["website"])),
            is_contact: bool_field(record, &["isContact", "is_contact"]),
            affiliations,
            affiliations_input,
        }),
        EntryType::Institution => AuthorEntry::Institution(InstitutionAuthor {
            id: EntryId::new(),
            institution_name: institution_name(record),
            affiliations,
            affiliations_input,
        }),
    };
    Some(entry)
}

/// Maps one stored contributor. Organization-only roles make the entry an institution
/// even when the record carries person fields.
pub fn map_initial_contributor_to_entry(raw: &Value) -> Option<ContributorEntry> {
    if raw.is_null() {
        return None;
    }
    let record = raw.as_object();
    let roles = roles(record);
    let affiliations = affiliations(record);
    let affiliations_input = affiliations_input(&affiliations);

    let entry_type = if forces_institution(&roles) {
        if entry_type_of(record) == Some(EntryType::Person) || !last_name(record).is_empty() {
            debug!("Contributor with organization-only role mapped as institution");
        }
        EntryType::Institution
    } else {
        infer_entry_type(record)
    };

    let entry = match entry_type {
        EntryType::Person => ContributorEntry::Person(PersonContributor {
            id: EntryId::new(),
            orcid: orcid(record),
            first_name: first_name(record),
            last_name: last_name(record),
            roles,
            affiliations,
            affiliations_input,
        }),
        EntryType::Institution => ContributorEntry::Institution(InstitutionContributor {
            id: EntryId::new(),
            institution_name: institution_name(record),
            roles,
            affiliations,
            affiliations_input,
        }),
    };
    Some(entry)
}

fn map_title(raw: &Value) -> Option<TitleEntry> {
    let (title, title_type) = match raw {
        Value::String(s) => (s.trim().to_string(), String::new()),
        Value::Object(obj) => {
            let obj = Some(obj);
            (
                trimmed(obj, &["title", "value"]),
                normalize_title_type_slug(str_field(obj, &["titleType", "title_type", "type"])),
            )
        }
        _ => return None,
    };
    (!title.is_empty()).then(|| TitleEntry {
        id: EntryId::new(),
        title,
        title_type,
    })
}

fn map_license(raw: &Value) -> Option<LicenseEntry> {
    let license = match raw {
        Value::String(s) => s.trim().to_string(),
        Value::Object(obj) => trimmed(
            Some(obj),
            &["identifier", "rightsIdentifier", "license", "id"],
        ),
        _ => return None,
    };
    (!license.is_empty()).then(|| LicenseEntry {
        id: EntryId::new(),
        license,
    })
}

/// Reads `startDate`/`endDate`, or a `start/end` range in `date`.
fn map_date(raw: &Value) -> Option<DateEntry> {
    let obj = raw.as_object()?;
    let record = Some(obj);
    let mut start_date = trimmed(record, &["startDate", "start_date"]);
    let mut end_date = trimmed(record, &["endDate", "end_date"]);

    if start_date.is_empty() && end_date.is_empty() {
        let date = str_field(record, &["date"]);
        match date.split_once('/') {
            Some((start, end)) => {
                start_date = start.trim().to_string();
                end_date = end.trim().to_string();
            }
            None => start_date = date.trim().to_string(),
        }
    }

    let entry = DateEntry {
        id: EntryId::new(),
        date_type: trimmed(record, &["dateType", "date_type", "type"]),
        start_date,
        end_date,
    };
    entry.is_filled().then_some(entry)
}

fn map_description(raw: &Value) -> Option<DescriptionEntry> {
    let obj = raw.as_object()?;
    let record = Some(obj);
    let description = trimmed(record, &["description", "value"]);
    (!description.is_empty()).then(|| DescriptionEntry {
        id: EntryId::new(),
        description_type: trimmed(record, &["descriptionType", "description_type", "type"]),
        description,
    })
}

/// Maps a stored resource record into form state.
///
/// Empty repeatable entries are left out so that list order stays append-only; titles,
/// licenses and dates then get a single blank entry when nothing usable was stored.
pub fn map_initial_resource(raw: &Value, limits: FormLimits) -> ResourceForm {
    let record = raw.as_object();

    let mut form = ResourceForm {
        resource_id: number_field(record, &["resourceId", "resource_id", "id"])
            .and_then(|n| u64::try_from(n).ok()),
        year: number_field(record, &["year", "publicationYear"]).and_then(|n| i32::try_from(n).ok()),
        resource_type: number_field(record, &["resourceType", "resourceTypeId", "resource_type_id"])
            .and_then(|n| u64::try_from(n).ok()),
        titles: array_field(record, &["titles"]).iter().filter_map(map_title).collect(),
        licenses: array_field(record, &["licenses", "rights"])
            .iter()
            .filter_map(map_license)
            .collect(),
        dates: array_field(record, &["dates"]).iter().filter_map(map_date).collect(),
        descriptions: array_field(record, &["descriptions"])
            .iter()
            .filter_map(map_description)
            .collect(),
        authors: array_field(record, &["authors", "creators"])
            .iter()
            .filter_map(map_initial_author_to_entry)
            .collect(),
        contributors: array_field(record, &["contributors"])
            .iter()
            .filter_map(map_initial_contributor_to_entry)
            .collect(),
        limits,
    };

    if form.titles.is_empty() {
        form.titles.push(TitleEntry::default());
    }
    if form.licenses.is_empty() {
        form.licenses.push(LicenseEntry::default());
    }
    if form.dates.is_empty() {
        form.dates.push(DateEntry::default());
    }

    debug!(
        "Mapped resource {:?}: {} authors, {} contributors",
        form.resource_id,
        form.authors.len(),
        form.contributors.len()
    );
    form
}
