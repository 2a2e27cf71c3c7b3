//! Save payload produced from form state.
//!
//! Positions are list indices at the time of serialization; nothing is persisted between
//! calls, so removing an entry renumbers everything after it.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::entry::{AuthorEntry, ContributorEntry};
use crate::form::{DateEntry, DescriptionEntry, LicenseEntry, ResourceForm, TitleEntry};
use crate::normalize::{normalize_title_type_slug, serialize_affiliations};
use crate::{AffiliationTag, RoleTag};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<u64>,
    pub year: Option<i32>,
    pub resource_type: Option<u64>,
    pub licenses: Vec<String>,
    pub titles: Vec<TitlePayload>,
    pub descriptions: Vec<DescriptionPayload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dates: Vec<DatePayload>,
    pub authors: Vec<AuthorPayload>,
    pub contributors: Vec<ContributorPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitlePayload {
    pub title: String,
    pub title_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionPayload {
    pub description_type: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatePayload {
    pub date_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonAuthorPayload {
    pub orcid: Option<String>,
    pub first_name: Option<String>,
    pub last_name: String,
    pub email: Option<String>,
    pub website: Option<String>,
    pub is_contact: bool,
    pub affiliations: Vec<AffiliationTag>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionAuthorPayload {
    pub institution_name: String,
    pub ror_id: Option<String>,
    pub affiliations: Vec<AffiliationTag>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonContributorPayload {
    pub orcid: Option<String>,
    pub first_name: Option<String>,
    pub last_name: String,
    pub roles: Vec<String>,
    pub affiliations: Vec<AffiliationTag>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionContributorPayload {
    pub institution_name: String,
    pub ror_id: Option<String>,
    pub roles: Vec<String>,
    pub affiliations: Vec<AffiliationTag>,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthorPayload {
    Person(PersonAuthorPayload),
    Institution(InstitutionAuthorPayload),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContributorPayload {
    Person(PersonContributorPayload),
    Institution(InstitutionContributorPayload),
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// An institution's own identifier is the ROR id of its first affiliation.
fn institution_ror_id(affiliations: &[AffiliationTag]) -> Option<String> {
    affiliations.first().and_then(|a| a.ror_id.clone())
}

fn role_labels(roles: &[RoleTag]) -> Vec<String> {
    let mut seen = HashSet::new();
    roles
        .iter()
        .filter_map(|r| non_empty(&r.value))
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

/// Entries with an empty last name or institution name are still emitted.
pub fn serialize_authors(authors: &[AuthorEntry]) -> Vec<AuthorPayload> {
    authors
        .iter()
        .enumerate()
        .map(|(position, author)| match author {
            AuthorEntry::Person(p) => AuthorPayload::Person(PersonAuthorPayload {
                orcid: non_empty(&p.orcid),
                first_name: non_empty(&p.first_name),
                last_name: p.last_name.trim().to_string(),
                email: non_empty(&p.email),
                website: non_empty(&p.website),
                is_contact: p.is_contact,
                affiliations: serialize_affiliations(&p.affiliations),
                position,
            }),
            AuthorEntry::Institution(i) => {
                let affiliations = serialize_affiliations(&i.affiliations);
                AuthorPayload::Institution(InstitutionAuthorPayload {
                    institution_name: i.institution_name.trim().to_string(),
                    ror_id: institution_ror_id(&affiliations),
                    affiliations,
                    position,
                })
            }
        })
        .collect()
}

pub fn serialize_contributors(contributors: &[ContributorEntry]) -> Vec<ContributorPayload> {
    contributors
        .iter()
        .enumerate()
        .map(|(position, contributor)| match contributor {
            ContributorEntry::Person(p) => ContributorPayload::Person(PersonContributorPayload {
                orcid: non_empty(&p.orcid),
                first_name: non_empty(&p.first_name),
                last_name: p.last_name.trim().to_string(),
                roles: role_labels(&p.roles),
                affiliations: serialize_affiliations(&p.affiliations),
                position,
            }),
            ContributorEntry::Institution(i) => {
                let affiliations = serialize_affiliations(&i.affiliations);
                ContributorPayload::Institution(InstitutionContributorPayload {
                    institution_name: i.institution_name.trim().to_string(),
                    ror_id: institution_ror_id(&affiliations),
                    roles: role_labels(&i.roles),
                    affiliations,
                    position,
                })
            }
        })
        .collect()
}

pub fn serialize_titles(titles: &[TitleEntry]) -> Vec<TitlePayload> {
    titles
        .iter()
        .filter_map(|t| {
            Some(TitlePayload {
                title: non_empty(&t.title)?,
                title_type: normalize_title_type_slug(&t.title_type),
            })
        })
        .collect()
}

pub fn serialize_licenses(licenses: &[LicenseEntry]) -> Vec<String> {
    let mut seen = HashSet::new();
    licenses
        .iter()
        .filter_map(|l| non_empty(&l.license))
        .filter(|license| seen.insert(license.clone()))
        .collect()
}

pub fn serialize_descriptions(descriptions: &[DescriptionEntry]) -> Vec<DescriptionPayload> {
    descriptions
        .iter()
        .filter_map(|d| {
            Some(DescriptionPayload {
                description: non_empty(&d.description)?,
                description_type: d.description_type.trim().to_string(),
            })
        })
        .collect()
}

pub fn serialize_dates(dates: &[DateEntry]) -> Vec<DatePayload> {
    dates
        .iter()
        .filter_map(|d| {
            let start_date = non_empty(&d.start_date);
            let end_date = non_empty(&d.end_date);
            if start_date.is_none() && end_date.is_none() {
                return None;
            }
            Some(DatePayload {
                date_type: d.date_type.trim().to_string(),
                start_date,
                end_date,
            })
        })
        .collect()
}

pub fn serialize_form(form: &ResourceForm) -> SavePayload {
    SavePayload {
        resource_id: form.resource_id,
        year: form.year,
        resource_type: form.resource_type,
        licenses: serialize_licenses(&form.licenses),
        titles: serialize_titles(&form.titles),
        descriptions: serialize_descriptions(&form.descriptions),
        dates: serialize_dates(&form.dates),
        authors: serialize_authors(&form.authors),
        contributors: serialize_contributors(&form.contributors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{InstitutionAuthor, PersonAuthor};
    use crate::EntryId;

    #[test]
    fn positions_follow_current_order() {
        let mut authors = vec![
            AuthorEntry::Person(PersonAuthor {
                last_name: "A".into(),
                ..PersonAuthor::default()
            }),
            AuthorEntry::Person(PersonAuthor {
                last_name: "B".into(),
                ..PersonAuthor::default()
            }),
            AuthorEntry::Person(PersonAuthor {
                last_name: "C".into(),
                ..PersonAuthor::default()
            }),
        ];
        authors.remove(1);
        let positions: Vec<(String, usize)> = serialize_authors(&authors)
            .into_iter()
            .map(|a| match a {
                AuthorPayload::Person(p) => (p.last_name, p.position),
                AuthorPayload::Institution(_) => unreachable!(),
            })
            .collect();
        assert_eq!(positions, vec![("A".into(), 0), ("C".into(), 1)]);
    }

    #[test]
    fn blank_optional_person_fields_become_null() {
        let payload = serialize_authors(&[AuthorEntry::Person(PersonAuthor::default())]);
        let json = serde_json::to_value(&payload[0]).unwrap();
        assert_eq!(json["type"], "person");
        assert!(json["orcid"].is_null());
        assert!(json["firstName"].is_null());
        assert!(json["email"].is_null());
        assert!(json["website"].is_null());
        assert_eq!(json["lastName"], "");
        assert_eq!(json["position"], 0);
    }

    #[test]
    fn institution_takes_first_affiliation_ror_id() {
        let author = AuthorEntry::Institution(InstitutionAuthor {
            id: EntryId::new(),
            institution_name: " GFZ ".into(),
            affiliations: vec![
                AffiliationTag::new("GFZ", Some("https://ror.org/04z8jg394".into())),
                AffiliationTag::new("Other", Some("https://ror.org/other".into())),
            ],
            affiliations_input: String::new(),
        });
        match &serialize_authors(&[author])[0] {
            AuthorPayload::Institution(i) => {
                assert_eq!(i.institution_name, "GFZ");
                assert_eq!(i.ror_id.as_deref(), Some("https://ror.org/04z8jg394"));
            }
            AuthorPayload::Person(_) => panic!("expected institution"),
        }
    }

    #[test]
    fn empty_list_entries_are_dropped() {
        let titles = vec![
            TitleEntry {
                title: " Main ".into(),
                title_type: "MainTitle".into(),
                ..TitleEntry::default()
            },
            TitleEntry::default(),
        ];
        assert_eq!(
            serialize_titles(&titles),
            vec![TitlePayload {
                title: "Main".into(),
                title_type: "main-title".into()
            }]
        );
        assert!(serialize_descriptions(&[DescriptionEntry::default()]).is_empty());
        assert!(serialize_dates(&[DateEntry::default()]).is_empty());
        assert!(serialize_licenses(&[LicenseEntry::default()]).is_empty());
    }
}
