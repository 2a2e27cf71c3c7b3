//! Canonical author and contributor entries held by the editing form.
//!
//! Both kinds are sum types over a person and an institution variant, tagged by `type`.
//! External records only ever reach this shape through [`mapper`].

use serde::{Deserialize, Serialize};

use crate::{AffiliationTag, EntryId, RoleTag};

pub mod mapper;
pub use mapper::{map_initial_author_to_entry, map_initial_contributor_to_entry, map_initial_resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Person,
    Institution,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonAuthor {
    pub id: EntryId,
    pub orcid: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub website: String,
    pub is_contact: bool,
    pub affiliations: Vec<AffiliationTag>,
    pub affiliations_input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionAuthor {
    pub id: EntryId,
    pub institution_name: String,
    pub affiliations: Vec<AffiliationTag>,
    pub affiliations_input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonContributor {
    pub id: EntryId,
    pub orcid: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<RoleTag>,
    pub affiliations: Vec<AffiliationTag>,
    pub affiliations_input: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstitutionContributor {
    pub id: EntryId,
    pub institution_name: String,
    pub roles: Vec<RoleTag>,
    pub affiliations: Vec<AffiliationTag>,
    pub affiliations_input: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum AuthorEntry {
    Person(PersonAuthor),
    Institution(InstitutionAuthor),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContributorEntry {
    Person(PersonContributor),
    Institution(InstitutionContributor),
}

impl AuthorEntry {
    pub fn id(&self) -> EntryId {
        match self {
            AuthorEntry::Person(p) => p.id,
            AuthorEntry::Institution(i) => i.id,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            AuthorEntry::Person(_) => EntryType::Person,
            AuthorEntry::Institution(_) => EntryType::Institution,
        }
    }

    pub fn affiliations(&self) -> &[AffiliationTag] {
        match self {
            AuthorEntry::Person(p) => &p.affiliations,
            AuthorEntry::Institution(i) => &i.affiliations,
        }
    }

    /// A contact person without an email address blocks saving.
    pub fn has_contact_email_if_required(&self) -> bool {
        match self {
            AuthorEntry::Person(p) => !p.is_contact || !p.email.trim().is_empty(),
            AuthorEntry::Institution(_) => true,
        }
    }
}

impl ContributorEntry {
    pub fn id(&self) -> EntryId {
        match self {
            ContributorEntry::Person(p) => p.id,
            ContributorEntry::Institution(i) => i.id,
        }
    }

    pub fn entry_type(&self) -> EntryType {
        match self {
            ContributorEntry::Person(_) => EntryType::Person,
            ContributorEntry::Institution(_) => EntryType::Institution,
        }
    }

    pub fn roles(&self) -> &[RoleTag] {
        match self {
            ContributorEntry::Person(p) => &p.roles,
            ContributorEntry::Institution(i) => &i.roles,
        }
    }

    pub fn affiliations(&self) -> &[AffiliationTag] {
        match self {
            ContributorEntry::Person(p) => &p.affiliations,
            ContributorEntry::Institution(i) => &i.affiliations,
        }
    }
}

pub fn create_empty_person_author() -> AuthorEntry {
    AuthorEntry::Person(PersonAuthor::default())
}

pub fn create_empty_institution_author() -> AuthorEntry {
    AuthorEntry::Institution(InstitutionAuthor::default())
}

pub fn create_empty_person_contributor() -> ContributorEntry {
    ContributorEntry::Person(PersonContributor::default())
}

pub fn create_empty_institution_contributor() -> ContributorEntry {
    ContributorEntry::Institution(InstitutionContributor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factories_issue_distinct_ids_with_equal_fields() {
        let (a, b) = match (create_empty_person_author(), create_empty_person_author()) {
            (AuthorEntry::Person(a), AuthorEntry::Person(b)) => (a, b),
            _ => unreachable!(),
        };
        assert_ne!(a.id, b.id);
        assert_eq!(PersonAuthor { id: b.id, ..a }, b);
    }

    #[test]
    fn contributor_factories_start_without_roles() {
        let person = create_empty_person_contributor();
        let institution = create_empty_institution_contributor();
        assert_ne!(person.id(), institution.id());
        assert!(person.roles().is_empty());
        assert!(institution.roles().is_empty());
        assert_eq!(institution.entry_type(), EntryType::Institution);
    }

    #[test]
    fn institution_author_is_empty() {
        match create_empty_institution_author() {
            AuthorEntry::Institution(i) => {
                assert!(i.institution_name.is_empty());
                assert!(i.affiliations.is_empty());
            }
            AuthorEntry::Person(_) => panic!("expected institution"),
        }
    }

    #[test]
    fn contact_person_needs_email() {
        let mut author = PersonAuthor {
            is_contact: true,
            ..PersonAuthor::default()
        };
        assert!(!AuthorEntry::Person(author.clone()).has_contact_email_if_required());
        author.email = "jo@example.org".into();
        assert!(AuthorEntry::Person(author).has_contact_email_if_required());
    }
}
