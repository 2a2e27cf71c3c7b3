//! In-memory form state for one resource and the rules that gate its repeatable lists.

use clap::Args;
use serde::{Deserialize, Serialize};

use crate::entry::{
    create_empty_institution_author, create_empty_institution_contributor,
    create_empty_person_author, create_empty_person_contributor, AuthorEntry, ContributorEntry,
    EntryType, InstitutionAuthor, PersonAuthor,
};
use crate::serialize::{serialize_form, SavePayload};
use crate::EntryId;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleEntry {
    pub id: EntryId,
    pub title: String,
    pub title_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LicenseEntry {
    pub id: EntryId,
    pub license: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateEntry {
    pub id: EntryId,
    pub date_type: String,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionEntry {
    pub id: EntryId,
    pub description_type: String,
    pub description: String,
}

/// Whether an entry is filled enough for another one to be appended after it.
pub trait Fillable {
    fn is_filled(&self) -> bool;
}

impl Fillable for TitleEntry {
    fn is_filled(&self) -> bool {
        !self.title.trim().is_empty()
    }
}

impl Fillable for LicenseEntry {
    fn is_filled(&self) -> bool {
        !self.license.trim().is_empty()
    }
}

impl Fillable for DateEntry {
    fn is_filled(&self) -> bool {
        !self.start_date.trim().is_empty() || !self.end_date.trim().is_empty()
    }
}

/// Only the last entry is inspected; lists are append-only so earlier entries were
/// checked when their successor was added.
pub fn can_add<T: Fillable>(entries: &[T], max: usize) -> bool {
    match entries.last() {
        Some(last) if entries.len() < max => last.is_filled(),
        _ => false,
    }
}

pub fn can_add_title(entries: &[TitleEntry], max: usize) -> bool {
    can_add(entries, max)
}

pub fn can_add_license(entries: &[LicenseEntry], max: usize) -> bool {
    can_add(entries, max)
}

pub fn can_add_date(entries: &[DateEntry], max: usize) -> bool {
    can_add(entries, max)
}

/// Upper bounds for the repeatable lists.
#[derive(Args, Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormLimits {
    /// Maximum number of titles
    #[arg(long, default_value = "3")]
    pub max_titles: usize,

    /// Maximum number of licenses
    #[arg(long, default_value = "5")]
    pub max_licenses: usize,

    /// Maximum number of dates
    #[arg(long, default_value = "10")]
    pub max_dates: usize,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_titles: 3,
            max_licenses: 5,
            max_dates: 10,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResourceForm {
    pub resource_id: Option<u64>,
    pub year: Option<i32>,
    pub resource_type: Option<u64>,
    pub titles: Vec<TitleEntry>,
    pub licenses: Vec<LicenseEntry>,
    pub dates: Vec<DateEntry>,
    pub descriptions: Vec<DescriptionEntry>,
    pub authors: Vec<AuthorEntry>,
    pub contributors: Vec<ContributorEntry>,
    pub limits: FormLimits,
}

fn remove_by_id<T>(entries: &mut Vec<T>, id: EntryId, entry_id: impl Fn(&T) -> EntryId) -> bool {
    let before = entries.len();
    entries.retain(|e| entry_id(e) != id);
    entries.len() != before
}

impl ResourceForm {
    /// A form with one blank title, license and date, ready for editing.
    pub fn new(limits: FormLimits) -> Self {
        Self {
            titles: vec![TitleEntry::default()],
            licenses: vec![LicenseEntry::default()],
            dates: vec![DateEntry::default()],
            limits,
            ..Self::default()
        }
    }

    pub fn add_title(&mut self) -> bool {
        let allowed = can_add_title(&self.titles, self.limits.max_titles);
        if allowed {
            self.titles.push(TitleEntry::default());
        }
        allowed
    }

    pub fn add_license(&mut self) -> bool {
        let allowed = can_add_license(&self.licenses, self.limits.max_licenses);
        if allowed {
            self.licenses.push(LicenseEntry::default());
        }
        allowed
    }

    pub fn add_date(&mut self) -> bool {
        let allowed = can_add_date(&self.dates, self.limits.max_dates);
        if allowed {
            self.dates.push(DateEntry::default());
        }
        allowed
    }

    pub fn add_description(&mut self) -> EntryId {
        let entry = DescriptionEntry::default();
        let id = entry.id;
        self.descriptions.push(entry);
        id
    }

    pub fn add_author(&mut self, entry_type: EntryType) -> EntryId {
        let entry = match entry_type {
            EntryType::Person => create_empty_person_author(),
            EntryType::Institution => create_empty_institution_author(),
        };
        let id = entry.id();
        self.authors.push(entry);
        id
    }

    pub fn add_contributor(&mut self, entry_type: EntryType) -> EntryId {
        let entry = match entry_type {
            EntryType::Person => create_empty_person_contributor(),
            EntryType::Institution => create_empty_institution_contributor(),
        };
        let id = entry.id();
        self.contributors.push(entry);
        id
    }

    /// Switches an author between person and institution, keeping its identity and
    /// affiliations. Returns false if no author has this id.
    pub fn switch_author_type(&mut self, id: EntryId, entry_type: EntryType) -> bool {
        let Some(slot) = self.authors.iter_mut().find(|a| a.id() == id) else {
            return false;
        };
        if slot.entry_type() == entry_type {
            return true;
        }
        let affiliations = slot.affiliations().to_vec();
        *slot = match entry_type {
            EntryType::Person => AuthorEntry::Person(PersonAuthor {
                id,
                affiliations,
                ..PersonAuthor::default()
            }),
            EntryType::Institution => AuthorEntry::Institution(InstitutionAuthor {
                id,
                affiliations,
                ..InstitutionAuthor::default()
            }),
        };
        true
    }

    pub fn remove_title(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.titles, id, |e| e.id)
    }

    pub fn remove_license(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.licenses, id, |e| e.id)
    }

    pub fn remove_date(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.dates, id, |e| e.id)
    }

    pub fn remove_description(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.descriptions, id, |e| e.id)
    }

    pub fn remove_author(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.authors, id, AuthorEntry::id)
    }

    pub fn remove_contributor(&mut self, id: EntryId) -> bool {
        remove_by_id(&mut self.contributors, id, ContributorEntry::id)
    }

    pub fn replace_authors(&mut self, authors: Vec<AuthorEntry>) {
        self.authors = authors;
    }

    pub fn replace_contributors(&mut self, contributors: Vec<ContributorEntry>) {
        self.contributors = contributors;
    }

    pub fn author_mut(&mut self, id: EntryId) -> Option<&mut AuthorEntry> {
        self.authors.iter_mut().find(|a| a.id() == id)
    }

    pub fn contributor_mut(&mut self, id: EntryId) -> Option<&mut ContributorEntry> {
        self.contributors.iter_mut().find(|c| c.id() == id)
    }

    /// Every contact person must have an email address before the record may be saved.
    pub fn is_submit_ready(&self) -> bool {
        self.authors
            .iter()
            .all(AuthorEntry::has_contact_email_if_required)
    }

    pub fn to_payload(&self) -> SavePayload {
        serialize_form(self)
    }
}
